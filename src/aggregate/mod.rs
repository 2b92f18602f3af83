//! Replicate aggregation.
//!
//! Raw replicate files hold several rows per sample, grouped contiguously by
//! culture number. Aggregation reduces each group to its mean count in a
//! single forward pass.
//!
//! The pass is an explicit state machine. For every row the accumulator first
//! *checks* whether the row starts a new group (flushing the open one), then
//! *folds* the row's count into the open group. The order matters: the row
//! that triggers a boundary is never part of the group it flushes.
//!
//! In [`AggregationMode::Reference`] mode:
//! - the expected key starts at the configured first key and advances by one
//!   on every boundary, regardless of the key that triggered it
//! - the group still open when input ends is discarded
//!
//! [`AggregationMode::Partial`] keys groups the same way, but the last row is
//! also a boundary. The final group is flushed *before* that row is folded,
//! so its mean leaves the last replicate out: `[1,1,2,2,3,3]` with counts
//! `[2,4,6,8,10,12]` gives `[{1,3},{2,7},{3,10}]`. A final group of one row
//! is still lost.
//!
//! Keys that skip values or interleave are accepted silently and simply split
//! groups differently; an empty flush yields `NaN`.
//! [`AggregationMode::Complete`] follows the keys actually present and flushes
//! the trailing group.

use crate::domain::{AggregatedSample, AggregationMode, CountRow, SampleKey};

/// Running state of one aggregation pass.
#[derive(Debug, Clone)]
pub struct ReplicateAccumulator {
    mode: AggregationMode,
    current_key: Option<SampleKey>,
    running_sum: f64,
    replicates: usize,
}

impl ReplicateAccumulator {
    pub fn new(mode: AggregationMode, first_key: SampleKey) -> Self {
        let current_key = match mode {
            AggregationMode::Reference => Some(first_key),
            // Adopt whatever key the first row carries.
            AggregationMode::Complete => None,
        };
        Self {
            mode,
            current_key,
            running_sum: 0.0,
            replicates: 0,
        }
    }

    /// Key of the group currently being accumulated.
    pub fn current_key(&self) -> Option<SampleKey> {
        self.current_key
    }

    /// Number of replicates folded into the open group.
    pub fn replicates(&self) -> usize {
        self.replicates
    }

    /// Feed one row: check the boundary, then fold the count.
    ///
    /// Returns the group flushed by this row, if any.
    pub fn observe(&mut self, row: &CountRow) -> Option<AggregatedSample> {
        let flushed = self.check_boundary(row.sample, false);
        self.fold(row.count);
        flushed
    }

    /// Feed the last row of the input.
    ///
    /// In `Partial` mode this row flushes the open group even when its key
    /// matches; other modes treat it like any other row.
    pub fn observe_last(&mut self, row: &CountRow) -> Option<AggregatedSample> {
        let last = self.mode == AggregationMode::Partial;
        let flushed = self.check_boundary(row.sample, last);
        self.fold(row.count);
        flushed
    }

    /// End of input.
    pub fn finish(mut self) -> Option<AggregatedSample> {
        match self.mode {
            AggregationMode::Reference | AggregationMode::Partial => None,
            AggregationMode::Complete => {
                let key = self.current_key?;
                (self.replicates > 0).then(|| self.flush(key))
            }
        }
    }

    fn check_boundary(&mut self, key: SampleKey, last: bool) -> Option<AggregatedSample> {
        let Some(current) = self.current_key else {
            self.current_key = Some(key);
            return None;
        };
        if key == current && !last {
            return None;
        }

        let flushed = self.flush(current);
        self.current_key = Some(match self.mode {
            AggregationMode::Reference | AggregationMode::Partial => current.next(),
            AggregationMode::Complete => key,
        });
        Some(flushed)
    }

    fn fold(&mut self, count: f64) {
        self.running_sum += count;
        self.replicates += 1;
    }

    fn flush(&mut self, key: SampleKey) -> AggregatedSample {
        // 0 / 0 is NaN on purpose: an empty group is not an error here.
        let value = self.running_sum / self.replicates as f64;
        self.running_sum = 0.0;
        self.replicates = 0;
        AggregatedSample { sample: key, value }
    }
}

/// Average replicate rows into one sample per group.
pub fn aggregate_replicates(
    rows: &[CountRow],
    mode: AggregationMode,
    first_key: SampleKey,
) -> Vec<AggregatedSample> {
    let mut acc = ReplicateAccumulator::new(mode, first_key);
    let mut out = Vec::new();

    if let Some((last, body)) = rows.split_last() {
        for row in body {
            if let Some(sample) = acc.observe(row) {
                out.push(sample);
            }
        }
        if let Some(sample) = acc.observe_last(last) {
            out.push(sample);
        }
    }

    let discarded = acc.replicates();
    let open_key = acc.current_key();
    match acc.finish() {
        Some(sample) => out.push(sample),
        None if discarded > 0 => {
            log::debug!(
                "trailing group {} ({discarded} replicates) not emitted",
                open_key.map(|k| k.to_string()).unwrap_or_default()
            );
        }
        None => {}
    }

    out
}

/// Pre-aggregated files already hold one row per sample.
pub fn per_sample(rows: &[CountRow]) -> Vec<AggregatedSample> {
    rows.iter().copied().map(AggregatedSample::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(keys: &[i64], counts: &[f64]) -> Vec<CountRow> {
        keys.iter()
            .zip(counts)
            .map(|(&k, &c)| CountRow::new(k, c))
            .collect()
    }

    #[test]
    fn reference_mode_drops_the_last_group() {
        let input = rows(&[1, 1, 2, 2, 3, 3], &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
        let out = aggregate_replicates(&input, AggregationMode::Reference, SampleKey(1));
        assert_eq!(
            out,
            vec![AggregatedSample::new(1, 3.0), AggregatedSample::new(2, 7.0)]
        );
    }

    #[test]
    fn partial_mode_flushes_at_the_last_row() {
        let input = rows(&[1, 1, 2, 2, 3, 3], &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
        let out = aggregate_replicates(&input, AggregationMode::Partial, SampleKey(1));
        assert_eq!(
            out,
            vec![
                AggregatedSample::new(1, 3.0),
                AggregatedSample::new(2, 7.0),
                AggregatedSample::new(3, 10.0),
            ]
        );
    }

    #[test]
    fn partial_mode_loses_a_single_row_final_group() {
        // The last row changes key, so it only flushes group 2.
        let input = rows(&[1, 1, 2, 2, 3], &[2.0, 4.0, 6.0, 8.0, 10.0]);
        let out = aggregate_replicates(&input, AggregationMode::Partial, SampleKey(1));
        assert_eq!(
            out,
            vec![AggregatedSample::new(1, 3.0), AggregatedSample::new(2, 7.0)]
        );
    }

    #[test]
    fn last_row_only_forces_a_flush_in_partial_mode() {
        for (mode, expected) in [
            (AggregationMode::Partial, Some(AggregatedSample::new(1, 5.0))),
            (AggregationMode::Reference, None),
            (AggregationMode::Complete, None),
        ] {
            let mut acc = ReplicateAccumulator::new(mode, SampleKey(1));
            assert_eq!(acc.observe(&CountRow::new(1, 5.0)), None);
            assert_eq!(acc.observe_last(&CountRow::new(1, 7.0)), expected, "{mode:?}");
        }
    }

    #[test]
    fn complete_mode_emits_every_group() {
        let input = rows(&[1, 1, 2, 2, 3, 3], &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
        let out = aggregate_replicates(&input, AggregationMode::Complete, SampleKey(1));
        assert_eq!(
            out,
            vec![
                AggregatedSample::new(1, 3.0),
                AggregatedSample::new(2, 7.0),
                AggregatedSample::new(3, 11.0),
            ]
        );
    }

    #[test]
    fn non_terminal_group_mean_is_exact() {
        let counts = [13.0, 17.5, 9.25, 40.0, 0.125];
        let mut input = rows(&[1; 5], &counts);
        input.push(CountRow::new(2, 100.0));

        let out = aggregate_replicates(&input, AggregationMode::Reference, SampleKey(1));
        let expected = counts.iter().sum::<f64>() / counts.len() as f64;
        assert_eq!(out.len(), 1);
        assert!((out[0].value - expected).abs() < 1e-9);
    }

    #[test]
    fn boundary_row_is_folded_after_the_flush() {
        let mut acc = ReplicateAccumulator::new(AggregationMode::Reference, SampleKey(1));
        assert_eq!(acc.observe(&CountRow::new(1, 5.0)), None);
        assert_eq!(acc.observe(&CountRow::new(1, 7.0)), None);

        let flushed = acc.observe(&CountRow::new(2, 100.0));
        assert_eq!(flushed, Some(AggregatedSample::new(1, 6.0)));
        assert_eq!(acc.current_key(), Some(SampleKey(2)));
        assert_eq!(acc.replicates(), 1);
        assert_eq!(acc.finish(), None);
    }

    #[test]
    fn reference_mode_advances_by_one_on_skipped_keys() {
        // Key 3 arrives while 2 is expected, so every later row looks like a
        // new group and the key-4 replicates are split apart.
        let input = rows(&[1, 1, 3, 4, 4], &[1.0, 3.0, 10.0, 20.0, 30.0]);
        let out = aggregate_replicates(&input, AggregationMode::Reference, SampleKey(1));
        assert_eq!(
            out,
            vec![
                AggregatedSample::new(1, 2.0),
                AggregatedSample::new(2, 10.0),
                AggregatedSample::new(3, 20.0),
            ]
        );
    }

    #[test]
    fn unexpected_first_key_flushes_nan_without_error() {
        let input = rows(&[0, 0, 1], &[4.0, 6.0, 8.0]);
        let out = aggregate_replicates(&input, AggregationMode::Reference, SampleKey(1));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].sample, SampleKey(1));
        assert!(out[0].value.is_nan());
        assert_eq!(out[1], AggregatedSample::new(2, 4.0));
        assert_eq!(out[2], AggregatedSample::new(3, 6.0));
    }

    #[test]
    fn empty_input_produces_nothing() {
        for mode in [
            AggregationMode::Partial,
            AggregationMode::Reference,
            AggregationMode::Complete,
        ] {
            assert!(aggregate_replicates(&[], mode, SampleKey(1)).is_empty());
        }
    }

    #[test]
    fn per_sample_rows_pass_through_in_order() {
        let input = rows(&[1, 2, 3], &[10.0, 20.0, 30.0]);
        let out = per_sample(&input);
        assert_eq!(out[2], AggregatedSample::new(3, 30.0));
        assert_eq!(out.len(), 3);
    }
}
