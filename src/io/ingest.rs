//! CSV ingest for count files.
//!
//! Every source file has a header row and at least two columns:
//!
//! - `Culture Number`: the sample key (integer)
//! - `Count`: the measured count (number)
//!
//! Extra columns are ignored. Header matching is case-insensitive and tolerant
//! of a UTF-8 BOM. Unlike a general-purpose loader, a bad row is fatal: the
//! aggregator relies on row order, so silently skipping a row would shift
//! every later sample.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::CountRow;
use crate::error::PipelineError;

pub const SAMPLE_COLUMN: &str = "culture number";
pub const COUNT_COLUMN: &str = "count";

/// Load every data row of a count file.
pub fn load_count_rows(path: &Path) -> Result<Vec<CountRow>, PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_count_rows(file, path)?;
    log::debug!("read {} rows from '{}'", rows.len(), path.display());
    Ok(rows)
}

/// Parse count rows from any reader; `path` is only used in errors.
pub fn read_count_rows<R: Read>(input: R, path: &Path) -> Result<Vec<CountRow>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| classify_csv_error(e, path, 1))?
        .clone();
    let header_map = build_header_map(&headers);

    let sample_idx = column_index(&header_map, SAMPLE_COLUMN, path)?;
    let count_idx = column_index(&header_map, COUNT_COLUMN, path)?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| classify_csv_error(e, path, line))?;

        if record.iter().all(str::is_empty) {
            continue;
        }

        let malformed = |message: String| PipelineError::MalformedRow {
            path: path.to_path_buf(),
            line,
            message,
        };
        let sample = parse_sample_key(get_field(&record, sample_idx, "Culture Number").map_err(malformed)?)
            .map_err(malformed)?;
        let count = parse_count(get_field(&record, count_idx, "Count").map_err(malformed)?)
            .map_err(malformed)?;

        rows.push(CountRow::new(sample, count));
    }

    Ok(rows)
}

fn classify_csv_error(err: csv::Error, path: &Path, line: usize) -> PipelineError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(line);
    let message = format!("CSV parse error: {err}");
    match err.into_kind() {
        csv::ErrorKind::Io(source) => PipelineError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        },
        _ => PipelineError::MalformedRow {
            path: path.to_path_buf(),
            line,
            message,
        },
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

fn column_index(header_map: &HashMap<String, usize>, name: &str, path: &Path) -> Result<usize, PipelineError> {
    header_map
        .get(name)
        .copied()
        .ok_or_else(|| PipelineError::MalformedRow {
            path: path.to_path_buf(),
            line: 1,
            message: format!("missing required column `{name}`"),
        })
}

fn get_field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing `{name}` value"))
}

fn parse_sample_key(s: &str) -> Result<i64, String> {
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    // Numeric exports sometimes write integral keys as `3.0`.
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        _ => Err(format!("invalid `Culture Number` '{s}' (expected an integer)")),
    }
}

fn parse_count(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("invalid `Count` '{s}' (expected a number)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<CountRow>, PipelineError> {
        read_count_rows(text.as_bytes(), Path::new("fixture.csv"))
    }

    #[test]
    fn reads_rows_and_ignores_extra_columns() {
        let rows = parse("Culture Number,Replicate,Count\n1,a,12\n1,b,14.5\n2,a,20\n").unwrap();
        assert_eq!(
            rows,
            vec![
                CountRow::new(1, 12.0),
                CountRow::new(1, 14.5),
                CountRow::new(2, 20.0),
            ]
        );
    }

    #[test]
    fn headers_are_trimmed_and_case_insensitive() {
        let rows = parse("\u{feff} culture  NUMBER , count \n 3 , 7 \n").unwrap();
        assert_eq!(rows, vec![CountRow::new(3, 7.0)]);
    }

    #[test]
    fn integral_float_keys_are_accepted() {
        let rows = parse("Culture Number,Count\n2.0,5\n").unwrap();
        assert_eq!(rows[0].sample.0, 2);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let rows = parse("Culture Number,Count\n1,5\n,\n2,6\n").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn missing_column_is_malformed() {
        let err = parse("Culture Number,Total\n1,5\n").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn non_numeric_count_reports_its_line() {
        let err = parse("Culture Number,Count\n1,5\n1,abc\n").unwrap_err();
        match err {
            PipelineError::MalformedRow { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("abc"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fractional_key_is_malformed() {
        assert!(parse("Culture Number,Count\n1.5,5\n").is_err());
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = load_count_rows(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    }
}
