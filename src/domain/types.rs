//! Shared domain types.
//!
//! These types are intentionally small and `Copy` where possible so they can be:
//!
//! - passed freely between the aggregation, pairing and fitting stages
//! - serialized into configuration files (policy enums)
//! - compared directly in tests

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Identifier of a biological sample ("culture number").
///
/// Rows sharing a key are replicate measurements of the same sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleKey(pub i64);

impl SampleKey {
    /// The key that follows this one in a well-formed, contiguous file.
    pub fn next(self) -> Self {
        SampleKey(self.0.saturating_add(1))
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One typed observation from a source file.
///
/// Both file shapes (raw replicates and pre-aggregated samples) carry exactly
/// these two fields; which shape a file has is decided by [`StorageKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountRow {
    pub sample: SampleKey,
    pub count: f64,
}

impl CountRow {
    pub fn new(sample: i64, count: f64) -> Self {
        Self {
            sample: SampleKey(sample),
            count,
        }
    }
}

/// Mean count of all replicates sharing a sample key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedSample {
    pub sample: SampleKey,
    pub value: f64,
}

impl AggregatedSample {
    pub fn new(sample: i64, value: f64) -> Self {
        Self {
            sample: SampleKey(sample),
            value,
        }
    }
}

impl From<CountRow> for AggregatedSample {
    fn from(row: CountRow) -> Self {
        Self {
            sample: row.sample,
            value: row.count,
        }
    }
}

/// One scatter point: technique A on `x`, technique B on `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinatePair {
    pub x: f64,
    pub y: f64,
}

/// How a technique's source file stores its counts.
///
/// This is a fixed per-technique policy, never inferred from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StorageKind {
    /// Several rows per sample; averaged before pairing.
    Replicates,
    /// One row per sample; used as-is.
    PerSample,
}

/// Replicate aggregation behaviour at group boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Like `Reference`, but the last row also triggers a flush. The final
    /// group is emitted with every replicate except the last row.
    #[default]
    Partial,
    /// Start at the configured first key, advance keys by one on every
    /// boundary and never flush the trailing group.
    Reference,
    /// Follow the keys actually present and flush the trailing group.
    Complete,
}

/// A measurement technique and its storage policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub name: String,
    pub storage: StorageKind,
}

impl Technique {
    pub fn new(name: impl Into<String>, storage: StorageKind) -> Self {
        Self {
            name: name.into(),
            storage,
        }
    }

    /// Axis title used for this technique's counts.
    pub fn axis_label(&self) -> String {
        format!("{} Count", self.name)
    }
}
