use std::path::PathBuf;
use thiserror::Error;

/// Failure to build a [`crate::Dataset`] from its tabular source.
///
/// Loading happens once at startup; callers are expected to refuse to start
/// rather than run with a partial table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reading csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: column '{column}' is not numeric: {value:?}")]
    InvalidMetric {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: column '{column}' is negative ({value})")]
    NegativeMetric {
        row: usize,
        column: &'static str,
        value: f64,
    },
}

/// A grouping dimension outside the closed set of four.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dimension '{0}' (expected one of yearLabel, MS2Block, MS3Rotation, MS4Rotation)")]
pub struct InvalidDimensionError(pub String);
