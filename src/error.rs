//! Error types for the converter.
//!
//! Every variant carries the path or the offending value so a failed run can
//! be diagnosed from the single line written to stderr.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for converter operations
pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input table could not be opened or read
    #[error("failed to read table {}: {source}", path.display())]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The input table is not valid delimited text
    #[error("failed to parse table {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    /// The input table has no header row
    #[error("table {} has no header row", path.display())]
    MissingHeader { path: PathBuf },

    /// Client index is not an integer or is outside `[0, count)`
    #[error("invalid client index '{value}': expected an integer in [0, {count})")]
    InvalidIndex { value: String, count: usize },

    /// A batch operation needs at least one data record
    #[error("table {} has no data records", path.display())]
    EmptyDataset { path: PathBuf },

    /// A destination file or directory could not be written
    #[error("failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The zip archive could not be assembled
    #[error("failed to build archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("failed to serialize payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    pub(crate) fn input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Input {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}
