//! Error taxonomy for the optimizer.

use std::path::PathBuf;

/// Possible errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dataset file is missing or cannot be opened
    #[error("Cannot open dataset {}: {source}", path.display())]
    DatasetNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset header or body cannot be parsed
    #[error("Malformed dataset at line {line}: {reason}")]
    DatasetFormat { line: usize, reason: String },

    /// A solver parameter is out of range
    #[error("Invalid parameter `{parameter}`: {reason}")]
    Validation {
        parameter: &'static str,
        reason: String,
    },

    /// A route stopped being a permutation of the point indices.
    ///
    /// This is always a defect in a solver or operator and aborts the solve.
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// The solution file cannot be parsed
    #[error("Malformed solution file at line {line}: {reason}")]
    SolutionFormat { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Settings(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn validation(parameter: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            parameter,
            reason: reason.into(),
        }
    }

    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        Error::DatasetFormat {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
