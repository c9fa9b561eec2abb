use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration: {0}")]
    Configuration(String),

    #[error("Malformed row {row}: column '{column}' has invalid value '{value}'")]
    MalformedRow {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Duplicate country '{country}' at row {row}")]
    DuplicateCountry { country: String, row: usize },

    #[error("Failed to write {artifact} to {}: {source}", path.display())]
    Artifact {
        artifact: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn artifact(artifact: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Artifact {
            artifact: artifact.to_string(),
            path: path.into(),
            source,
        }
    }
}

#[cfg(feature = "python")]
impl From<AnalysisError> for pyo3::PyErr {
    fn from(err: AnalysisError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
