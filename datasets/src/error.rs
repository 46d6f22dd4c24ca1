use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while preparing or reading samples.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path} is not valid utf-8")]
    Utf8 { path: PathBuf },
    #[error("failed to parse record on line {line} of {path}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("dataset at {0} did not contain any samples")]
    Empty(PathBuf),
    #[error("sample `{0}` has not been prepared")]
    UnknownSample(String),
    #[error("batch size must be positive for sample `{0}`")]
    ZeroBatchSize(String),
}
