#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("{path} already holds data; refusing to overwrite")]
    ExistingData { path: PathBuf },
    #[error("recorder is closed")]
    Closed,
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
