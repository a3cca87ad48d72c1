#![forbid(unsafe_code)]

use soundword_engines::{DesignError, DeviceError};
use soundword_kernel_contracts::ContractViolation;
use soundword_storage::RecorderError;
use thiserror::Error;

/// Anything that ends a session early. Nothing here is retried.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("presenter failed: {0}")]
    Presenter(String),
    #[error("audio playback failed: {0}")]
    Audio(String),
    #[error("invalid session config: {0}")]
    Config(String),
    #[error("response device: {0}")]
    Device(#[from] DeviceError),
    #[error("recorder: {0}")]
    Recorder(#[from] RecorderError),
    #[error("trial design: {0}")]
    Design(#[from] DesignError),
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),
}
