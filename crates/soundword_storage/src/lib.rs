#![forbid(unsafe_code)]

pub mod csv_file;
pub mod error;
pub mod memory;
pub mod record;
pub mod repo;

pub use error::RecorderError;
pub use repo::{RecorderDisposition, SessionRecorder};
