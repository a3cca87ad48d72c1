#![forbid(unsafe_code)]

pub mod collaborators;
pub mod config;
pub mod error;
pub mod experiment;
pub mod session;
pub mod trial_executor;

pub use error::ExecutionError;
