#![forbid(unsafe_code)]

pub mod catalog;
pub mod common;
pub mod device;
pub mod session;
pub mod trial;

pub use common::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};
