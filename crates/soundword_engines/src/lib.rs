#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod label_assign;
pub mod plan;
pub mod random_source;
pub mod response_device;
pub mod seed_assign;
pub mod trial_gen;

pub use error::{DesignError, DeviceError};
