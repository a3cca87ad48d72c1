#![forbid(unsafe_code)]

pub mod console;
pub mod logging;
pub mod sound_files;
pub mod trial_export;
pub mod wav;
