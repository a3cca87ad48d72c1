#![forbid(unsafe_code)]

use soundword_kernel_contracts::session::SessionConfig;
use soundword_kernel_contracts::Validate;

use crate::ExecutionError;

/// Parses and validates a JSON session configuration document.
pub fn parse_session_config(text: &str) -> Result<SessionConfig, ExecutionError> {
    let cfg: SessionConfig =
        serde_json::from_str(text).map_err(|e| ExecutionError::Config(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}
