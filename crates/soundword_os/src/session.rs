#![forbid(unsafe_code)]

use std::env;
use std::fs;

use chrono::{DateTime, TimeZone};
use soundword_kernel_contracts::session::{Session, SessionConfig};
use soundword_kernel_contracts::ContractViolation;

pub const SESSION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Best-effort host name for the `computer` column.
pub fn host_identifier() -> String {
    for var in ["HOSTNAME", "COMPUTERNAME"] {
        if let Ok(v) = env::var(var) {
            if !v.trim().is_empty() {
                return v.trim().to_string();
            }
        }
    }
    fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Fixes the identifiers prefixed onto every row of this run.
pub fn open_session<Tz>(
    cfg: &SessionConfig,
    started_at: DateTime<Tz>,
    computer: String,
) -> Result<Session, ContractViolation>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    Session::v1(
        cfg.subj_id.clone(),
        started_at.format(SESSION_DATE_FORMAT).to_string(),
        cfg.experimenter.clone(),
        computer,
        cfg.seed,
    )
}
