#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use soundword_engines::catalog::StimulusCatalog;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied: Vec<String>,
    pub already_present: Vec<String>,
    /// Clips the catalog names that the source directory does not have.
    pub missing: Vec<String>,
}

/// Copies `{seed_id}.wav` for every distinct catalog seed from `source` into `dest`.
///
/// Files already in `dest` are left alone. `dest` is created if needed.
pub fn copy_sounds(
    catalog: &StimulusCatalog,
    source: &Path,
    dest: &Path,
) -> Result<CopyReport, String> {
    fs::create_dir_all(dest).map_err(|e| format!("failed to create {}: {e}", dest.display()))?;
    let mut report = CopyReport::default();
    for seed in catalog.distinct_seeds() {
        let name = seed.clip_name();
        let to = dest.join(&name);
        if to.exists() {
            report.already_present.push(name);
            continue;
        }
        let from = source.join(&name);
        if !from.is_file() {
            warn!(clip = name.as_str(), source = %source.display(), "sound missing from source");
            report.missing.push(name);
            continue;
        }
        fs::copy(&from, &to).map_err(|e| format!("failed to copy {}: {e}", from.display()))?;
        report.copied.push(name);
    }
    info!(
        copied = report.copied.len(),
        already_present = report.already_present.len(),
        missing = report.missing.len(),
        "copy-sounds done"
    );
    Ok(report)
}
