#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use soundword_engines::plan::TrialPlan;
use soundword_storage::record::{header_line, TrialRecordRow};

/// The plan in the per-trial column layout, session and response cells left empty.
pub fn render_plan(plan: &TrialPlan) -> String {
    let mut out = header_line();
    for trial in plan.trials() {
        out.push_str(&TrialRecordRow::planned(None, trial).to_csv_line());
    }
    out
}

pub fn write_plan(plan: &TrialPlan, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
    }
    fs::write(path, render_plan(plan))
        .map_err(|e| format!("failed to write {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundword_engines::catalog::parse_catalog_csv;
    use soundword_engines::trial_gen::{DesignParams, TrialDesigner};

    fn plan() -> TrialPlan {
        let mut csv = String::from("seed_id,category,word,word_type\n");
        for c in ["glass", "wood"] {
            for s in 1..=4 {
                csv.push_str(&format!("{c}-{s},{c},{c}-word,sound\n"));
            }
        }
        let catalog = parse_catalog_csv(&csv).unwrap();
        TrialDesigner::new(catalog, None, DesignParams::mvp_v1())
            .unwrap()
            .build(7)
            .unwrap()
    }

    #[test]
    fn at_export_01_one_row_per_trial_with_empty_session_and_response() {
        let plan = plan();
        let text = render_plan(&plan);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("subj_id,date,"));
        assert_eq!(lines.len(), plan.len() + 1);
        for row in &lines[1..] {
            let cells: Vec<&str> = row.split(',').collect();
            assert_eq!(cells.len(), 15);
            assert!(cells[..4].iter().all(|c| c.is_empty()));
            assert!(cells[12..].iter().all(|c| c.is_empty()));
        }
    }

    #[test]
    fn at_export_02_write_plan_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("sample_trials.csv");
        let plan = plan();
        write_plan(&plan, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), render_plan(&plan));
    }
}
