#![forbid(unsafe_code)]

use soundword_kernel_contracts::session::Session;
use soundword_kernel_contracts::trial::{CompletedTrial, Trial};

/// Fixed column order of the per-trial output.
pub const DATA_COLUMNS: [&str; 15] = [
    "subj_id",
    "date",
    "experimenter",
    "computer",
    "block_ix",
    "trial_ix",
    "sound_id",
    "word",
    "sound_category",
    "word_category",
    "word_type",
    "correct_response",
    "response",
    "rt",
    "is_correct",
];

fn bit(v: bool) -> String {
    u8::from(v).to_string()
}

/// One output row. Missing session or response fields render as empty cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRecordRow {
    fields: Vec<String>,
}

impl TrialRecordRow {
    pub fn completed(session: &Session, completed: &CompletedTrial) -> Self {
        let mut row = Self::planned(Some(session), &completed.trial);
        row.fields[12] = completed.response.value().to_string();
        row.fields[13] = completed.reaction_time_ms.0.to_string();
        row.fields[14] = bit(completed.is_correct);
        row
    }

    pub fn planned(session: Option<&Session>, trial: &Trial) -> Self {
        let (subj_id, date, experimenter, computer) = match session {
            Some(s) => (
                s.subj_id.as_str().to_string(),
                s.date.clone(),
                s.experimenter.clone(),
                s.computer.clone(),
            ),
            None => Default::default(),
        };
        Self {
            fields: vec![
                subj_id,
                date,
                experimenter,
                computer,
                trial.block_ix.to_string(),
                trial.trial_ix.to_string(),
                trial.sound_id.to_string(),
                trial.word.to_string(),
                trial.sound_category.to_string(),
                trial.word_category.to_string(),
                trial.word_type.to_string(),
                bit(trial.correct_response),
                String::new(),
                String::new(),
                String::new(),
            ],
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn to_csv_line(&self) -> String {
        csv_line(self.fields.iter().map(String::as_str))
    }
}

pub fn header_line() -> String {
    csv_line(DATA_COLUMNS.iter().copied())
}

/// Joins cells with commas and a trailing newline, quoting cells that need it.
pub fn csv_line<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for (i, cell) in cells.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
    out
}
