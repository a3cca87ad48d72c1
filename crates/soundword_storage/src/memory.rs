#![forbid(unsafe_code)]

use soundword_kernel_contracts::session::Session;
use soundword_kernel_contracts::trial::CompletedTrial;

use crate::record::{header_line, TrialRecordRow};
use crate::repo::{RecorderDisposition, SessionRecorder};
use crate::RecorderError;

/// In-memory recorder with the same row contract as the CSV file recorder.
#[derive(Debug, Clone)]
pub struct InMemorySessionRecorder {
    session: Session,
    completed: Vec<CompletedTrial>,
    open: bool,
    discarded: bool,
}

impl InMemorySessionRecorder {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            completed: Vec::new(),
            open: true,
            discarded: false,
        }
    }

    pub fn completed(&self) -> &[CompletedTrial] {
        &self.completed
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Header plus one line per appended trial, exactly as the file recorder writes them.
    pub fn render(&self) -> String {
        let mut out = header_line();
        for c in &self.completed {
            out.push_str(&TrialRecordRow::completed(&self.session, c).to_csv_line());
        }
        out
    }
}

impl SessionRecorder for InMemorySessionRecorder {
    fn append(&mut self, completed: &CompletedTrial) -> Result<(), RecorderError> {
        if !self.open {
            return Err(RecorderError::Closed);
        }
        self.completed.push(completed.clone());
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.completed.len()
    }

    fn close(&mut self) -> Result<RecorderDisposition, RecorderError> {
        if !self.open {
            return Err(RecorderError::Closed);
        }
        self.open = false;
        Ok(RecorderDisposition::Kept {
            rows: self.completed.len(),
        })
    }

    fn discard_if_header_only(&mut self) -> Result<RecorderDisposition, RecorderError> {
        if !self.completed.is_empty() {
            return self.close();
        }
        if !self.open {
            return Err(RecorderError::Closed);
        }
        self.open = false;
        self.discarded = true;
        Ok(RecorderDisposition::DiscardedHeaderOnly)
    }
}
