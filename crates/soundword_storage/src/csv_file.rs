#![forbid(unsafe_code)]

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use soundword_kernel_contracts::session::Session;
use soundword_kernel_contracts::trial::CompletedTrial;
use tracing::{debug, info};

use crate::record::{header_line, TrialRecordRow};
use crate::repo::{RecorderDisposition, SessionRecorder};
use crate::RecorderError;

/// Per-subject CSV file recorder. Every row is written unbuffered and synced before `append`
/// returns, so a crash keeps all completed trials.
#[derive(Debug)]
pub struct CsvSessionRecorder {
    path: PathBuf,
    session: Session,
    file: Option<File>,
    rows: usize,
}

/// `data_dir/{subj_id}.csv`
pub fn data_file_path(data_dir: &Path, session: &Session) -> PathBuf {
    data_dir.join(format!("{}.csv", session.subj_id.as_str()))
}

impl CsvSessionRecorder {
    /// Creates the output and writes the header. Fails if `path` already holds any data.
    pub fn create(path: impl Into<PathBuf>, session: Session) -> Result<Self, RecorderError> {
        let path = path.into();
        let io = |source| RecorderError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io)?;
            }
        }
        let has_data = fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);
        if has_data {
            return Err(RecorderError::ExistingData { path: path.clone() });
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(io)?;
        file.write_all(header_line().as_bytes()).map_err(io)?;
        file.sync_data().map_err(io)?;
        info!(path = %path.display(), subj_id = session.subj_id.as_str(), "session output opened");

        Ok(Self {
            path,
            session,
            file: Some(file),
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn io_err(&self, source: std::io::Error) -> RecorderError {
        RecorderError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_durable(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_data()
}

impl SessionRecorder for CsvSessionRecorder {
    fn append(&mut self, completed: &CompletedTrial) -> Result<(), RecorderError> {
        let line = TrialRecordRow::completed(&self.session, completed).to_csv_line();
        let file = self.file.as_mut().ok_or(RecorderError::Closed)?;
        let written = write_durable(file, line.as_bytes());
        written.map_err(|e| self.io_err(e))?;
        self.rows += 1;
        debug!(
            block_ix = completed.trial.block_ix.0,
            trial_ix = completed.trial.trial_ix.0,
            rows = self.rows,
            "trial row appended"
        );
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.rows
    }

    fn close(&mut self) -> Result<RecorderDisposition, RecorderError> {
        let file = self.file.take().ok_or(RecorderError::Closed)?;
        file.sync_all().map_err(|e| self.io_err(e))?;
        info!(path = %self.path.display(), rows = self.rows, "session output closed");
        Ok(RecorderDisposition::Kept { rows: self.rows })
    }

    fn discard_if_header_only(&mut self) -> Result<RecorderDisposition, RecorderError> {
        if self.rows > 0 {
            return self.close();
        }
        let file = self.file.take().ok_or(RecorderError::Closed)?;
        drop(file);
        fs::remove_file(&self.path).map_err(|e| self.io_err(e))?;
        info!(path = %self.path.display(), "header-only session output removed");
        Ok(RecorderDisposition::DiscardedHeaderOnly)
    }
}
