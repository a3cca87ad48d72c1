#![forbid(unsafe_code)]

use soundword_kernel_contracts::trial::CompletedTrial;

use crate::RecorderError;

/// What happened to the session output when it was finalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderDisposition {
    Kept { rows: usize },
    /// Only the header had been written, so the output was removed.
    DiscardedHeaderOnly,
}

/// Append-only per-subject trial sink. The header is written when the recorder is created.
pub trait SessionRecorder {
    /// Appends one finished trial and makes it durable before returning.
    fn append(&mut self, completed: &CompletedTrial) -> Result<(), RecorderError>;

    fn rows_written(&self) -> usize;

    /// Closes the output and keeps it.
    fn close(&mut self) -> Result<RecorderDisposition, RecorderError>;

    /// Closes the output, removing it when no trial row was written.
    fn discard_if_header_only(&mut self) -> Result<RecorderDisposition, RecorderError>;
}
