#![forbid(unsafe_code)]

use std::fmt;
use std::time::{Duration, Instant};

use soundword_engines::response_device::{InputEventSource, MonotonicClock};
use soundword_kernel_contracts::catalog::Word;
use soundword_kernel_contracts::{ContractViolation, MonotonicTimeNs};

use crate::ExecutionError;

/// Result of a screen that waits for a keypress acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenOutcome {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Instructions,
    Break,
}

/// Display surface. Rendering and window management live behind this trait.
pub trait Presenter {
    fn show_fixation(&mut self) -> Result<(), ExecutionError>;
    fn show_stimulus_cue(&mut self) -> Result<(), ExecutionError>;
    fn show_word(&mut self, word: &Word) -> Result<(), ExecutionError>;
    fn show_response_prompt(&mut self) -> Result<(), ExecutionError>;
    fn clear(&mut self) -> Result<(), ExecutionError>;
    /// Shows `title`/`text` and blocks for acknowledgment. The only place a quit is observed.
    fn show_screen(
        &mut self,
        kind: ScreenKind,
        title: &str,
        text: &str,
    ) -> Result<ScreenOutcome, ExecutionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClipId(String);

impl ClipId {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = v.into();
        if v.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "clip_id",
                reason: "must not be empty",
            });
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Audio output. Starts a clip and reports its length; does not wait for it to end.
pub trait AudioPlayback {
    fn play(&mut self, clip: &ClipId) -> Result<Duration, ExecutionError>;
}

/// Blocking waits on the experiment thread.
pub trait Pacer: MonotonicClock {
    fn wait(&mut self, duration: Duration);
}

/// Wall-clock pacer. Copies share one origin so their timestamps are comparable.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> MonotonicTimeNs {
        MonotonicTimeNs(u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX))
    }
}

impl Pacer for SystemClock {
    fn wait(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Everything a trial touches outside the core.
#[derive(Debug)]
pub struct Collaborators<D, A, P, I>
where
    D: Presenter,
    A: AudioPlayback,
    P: Pacer,
    I: InputEventSource,
{
    pub presenter: D,
    pub audio: A,
    pub pacer: P,
    pub input: I,
}
