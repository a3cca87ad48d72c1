#![forbid(unsafe_code)]

use std::time::Duration;

use soundword_engines::response_device::{InputEventSource, MonotonicClock, ResponseDevice};
use soundword_kernel_contracts::session::{SessionConfig, TimingConfig};
use soundword_kernel_contracts::trial::{CompletedTrial, Trial, TrialResponse};
use soundword_kernel_contracts::{ContractViolation, MonotonicTimeNs, Validate};
use tracing::debug;

use crate::collaborators::{AudioPlayback, ClipId, Collaborators, Pacer, Presenter};
use crate::ExecutionError;

/// Phases of one trial, entered strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrialPhase {
    Fixation,
    StimulusCue,
    PlaybackWait,
    InterStimulusDelay,
    LabelFlash,
    ResponseWait,
    Feedback,
    InterTrialInterval,
    Done,
}

impl TrialPhase {
    pub fn next(self) -> TrialPhase {
        match self {
            TrialPhase::Fixation => TrialPhase::StimulusCue,
            TrialPhase::StimulusCue => TrialPhase::PlaybackWait,
            TrialPhase::PlaybackWait => TrialPhase::InterStimulusDelay,
            TrialPhase::InterStimulusDelay => TrialPhase::LabelFlash,
            TrialPhase::LabelFlash => TrialPhase::ResponseWait,
            TrialPhase::ResponseWait => TrialPhase::Feedback,
            TrialPhase::Feedback => TrialPhase::InterTrialInterval,
            TrialPhase::InterTrialInterval | TrialPhase::Done => TrialPhase::Done,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub phase: TrialPhase,
    pub entered_at: MonotonicTimeNs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub timing: TimingConfig,
    pub feedback_correct: ClipId,
    pub feedback_incorrect: ClipId,
}

impl ExecutorConfig {
    pub fn from_session_config(cfg: &SessionConfig) -> Result<Self, ContractViolation> {
        cfg.timing.validate()?;
        cfg.feedback.validate()?;
        Ok(Self {
            timing: cfg.timing,
            feedback_correct: ClipId::new(cfg.feedback.correct_clip.clone())?,
            feedback_incorrect: ClipId::new(cfg.feedback.incorrect_clip.clone())?,
        })
    }
}

/// One executed trial plus the phases it went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRun {
    pub completed: CompletedTrial,
    pub transitions: Vec<PhaseTransition>,
}

#[derive(Debug, Default)]
struct RunState {
    stimulus_length: Duration,
    response: Option<TrialResponse>,
    is_correct: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct TrialExecutor {
    config: ExecutorConfig,
    device: ResponseDevice,
}

fn ms(v: u32) -> Duration {
    Duration::from_millis(u64::from(v))
}

impl TrialExecutor {
    pub fn new(config: ExecutorConfig, device: ResponseDevice) -> Result<Self, ContractViolation> {
        config.timing.validate()?;
        Ok(Self { config, device })
    }

    pub fn device(&self) -> &ResponseDevice {
        &self.device
    }

    /// Drives `trial` from fixation to the end of the inter-trial interval.
    ///
    /// Nothing in here checks for quit; device and audio failures propagate.
    pub fn run_trial<D, A, P, I>(
        &self,
        trial: Trial,
        io: &mut Collaborators<D, A, P, I>,
    ) -> Result<TrialRun, ExecutionError>
    where
        D: Presenter,
        A: AudioPlayback,
        P: Pacer,
        I: InputEventSource,
    {
        let mut state = RunState::default();
        let mut transitions = Vec::with_capacity(8);
        let mut phase = TrialPhase::Fixation;
        while phase != TrialPhase::Done {
            let entered_at = io.pacer.now();
            debug!(
                block_ix = trial.block_ix.0,
                trial_ix = trial.trial_ix.0,
                ?phase,
                "trial phase"
            );
            transitions.push(PhaseTransition { phase, entered_at });
            self.enter(phase, &trial, &mut state, io)?;
            phase = phase.next();
        }

        let response = state.response.ok_or(ContractViolation::InvalidValue {
            field: "trial_run.response",
            reason: "response phase did not capture a response",
        })?;
        Ok(TrialRun {
            completed: CompletedTrial::from_response(trial, response),
            transitions,
        })
    }

    fn enter<D, A, P, I>(
        &self,
        phase: TrialPhase,
        trial: &Trial,
        state: &mut RunState,
        io: &mut Collaborators<D, A, P, I>,
    ) -> Result<(), ExecutionError>
    where
        D: Presenter,
        A: AudioPlayback,
        P: Pacer,
        I: InputEventSource,
    {
        let timing = &self.config.timing;
        match phase {
            TrialPhase::Fixation => {
                io.presenter.show_fixation()?;
                io.pacer.wait(ms(timing.fixation_ms));
            }
            TrialPhase::StimulusCue => {
                io.presenter.show_stimulus_cue()?;
                let clip = ClipId::new(trial.sound_id.clip_name())?;
                state.stimulus_length = io.audio.play(&clip)?;
            }
            TrialPhase::PlaybackWait => io.pacer.wait(state.stimulus_length),
            TrialPhase::InterStimulusDelay => {
                io.presenter.clear()?;
                io.pacer.wait(ms(timing.inter_stimulus_ms));
            }
            TrialPhase::LabelFlash => {
                io.presenter.show_word(&trial.word)?;
                io.pacer.wait(ms(timing.label_flash_ms));
            }
            TrialPhase::ResponseWait => {
                io.presenter.show_response_prompt()?;
                let clock: &dyn MonotonicClock = &io.pacer;
                let captured = self.device.get_response(&mut io.input, clock)?;
                state.is_correct = Some(captured.response.as_bool() == trial.correct_response);
                state.response = Some(captured);
            }
            TrialPhase::Feedback => {
                let clip = if state.is_correct == Some(true) {
                    &self.config.feedback_correct
                } else {
                    &self.config.feedback_incorrect
                };
                let length = io.audio.play(clip)?;
                if timing.wait_feedback {
                    io.pacer.wait(length);
                }
            }
            TrialPhase::InterTrialInterval => {
                io.presenter.clear()?;
                io.pacer.wait(ms(timing.iti_ms));
            }
            TrialPhase::Done => {}
        }
        Ok(())
    }
}
