#![forbid(unsafe_code)]

use serde::Deserialize;

use crate::catalog::WordType;
use crate::common::{validate_probability, validate_text};
use crate::device::{GamepadMap, KeyboardMap};
use crate::{ContractViolation, SchemaVersion, Validate};

pub const SESSION_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = ContractViolation;

    fn try_from(v: String) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl Validate for SubjectId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_text("subj_id", &self.0, 64)?;
        // Used as a file stem for the per-subject data file.
        if !self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ContractViolation::InvalidValue {
                field: "subj_id",
                reason: "must contain only ASCII letters, digits, '-' or '_'",
            });
        }
        Ok(())
    }
}

/// Identifiers prefixed onto every persisted trial row. Constant for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub schema_version: SchemaVersion,
    pub subj_id: SubjectId,
    pub date: String,
    pub experimenter: String,
    pub computer: String,
    pub seed: u64,
}

impl Session {
    pub fn v1(
        subj_id: SubjectId,
        date: String,
        experimenter: String,
        computer: String,
        seed: u64,
    ) -> Result<Self, ContractViolation> {
        let s = Self {
            schema_version: SESSION_CONTRACT_VERSION,
            subj_id,
            date,
            experimenter,
            computer,
            seed,
        };
        s.validate()?;
        Ok(s)
    }
}

impl Validate for Session {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != SESSION_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "session.schema_version",
                reason: "must match SESSION_CONTRACT_VERSION",
            });
        }
        self.subj_id.validate()?;
        validate_text("session.date", &self.date, 64)?;
        validate_text("session.experimenter", &self.experimenter, 64)?;
        validate_text("session.computer", &self.computer, 128)?;
        Ok(())
    }
}

/// How the correct/incorrect split of a block is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectnessMode {
    /// Independent weighted coin flip per trial.
    #[default]
    Bernoulli,
    /// Exactly round(N * p) correct trials in every block.
    BlockQuota,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub fixation_ms: u32,
    pub inter_stimulus_ms: u32,
    pub label_flash_ms: u32,
    pub iti_ms: u32,
    /// Block for the feedback cue's length before the inter-trial interval.
    pub wait_feedback: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fixation_ms: 500,
            inter_stimulus_ms: 250,
            label_flash_ms: 1_000,
            iti_ms: 1_000,
            wait_feedback: true,
        }
    }
}

impl Validate for TimingConfig {
    fn validate(&self) -> Result<(), ContractViolation> {
        for (field, v) in [
            ("timing.fixation_ms", self.fixation_ms),
            ("timing.label_flash_ms", self.label_flash_ms),
        ] {
            if v == 0 {
                return Err(ContractViolation::InvalidValue {
                    field,
                    reason: "must be > 0",
                });
            }
        }
        for (field, v) in [
            ("timing.fixation_ms", self.fixation_ms),
            ("timing.inter_stimulus_ms", self.inter_stimulus_ms),
            ("timing.label_flash_ms", self.label_flash_ms),
            ("timing.iti_ms", self.iti_ms),
        ] {
            if v > 60_000 {
                return Err(ContractViolation::InvalidRange {
                    field,
                    min: 0.0,
                    max: 60_000.0,
                    got: v as f64,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScreenTexts {
    pub title: String,
    pub instructions: String,
    pub break_text: String,
}

impl Default for ScreenTexts {
    fn default() -> Self {
        Self {
            title: "Learn the names of different sounds".to_string(),
            instructions: "You will hear a sound and then see a word. \
                           Press the YES key if the word is the name of the sound, \
                           and the NO key if it is not."
                .to_string(),
            break_text: "Take a short break. Press any key to continue.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedbackClips {
    pub correct_clip: String,
    pub incorrect_clip: String,
}

impl Default for FeedbackClips {
    fn default() -> Self {
        Self {
            correct_clip: "feedback_correct.wav".to_string(),
            incorrect_clip: "feedback_incorrect.wav".to_string(),
        }
    }
}

impl Validate for FeedbackClips {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_text("feedback.correct_clip", &self.correct_clip, 128)?;
        validate_text("feedback.incorrect_clip", &self.incorrect_clip, 128)?;
        if self.correct_clip == self.incorrect_clip {
            return Err(ContractViolation::InvalidValue {
                field: "feedback",
                reason: "correct and incorrect cues must differ",
            });
        }
        Ok(())
    }
}

fn default_experimenter() -> String {
    "unknown".to_string()
}

fn default_blocks() -> u16 {
    4
}

fn default_repetitions() -> u16 {
    6
}

fn default_p_correct() -> f64 {
    0.5
}

/// Session configuration document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    pub subj_id: SubjectId,
    #[serde(default = "default_experimenter")]
    pub experimenter: String,
    pub seed: u64,
    #[serde(default)]
    pub word_type: Option<WordType>,
    #[serde(default = "default_blocks")]
    pub blocks: u16,
    #[serde(default = "default_repetitions")]
    pub repetitions: u16,
    #[serde(default = "default_p_correct")]
    pub p_correct: f64,
    #[serde(default)]
    pub correctness_mode: CorrectnessMode,
    #[serde(default)]
    pub keyboard_map: KeyboardMap,
    #[serde(default)]
    pub gamepad_map: GamepadMap,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub texts: ScreenTexts,
    #[serde(default)]
    pub feedback: FeedbackClips,
}

impl SessionConfig {
    pub fn mvp_v1(subj_id: SubjectId, seed: u64) -> Self {
        Self {
            subj_id,
            experimenter: default_experimenter(),
            seed,
            word_type: None,
            blocks: default_blocks(),
            repetitions: default_repetitions(),
            p_correct: default_p_correct(),
            correctness_mode: CorrectnessMode::default(),
            keyboard_map: KeyboardMap::default(),
            gamepad_map: GamepadMap::default(),
            timing: TimingConfig::default(),
            texts: ScreenTexts::default(),
            feedback: FeedbackClips::default(),
        }
    }
}

impl Validate for SessionConfig {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.subj_id.validate()?;
        validate_text("experimenter", &self.experimenter, 64)?;
        if let Some(wt) = &self.word_type {
            wt.validate()?;
        }
        if self.blocks == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "blocks",
                reason: "must be > 0",
            });
        }
        if self.repetitions == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "repetitions",
                reason: "must be > 0",
            });
        }
        validate_probability("p_correct", self.p_correct)?;
        self.keyboard_map.validate()?;
        self.gamepad_map.validate()?;
        self.timing.validate()?;
        self.feedback.validate()?;
        Ok(())
    }
}
