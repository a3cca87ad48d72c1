#![forbid(unsafe_code)]

use std::fmt;

use crate::catalog::{Category, SeedId, Word, WordType};
use crate::{ContractViolation, SchemaVersion, Validate};

pub const TRIAL_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// 1-based block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockIx(pub u16);

impl Validate for BlockIx {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "block_ix",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

impl fmt::Display for BlockIx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-based presentation position of a trial inside its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrialIx(pub u16);

impl Validate for TrialIx {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "trial_ix",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

impl fmt::Display for TrialIx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trial {
    pub schema_version: SchemaVersion,
    pub block_ix: BlockIx,
    pub trial_ix: TrialIx,
    pub sound_id: SeedId,
    pub sound_category: Category,
    pub word: Word,
    pub word_category: Category,
    pub word_type: WordType,
    pub correct_response: bool,
}

impl Trial {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        block_ix: BlockIx,
        trial_ix: TrialIx,
        sound_id: SeedId,
        sound_category: Category,
        word: Word,
        word_category: Category,
        word_type: WordType,
        correct_response: bool,
    ) -> Result<Self, ContractViolation> {
        let t = Self {
            schema_version: TRIAL_CONTRACT_VERSION,
            block_ix,
            trial_ix,
            sound_id,
            sound_category,
            word,
            word_category,
            word_type,
            correct_response,
        };
        t.validate()?;
        Ok(t)
    }
}

impl Validate for Trial {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != TRIAL_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "trial.schema_version",
                reason: "must match TRIAL_CONTRACT_VERSION",
            });
        }
        self.block_ix.validate()?;
        self.trial_ix.validate()?;
        self.sound_id.validate()?;
        self.sound_category.validate()?;
        self.word.validate()?;
        self.word_category.validate()?;
        self.word_type.validate()?;
        if self.correct_response != (self.sound_category == self.word_category) {
            return Err(ContractViolation::InvalidValue {
                field: "trial.correct_response",
                reason: "must be true exactly when word_category equals sound_category",
            });
        }
        Ok(())
    }
}

/// Logical answer captured from an input device; 1 = "the word names this sound", 0 = "it does not".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalResponse(u8);

impl LogicalResponse {
    pub const YES: LogicalResponse = LogicalResponse(1);
    pub const NO: LogicalResponse = LogicalResponse(0);

    pub fn new(v: u8) -> Result<Self, ContractViolation> {
        let r = Self(v);
        r.validate()?;
        Ok(r)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn as_bool(self) -> bool {
        self.0 == 1
    }
}

impl Validate for LogicalResponse {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 > 1 {
            return Err(ContractViolation::InvalidValue {
                field: "response",
                reason: "must be 0 or 1",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReactionTimeMs(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialResponse {
    pub response: LogicalResponse,
    pub reaction_time_ms: ReactionTimeMs,
}

/// A trial merged with the subject's answer. Built exactly once per trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTrial {
    pub trial: Trial,
    pub response: LogicalResponse,
    pub reaction_time_ms: ReactionTimeMs,
    pub is_correct: bool,
}

impl CompletedTrial {
    pub fn from_response(trial: Trial, captured: TrialResponse) -> Self {
        let is_correct = captured.response.as_bool() == trial.correct_response;
        Self {
            trial,
            response: captured.response,
            reaction_time_ms: captured.reaction_time_ms,
            is_correct,
        }
    }
}
