#![forbid(unsafe_code)]

use std::fmt;

use serde::Deserialize;

use crate::common::validate_text;
use crate::{ContractViolation, SchemaVersion, Validate};

pub const CATALOG_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Column order of the stimulus catalog table.
pub const CATALOG_COLUMNS: [&str; 4] = ["seed_id", "category", "word", "word_type"];

const MAX_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeedId(String);

impl SeedId {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the stimulus clip recorded for this seed.
    pub fn clip_name(&self) -> String {
        format!("{}.wav", self.0)
    }
}

impl Validate for SeedId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_text("seed_id", &self.0, MAX_ID_LEN)
    }
}

impl fmt::Display for SeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category(String);

impl Category {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for Category {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_text("category", &self.0, MAX_ID_LEN)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(String);

impl Word {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for Word {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_text("word", &self.0, MAX_ID_LEN)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct WordType(String);

impl WordType {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WordType {
    type Error = ContractViolation;

    fn try_from(v: String) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl Validate for WordType {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_text("word_type", &self.0, MAX_ID_LEN)
    }
}

impl fmt::Display for WordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One (seed, label) row of the stimulus catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StimulusRecord {
    pub seed_id: SeedId,
    pub category: Category,
    pub word: Word,
    pub word_type: WordType,
}

impl StimulusRecord {
    pub fn v1(
        seed_id: SeedId,
        category: Category,
        word: Word,
        word_type: WordType,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            seed_id,
            category,
            word,
            word_type,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for StimulusRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.seed_id.validate()?;
        self.category.validate()?;
        self.word.validate()?;
        self.word_type.validate()?;
        Ok(())
    }
}
