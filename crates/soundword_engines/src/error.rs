#![forbid(unsafe_code)]

use soundword_kernel_contracts::catalog::Category;
use soundword_kernel_contracts::ContractViolation;
use thiserror::Error;

/// Failures while building a trial plan. All of them are fatal: no partial session starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DesignError {
    #[error("catalog line {line}: {reason}")]
    CatalogParse { line: usize, reason: String },
    #[error("catalog is empty after filtering by word_type")]
    EmptyCatalog,
    #[error("need at least two categories to draw mismatched labels, found {found}")]
    TooFewCategories { found: usize },
    #[error("category {category} has {got} seeds, expected exactly {expected} (one per block)")]
    SeedCountMismatch {
        category: Category,
        expected: usize,
        got: usize,
    },
    #[error("{per_block} trials per block exceeds the trial_ix limit of {max}")]
    TooManyTrials { per_block: usize, max: usize },
    #[error("category {category} has no candidate labels")]
    NoLabels { category: Category },
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),
}

/// Input device failures. Not recovered inside a trial; they end the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("input source closed")]
    Closed,
    #[error("input source failed: {0}")]
    Source(String),
}
