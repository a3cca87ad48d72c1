#![forbid(unsafe_code)]

use std::ops::Range;

use sha2::{Digest, Sha256};
use soundword_kernel_contracts::trial::{BlockIx, Trial};
use soundword_kernel_contracts::ContractViolation;

use crate::label_assign::Assignment;

/// The immutable trial sequence of one session, computed once before the first trial runs.
///
/// Trials are held ordered by (block_ix, trial_ix); blocks are exposed in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialPlan {
    seed: u64,
    assignment: Assignment,
    trials: Vec<Trial>,
    blocks: Vec<(BlockIx, Range<usize>)>,
}

/// Read-only view of one block's trials in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    block_ix: BlockIx,
    trials: &'a [Trial],
}

impl<'a> Block<'a> {
    pub fn block_ix(&self) -> BlockIx {
        self.block_ix
    }

    pub fn trials(&self) -> &'a [Trial] {
        self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

impl TrialPlan {
    pub fn new(
        seed: u64,
        assignment: Assignment,
        mut trials: Vec<Trial>,
    ) -> Result<Self, ContractViolation> {
        if trials.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "trial_plan.trials",
                reason: "must not be empty",
            });
        }
        trials.sort_by_key(|t| (t.block_ix, t.trial_ix));

        let mut blocks: Vec<(BlockIx, Range<usize>)> = Vec::new();
        let mut start = 0;
        for i in 1..=trials.len() {
            if i == trials.len() || trials[i].block_ix != trials[start].block_ix {
                blocks.push((trials[start].block_ix, start..i));
                start = i;
            }
        }

        for (_, range) in &blocks {
            // Sorted, so a permutation of 1..=n means position k holds trial_ix k + 1.
            let contiguous = trials[range.clone()]
                .iter()
                .enumerate()
                .all(|(k, t)| t.trial_ix.0 as usize == k + 1);
            if !contiguous {
                return Err(ContractViolation::InvalidValue {
                    field: "trial_plan.trial_ix",
                    reason: "must be a permutation of 1..=N within each block",
                });
            }
        }

        Ok(Self {
            seed,
            assignment,
            trials,
            blocks,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// All trials in (block_ix, trial_ix) order.
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block<'_>> + '_ {
        self.blocks.iter().map(|(block_ix, range)| Block {
            block_ix: *block_ix,
            trials: &self.trials[range.clone()],
        })
    }

    pub fn block(&self, block_ix: BlockIx) -> Option<Block<'_>> {
        self.blocks().find(|b| b.block_ix == block_ix)
    }

    /// SHA-256 over the canonical rendering of the label assignment and every trial.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("seed={}\n", self.seed).as_bytes());
        for (category, label) in self.assignment.iter() {
            hasher.update(format!("label\t{category}\t{}\t{}\n", label.word, label.word_type).as_bytes());
        }
        for t in &self.trials {
            hasher.update(
                format!(
                    "trial\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                    t.block_ix,
                    t.trial_ix,
                    t.sound_id,
                    t.word,
                    t.sound_category,
                    t.word_category,
                    t.word_type,
                    u8::from(t.correct_response)
                )
                .as_bytes(),
            );
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
