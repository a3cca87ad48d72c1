#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use soundword_kernel_contracts::catalog::{Category, SeedId, Word, WordType};
use soundword_kernel_contracts::session::{CorrectnessMode, SessionConfig};
use soundword_kernel_contracts::trial::{BlockIx, Trial, TrialIx};
use soundword_kernel_contracts::{ContractViolation, Validate};
use tracing::{debug, info};

use crate::catalog::StimulusCatalog;
use crate::label_assign::{assign_labels, Assignment};
use crate::plan::TrialPlan;
use crate::random_source::RandomSource;
use crate::seed_assign::{assign_seeds, SeedAssignment};
use crate::DesignError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignParams {
    pub blocks: u16,
    pub repetitions: u16,
    pub p_correct: f64,
    pub correctness_mode: CorrectnessMode,
}

impl DesignParams {
    pub fn mvp_v1() -> Self {
        Self {
            blocks: 4,
            repetitions: 6,
            p_correct: 0.5,
            correctness_mode: CorrectnessMode::Bernoulli,
        }
    }

    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            blocks: cfg.blocks,
            repetitions: cfg.repetitions,
            p_correct: cfg.p_correct,
            correctness_mode: cfg.correctness_mode,
        }
    }
}

impl Validate for DesignParams {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.blocks == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "design_params.blocks",
                reason: "must be > 0",
            });
        }
        if self.repetitions == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "design_params.repetitions",
                reason: "must be > 0",
            });
        }
        if !self.p_correct.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "design_params.p_correct",
            });
        }
        if !(0.0..=1.0).contains(&self.p_correct) {
            return Err(ContractViolation::InvalidRange {
                field: "design_params.p_correct",
                min: 0.0,
                max: 1.0,
                got: self.p_correct,
            });
        }
        Ok(())
    }
}

/// A seed row replicated for one presentation, before labels and order are drawn.
#[derive(Debug, Clone)]
struct RawTrial {
    block_ix: BlockIx,
    category: Category,
    seed_id: SeedId,
    correct_response: bool,
}

/// Expands seed assignments into the trial list.
///
/// 1. every (block, category, seed) row is replicated `repetitions` times;
/// 2. `correct_response` is drawn per trial (Bernoulli) or per block (exact quota);
/// 3. correct trials show their own category's label, others a label drawn uniformly from the
///    remaining categories;
/// 4. trials are numbered 1..N inside each block, then that numbering is permuted.
pub fn generate_trials(
    seeds: &[SeedAssignment],
    assignment: &Assignment,
    params: DesignParams,
    rng: &mut RandomSource,
) -> Result<Vec<Trial>, DesignError> {
    params.validate()?;

    let raw = replicate(seeds, params.repetitions);
    let raw = draw_correctness(raw, params, rng)?;
    let labelled = attach_labels(raw, assignment, rng)?;
    order_within_blocks(labelled, rng)
}

fn replicate(seeds: &[SeedAssignment], repetitions: u16) -> Vec<RawTrial> {
    seeds
        .iter()
        .flat_map(|s| {
            (0..repetitions).map(move |_| RawTrial {
                block_ix: s.block_ix,
                category: s.category.clone(),
                seed_id: s.seed_id.clone(),
                correct_response: false,
            })
        })
        .collect()
}

fn draw_correctness(
    raw: Vec<RawTrial>,
    params: DesignParams,
    rng: &mut RandomSource,
) -> Result<Vec<RawTrial>, DesignError> {
    match params.correctness_mode {
        CorrectnessMode::Bernoulli => raw
            .into_iter()
            .map(|mut t| -> Result<RawTrial, DesignError> {
                t.correct_response = rng.bernoulli(params.p_correct)?;
                Ok(t)
            })
            .collect(),
        CorrectnessMode::BlockQuota => {
            let mut by_block: BTreeMap<BlockIx, Vec<RawTrial>> = BTreeMap::new();
            for t in raw {
                by_block.entry(t.block_ix).or_default().push(t);
            }
            let mut out = Vec::new();
            for (_, mut block) in by_block {
                let n = block.len();
                let quota = ((n as f64) * params.p_correct).round() as usize;
                let mut flags: Vec<bool> = (0..n).map(|i| i < quota).collect();
                rng.shuffle(&mut flags);
                for (t, flag) in block.iter_mut().zip(flags) {
                    t.correct_response = flag;
                }
                out.extend(block);
            }
            Ok(out)
        }
    }
}

struct LabelledTrial {
    raw: RawTrial,
    word_category: Category,
    word: Word,
    word_type: WordType,
}

fn attach_labels(
    raw: Vec<RawTrial>,
    assignment: &Assignment,
    rng: &mut RandomSource,
) -> Result<Vec<LabelledTrial>, DesignError> {
    let mut out = Vec::with_capacity(raw.len());
    for t in raw {
        let (word_category, label) = if t.correct_response {
            let label = assignment
                .label(&t.category)
                .ok_or_else(|| DesignError::NoLabels {
                    category: t.category.clone(),
                })?;
            (t.category.clone(), label)
        } else {
            let others = assignment.others(&t.category);
            let (c, label) = rng
                .choose(&others)
                .copied()
                .ok_or(DesignError::TooFewCategories {
                    found: assignment.len(),
                })?;
            (c.clone(), label)
        };
        out.push(LabelledTrial {
            word: label.word.clone(),
            word_type: label.word_type.clone(),
            word_category,
            raw: t,
        });
    }
    Ok(out)
}

fn order_within_blocks(
    labelled: Vec<LabelledTrial>,
    rng: &mut RandomSource,
) -> Result<Vec<Trial>, DesignError> {
    let mut by_block: BTreeMap<BlockIx, Vec<LabelledTrial>> = BTreeMap::new();
    for t in labelled {
        by_block.entry(t.raw.block_ix).or_default().push(t);
    }

    let mut out = Vec::new();
    for (block_ix, block) in by_block {
        // Sequential 1..=N, then a permutation of those numbers.
        let per_block = block.len();
        let order = rng.permutation(per_block);
        for (t, slot) in block.into_iter().zip(order) {
            let trial_ix = u16::try_from(slot + 1).map_err(|_| DesignError::TooManyTrials {
                per_block,
                max: usize::from(u16::MAX),
            })?;
            out.push(Trial::v1(
                block_ix,
                TrialIx(trial_ix),
                t.raw.seed_id,
                t.raw.category,
                t.word,
                t.word_category,
                t.word_type,
                t.raw.correct_response,
            )?);
        }
    }
    Ok(out)
}

/// Two-phase construction of a session's plan: validated inputs in, immutable plan out.
#[derive(Debug, Clone)]
pub struct TrialDesigner {
    catalog: StimulusCatalog,
    word_type: Option<WordType>,
    params: DesignParams,
}

impl TrialDesigner {
    pub fn new(
        catalog: StimulusCatalog,
        word_type: Option<WordType>,
        params: DesignParams,
    ) -> Result<Self, DesignError> {
        params.validate()?;
        Ok(Self {
            catalog,
            word_type,
            params,
        })
    }

    pub fn from_config(catalog: StimulusCatalog, cfg: &SessionConfig) -> Result<Self, DesignError> {
        cfg.validate()?;
        Self::new(catalog, cfg.word_type.clone(), DesignParams::from_config(cfg))
    }

    pub fn params(&self) -> DesignParams {
        self.params
    }

    /// Builds the plan for `seed`. Pure: equal inputs give an identical plan.
    pub fn build(&self, seed: u64) -> Result<TrialPlan, DesignError> {
        let catalog = match &self.word_type {
            Some(wt) => self.catalog.filter_word_type(wt),
            None => self.catalog.clone(),
        };
        if catalog.is_empty() {
            return Err(DesignError::EmptyCatalog);
        }
        let categories = catalog.categories();
        if categories.len() < 2 {
            return Err(DesignError::TooFewCategories {
                found: categories.len(),
            });
        }

        // trial_ix is a u16 numbered 1..=K*R inside each block.
        let per_block = categories.len() * usize::from(self.params.repetitions);
        if per_block > usize::from(u16::MAX) {
            return Err(DesignError::TooManyTrials {
                per_block,
                max: usize::from(u16::MAX),
            });
        }

        let mut rng = RandomSource::seeded(seed);
        let seeds = assign_seeds(&catalog, self.params.blocks, &mut rng)?;
        let assignment = assign_labels(&catalog, &mut rng)?;
        for (category, label) in assignment.iter() {
            debug!(
                category = category.as_str(),
                word = label.word.as_str(),
                "label assigned"
            );
        }
        let trials = generate_trials(&seeds, &assignment, self.params, &mut rng)?;
        let plan = TrialPlan::new(seed, assignment, trials)?;
        info!(
            seed,
            categories = categories.len(),
            blocks = plan.block_count(),
            trials = plan.len(),
            "trial plan built"
        );
        Ok(plan)
    }
}
