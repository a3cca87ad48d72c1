#![forbid(unsafe_code)]

use soundword_kernel_contracts::catalog::{Category, SeedId};
use soundword_kernel_contracts::trial::BlockIx;

use crate::catalog::StimulusCatalog;
use crate::random_source::RandomSource;
use crate::DesignError;

/// One seed placed into one block.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeedAssignment {
    pub block_ix: BlockIx,
    pub category: Category,
    pub seed_id: SeedId,
}

/// Places every category's seeds into blocks `1..=blocks`, one seed per (category, block).
///
/// Each category must own exactly `blocks` distinct seeds. Per category, a uniform permutation of
/// the block indices is drawn and zipped with the sorted seeds. The result is sorted by
/// (block, category, seed).
pub fn assign_seeds(
    catalog: &StimulusCatalog,
    blocks: u16,
    rng: &mut RandomSource,
) -> Result<Vec<SeedAssignment>, DesignError> {
    let by_category = catalog.seeds_by_category();
    let expected = blocks as usize;

    // Check every category before drawing anything.
    for (category, seeds) in &by_category {
        if seeds.len() != expected {
            return Err(DesignError::SeedCountMismatch {
                category: category.clone(),
                expected,
                got: seeds.len(),
            });
        }
    }

    let mut out = Vec::with_capacity(by_category.len() * expected);
    for (category, seeds) in by_category {
        let order = rng.permutation(expected);
        for (seed_id, slot) in seeds.into_iter().zip(order) {
            out.push(SeedAssignment {
                block_ix: BlockIx(slot as u16 + 1),
                category: category.clone(),
                seed_id,
            });
        }
    }
    out.sort();
    Ok(out)
}
