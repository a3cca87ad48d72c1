#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use soundword_kernel_contracts::catalog::{Category, Word, WordType};
use tracing::warn;

use crate::catalog::StimulusCatalog;
use crate::random_source::RandomSource;
use crate::DesignError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    pub word: Word,
    pub word_type: WordType,
}

/// The one learnable label per category for this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    labels: BTreeMap<Category, Label>,
}

impl Assignment {
    pub fn from_labels(labels: BTreeMap<Category, Label>) -> Self {
        Self { labels }
    }

    pub fn label(&self, category: &Category) -> Option<&Label> {
        self.labels.get(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &Label)> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels of every category except `category`, in category order.
    pub fn others(&self, category: &Category) -> Vec<(&Category, &Label)> {
        self.labels.iter().filter(|(c, _)| *c != category).collect()
    }

    /// Words assigned to more than one category. Reported, never resolved.
    pub fn duplicate_words(&self) -> Vec<Word> {
        let mut seen: BTreeMap<&Word, usize> = BTreeMap::new();
        for label in self.labels.values() {
            *seen.entry(&label.word).or_default() += 1;
        }
        seen.into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(w, _)| w.clone())
            .collect()
    }
}

/// Samples one label per category, uniformly over that category's distinct candidate words.
pub fn assign_labels(
    catalog: &StimulusCatalog,
    rng: &mut RandomSource,
) -> Result<Assignment, DesignError> {
    let mut labels = BTreeMap::new();
    for (category, words) in catalog.words_by_category() {
        let (word, word_type) = rng
            .choose(&words)
            .cloned()
            .ok_or_else(|| DesignError::NoLabels {
                category: category.clone(),
            })?;
        labels.insert(category, Label { word, word_type });
    }
    let assignment = Assignment::from_labels(labels);
    for word in assignment.duplicate_words() {
        warn!(word = word.as_str(), "same label assigned to more than one category");
    }
    Ok(assignment)
}
