use std::{collections::BTreeMap, ops::Range};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::utils::{
    classes::{enumerate_labels, invert_map},
    files::read_file,
};

use super::Error;

/// The name used for the intent label set in errors and logs
pub static IC: &str = "IC";

/// The tag used for positions outside of any entity
pub static OUTSIDE: &str = "O";

/// A named label set with a mapping from contiguous ids to label strings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct LabelSet {
    /// The name of the label set (a tag level name, or "IC")
    pub name: String,

    /// A map from class ids to class name labels
    pub id2label: BTreeMap<usize, String>,
}

impl LabelSet {
    /// Build a label set from an ordered list of labels, where each id is the label's index
    pub fn from_labels<S: AsRef<str>>(name: impl Into<String>, labels: &[S]) -> Self {
        Self::new(name.into(), enumerate_labels(labels))
    }

    /// The number of labels
    pub fn len(&self) -> usize {
        self.id2label.len()
    }

    /// Whether the set has no labels
    pub fn is_empty(&self) -> bool {
        self.id2label.is_empty()
    }

    /// A reverse map from class name labels to class ids
    pub fn label2id(&self) -> BTreeMap<String, usize> {
        invert_map(self.id2label.clone())
    }

    /// Decode an id into its label string
    pub fn decode(&self, id: usize) -> Result<&str, Error> {
        self.id2label
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| Error::Decoding {
                level: self.name.clone(),
                id: id as i64,
            })
    }

    /// The id used to pad positions with no entity: the "O" tag if present, otherwise 0
    pub fn outside_id(&self) -> usize {
        self.id2label
            .iter()
            .find(|(_, label)| label.as_str() == OUTSIDE)
            .map(|(id, _)| *id)
            .unwrap_or(0)
    }

    /// Check that the set is non-empty, with ids running from 0 and no repeated labels
    pub fn validate(&self) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::EmptyLabelSet(self.name.clone()));
        }

        if self.id2label.keys().copied().ne(0..self.len()) {
            return Err(Error::NonContiguousLabels(self.name.clone()));
        }

        let label2id = self.label2id();
        if label2id.len() != self.len() {
            let label = self
                .id2label
                .iter()
                .find(|(id, label)| label2id.get(label.as_str()) != Some(id))
                .map(|(_, label)| label.clone())
                .unwrap_or_default();

            return Err(Error::DuplicateLabel {
                set: self.name.clone(),
                label,
            });
        }

        Ok(())
    }
}

/// The two label spaces of the task: one intent per example, and one tag per position for each
/// level of the tag hierarchy. Levels are ordered, coarse to fine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpace {
    /// Intent labels
    pub intents: LabelSet,

    /// Tag levels, in hierarchy order
    pub levels: Vec<LabelSet>,
}

impl LabelSpace {
    /// Create a validated label space
    pub fn new(intents: LabelSet, levels: Vec<LabelSet>) -> Result<Self, Error> {
        let space = Self { intents, levels };
        space.validate()?;

        Ok(space)
    }

    /// Load labels for a task from `intent_labels.txt` and one `<tag>_labels.txt` per tag level,
    /// with one label per line
    pub async fn load<S: AsRef<str>>(task_root: &str, tags: &[S]) -> anyhow::Result<Self> {
        let intents = read_file(&format!("{}/intent_labels.txt", task_root))
            .await
            .map_err(|e| anyhow!("Unable to read intent labels: {}", e))?;

        let mut levels = Vec::with_capacity(tags.len());
        for tag in tags {
            let tag = tag.as_ref();

            let labels = read_file(&format!("{}/{}_labels.txt", task_root, tag))
                .await
                .map_err(|e| anyhow!("Unable to read labels for tag level {}: {}", tag, e))?;

            levels.push(LabelSet::from_labels(tag, &labels));
        }

        let space = Self::new(LabelSet::from_labels(IC, &intents), levels)?;

        log::info!(
            "Loaded {} intents and {} tag levels from {}",
            space.intents.len(),
            space.levels.len(),
            task_root
        );

        Ok(space)
    }

    /// Check every label set, and that the hierarchy has at least one level
    pub fn validate(&self) -> Result<(), Error> {
        if self.levels.is_empty() {
            return Err(Error::EmptyHierarchy);
        }

        self.intents.validate()?;
        self.levels.iter().try_for_each(LabelSet::validate)
    }

    /// Tag level names, in hierarchy order
    pub fn tags(&self) -> Vec<String> {
        self.levels.iter().map(|level| level.name.clone()).collect()
    }

    /// Label counts for the intent set and each tag level
    pub fn counts(&self) -> LabelCounts {
        LabelCounts {
            ic: self.intents.len(),
            ner: self
                .levels
                .iter()
                .map(|level| (level.name.clone(), level.len()))
                .collect(),
        }
    }

    /// The stacked label layout for sequences of the given length
    pub fn layout(&self, positions: usize) -> LabelLayout {
        LabelLayout::new(positions, self.levels.len())
    }
}

/// Label counts keyed by tag level name, as supplied at model construction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct LabelCounts {
    /// Number of intent labels
    pub ic: usize,

    /// Number of tags for each tag level
    pub ner: BTreeMap<String, usize>,
}

impl LabelCounts {
    /// Per-level counts in hierarchy order. Every level must have a non-zero count.
    pub fn resolve<S: AsRef<str>>(&self, tags: &[S]) -> Result<Vec<usize>, Error> {
        if tags.is_empty() {
            return Err(Error::EmptyHierarchy);
        }

        if self.ic == 0 {
            return Err(Error::EmptyLabelSet(IC.to_string()));
        }

        tags.iter()
            .map(|tag| match self.ner.get(tag.as_ref()) {
                None => Err(Error::MissingTagLevel(tag.as_ref().to_string())),
                Some(0) => Err(Error::EmptyLabelSet(tag.as_ref().to_string())),
                Some(&count) => Ok(count),
            })
            .collect()
    }
}

/// Column layout of a stacked label tensor: column 0 holds the intent id, followed by one block
/// of `positions` columns per tag level, in hierarchy order
#[derive(Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct LabelLayout {
    /// Number of positions in each sequence
    pub positions: usize,

    /// Number of tag levels
    pub levels: usize,
}

impl LabelLayout {
    /// Total number of label columns
    pub fn width(&self) -> usize {
        1 + self.positions * self.levels
    }

    /// The column holding the intent id
    pub fn intent(&self) -> Range<usize> {
        0..1
    }

    /// The columns holding the tag ids for one level
    pub fn level(&self, level: usize) -> Range<usize> {
        let start = 1 + level * self.positions;

        start..start + self.positions
    }
}
