//! Entity-level scoring over decoded tag sequences.
//!
//! Tags follow the usual `<prefix>-<type>` convention (`B-LOC`, `I-LOC`, `E-LOC`, `S-LOC`, `O`).
//! Chunking is lenient, the same way seqeval's default mode reads IOB1/IOB2/IOE/IOBES input: an
//! `I-` tag with no preceding `B-` still opens an entity, and a type change always closes one.
//! An entity is only counted as correct when its type, start and end all match.

use std::{collections::HashSet, iter};

use serde::{Deserialize, Serialize};

/// A span of tags forming one entity, with an inclusive `end`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Entity {
    /// The entity type, e.g. `LOC`
    pub kind: String,

    /// Index of the first tag of the entity
    pub start: usize,

    /// Index of the last tag of the entity
    pub end: usize,
}

/// Errors raised when the predicted and gold sequences cannot be aligned
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    /// A different number of predicted and gold sequences
    #[error("got {predicted} predicted sequences but {gold} gold sequences")]
    SequenceCount {
        /// Number of predicted sequences
        predicted: usize,
        /// Number of gold sequences
        gold: usize,
    },

    /// A predicted sequence whose length differs from its gold counterpart
    #[error("sequence {index} has {predicted} predicted tags but {gold} gold tags")]
    SequenceLength {
        /// Position of the sequence
        index: usize,
        /// Number of predicted tags
        predicted: usize,
        /// Number of gold tags
        gold: usize,
    },
}

#[derive(Clone, Copy)]
struct Chunk<'a> {
    prefix: char,
    kind: &'a str,
}

impl<'a> Chunk<'a> {
    fn parse(tag: &'a str) -> Self {
        let mut chars = tag.chars();
        let prefix = chars.next().unwrap_or('O');
        let rest = chars.as_str();

        let kind = rest.split_once('-').map_or(rest, |(_, kind)| kind);

        Self {
            prefix,
            kind: if kind.is_empty() { "_" } else { kind },
        }
    }

    fn ends_before(&self, next: &Chunk<'_>) -> bool {
        match (self.prefix, next.prefix) {
            ('E' | 'S', _) => true,
            ('B' | 'I', 'B' | 'S' | 'O') => true,
            ('O' | '.', _) => false,
            _ => self.kind != next.kind,
        }
    }

    fn starts_after(&self, prev: &Chunk<'_>) -> bool {
        match (prev.prefix, self.prefix) {
            (_, 'B' | 'S') => true,
            ('E' | 'S' | 'O', 'E' | 'I') => true,
            (_, 'O' | '.') => false,
            _ => self.kind != prev.kind,
        }
    }
}

/// Extract the entities of a single tag sequence
pub fn extract_entities<S: AsRef<str>>(tags: &[S]) -> Vec<Entity> {
    let mut entities = Vec::new();

    let mut prev = Chunk { prefix: 'O', kind: "" };
    let mut begin = 0;

    // A trailing "O" flushes an entity that runs to the end of the sequence
    let chunks = tags
        .iter()
        .map(|tag| Chunk::parse(tag.as_ref()))
        .chain(iter::once(Chunk { prefix: 'O', kind: "_" }));

    for (i, chunk) in chunks.enumerate() {
        if prev.ends_before(&chunk) {
            entities.push(Entity {
                kind: prev.kind.to_string(),
                start: begin,
                end: i - 1,
            });
        }

        if chunk.starts_after(&prev) {
            begin = i;
        }

        prev = chunk;
    }

    entities
}

/// Precision, recall and F1 for a set of entities
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityScores {
    /// Correct entities over predicted entities
    pub precision: f64,

    /// Correct entities over gold entities
    pub recall: f64,

    /// Harmonic mean of precision and recall
    pub f1: f64,
}

/// Running entity counts, which can be merged across shards before scoring
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityCounts {
    /// Predicted entities that exactly match a gold entity
    pub true_positives: usize,

    /// Total predicted entities
    pub predicted: usize,

    /// Total gold entities
    pub gold: usize,
}

impl EntityCounts {
    /// Count the entities of one aligned pair of sequences
    pub fn add_sequence<S: AsRef<str>>(&mut self, predicted: &[S], gold: &[S]) {
        let predicted: HashSet<Entity> = extract_entities(predicted).into_iter().collect();
        let gold: HashSet<Entity> = extract_entities(gold).into_iter().collect();

        self.true_positives += predicted.intersection(&gold).count();
        self.predicted += predicted.len();
        self.gold += gold.len();
    }

    /// Fold another set of counts into this one
    pub fn merge(&mut self, other: &EntityCounts) {
        self.true_positives += other.true_positives;
        self.predicted += other.predicted;
        self.gold += other.gold;
    }

    /// Micro-averaged scores, where any ratio with a zero denominator is 0
    pub fn scores(&self) -> EntityScores {
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

        let precision = ratio(self.true_positives, self.predicted);
        let recall = ratio(self.true_positives, self.gold);

        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        EntityScores {
            precision,
            recall,
            f1,
        }
    }
}

/// Score aligned predicted and gold tag sequences at the entity level
pub fn score<S: AsRef<str>>(
    predicted: &[Vec<S>],
    gold: &[Vec<S>],
) -> Result<EntityScores, ScoringError> {
    if predicted.len() != gold.len() {
        return Err(ScoringError::SequenceCount {
            predicted: predicted.len(),
            gold: gold.len(),
        });
    }

    let mut counts = EntityCounts::default();

    for (index, (predicted, gold)) in predicted.iter().zip(gold).enumerate() {
        if predicted.len() != gold.len() {
            return Err(ScoringError::SequenceLength {
                index,
                predicted: predicted.len(),
                gold: gold.len(),
            });
        }

        counts.add_sequence(predicted, gold);
    }

    Ok(counts.scores())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entity(kind: &str, start: usize, end: usize) -> Entity {
        Entity {
            kind: kind.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_extract_iob2() {
        let tags = ["B-PER", "I-PER", "O", "B-LOC", "B-LOC", "I-LOC"];

        assert_eq!(
            extract_entities(&tags),
            vec![entity("PER", 0, 1), entity("LOC", 3, 3), entity("LOC", 4, 5)]
        );
    }

    #[test]
    fn test_extract_lenient_inside_without_begin() {
        let tags = ["O", "I-ORG", "I-ORG", "I-PER"];

        assert_eq!(
            extract_entities(&tags),
            vec![entity("ORG", 1, 2), entity("PER", 3, 3)]
        );
    }

    #[test]
    fn test_extract_iobes() {
        let tags = ["S-LOC", "B-PER", "I-PER", "E-PER", "O"];

        assert_eq!(
            extract_entities(&tags),
            vec![entity("LOC", 0, 0), entity("PER", 1, 3)]
        );
    }

    #[test]
    fn test_entity_at_end_of_sequence() {
        assert_eq!(extract_entities(&["O", "B-MISC"]), vec![entity("MISC", 1, 1)]);
        assert!(extract_entities::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_score_partial_match() {
        let gold = vec![vec!["B-PER", "I-PER", "O", "B-LOC"]];
        let predicted = vec![vec!["B-PER", "O", "O", "B-LOC"]];

        let scores = score(&predicted, &gold).unwrap();

        // Only the LOC span matches exactly
        assert_eq!(scores.precision, 0.5);
        assert_eq!(scores.recall, 0.5);
        assert_eq!(scores.f1, 0.5);
    }

    #[test]
    fn test_score_without_entities_is_zero() {
        let gold = vec![vec!["O", "O"]];

        assert_eq!(score(&gold, &gold).unwrap(), EntityScores::default());
    }

    #[test]
    fn test_score_rejects_misaligned_sequences() {
        let gold = vec![vec!["O", "O"]];
        let predicted = vec![vec!["O"]];

        assert_eq!(
            score(&predicted, &gold),
            Err(ScoringError::SequenceLength {
                index: 0,
                predicted: 1,
                gold: 2
            })
        );
    }
}
