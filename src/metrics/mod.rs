/// Accuracy and macro-averaged F1 for single-label classification
pub mod classification;

/// Entity-level precision, recall and F1 over tag sequences
pub mod entities;

pub use entities::{EntityCounts, EntityScores};
