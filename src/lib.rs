//! # Burn Multi-Task
//!
//! Joint intent classification (IC) and hierarchical named entity recognition (NER) on top of a
//! pretrained BERT-family backbone. Information flows both ways between the tasks: intent
//! features steer a cascade of cross-attention modules over the tag hierarchy, and the finest
//! tag features are pooled back into the intent prediction.
#![forbid(unsafe_code)]

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Classification and entity-level metrics
pub mod metrics;

/// Utilities
pub mod utils;

/// Error macros
#[macro_use]
extern crate anyhow;
