/// BERT for multi-task IC and hierarchical NER Config
pub mod config;

/// BERT for multi-task IC and hierarchical NER
pub mod model;

pub use config::{Config, Options};
pub use model::{Model, ModelRecord};
