/// Errors for the multi-task pipeline
pub mod error;

/// Label spaces and the stacked label layout
pub mod labels;

/// Configuration for the multi-task heads
pub mod config;

/// Projection, cascade and pooling heads
pub mod heads;

/// Model output
pub mod output;

/// Common model trait for the pipeline
pub mod model;

/// Batcher
pub mod batcher;

/// Metric evaluation
pub mod evaluation;

pub use batcher::{Batch, Batcher, Infer, Item};
pub use config::HeadConfig;
pub use error::Error;
pub use evaluation::{evaluate, Accumulator, Evaluation, Metrics};
pub use heads::Head;
pub use labels::{LabelCounts, LabelLayout, LabelSet, LabelSpace, IC, OUTSIDE};
pub use model::Model;
pub use output::{Output, Predictions};
