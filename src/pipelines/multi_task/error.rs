use crate::metrics::entities::ScoringError;

/// Errors raised while building, running or evaluating a multi-task model
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The tag hierarchy has no levels
    #[error("the tag hierarchy must contain at least one tag level")]
    EmptyHierarchy,

    /// A tag level named in the hierarchy has no label count
    #[error("no label count for tag level {0}")]
    MissingTagLevel(String),

    /// A label set without any labels
    #[error("label set {0} has no labels")]
    EmptyLabelSet(String),

    /// Label ids must run from 0 without gaps
    #[error("label ids for {0} are not contiguous from 0")]
    NonContiguousLabels(String),

    /// The same label string appears twice within one label set
    #[error("label {label} appears more than once in {set}")]
    DuplicateLabel {
        /// The label set
        set: String,
        /// The repeated label
        label: String,
    },

    /// The projection layer was built for a different backbone hidden size
    #[error("backbone hidden size is {backbone} but the projection layer expects {projection}")]
    HiddenSize {
        /// Hidden size produced by the backbone
        backbone: usize,
        /// Hidden size the projection layer was built with
        projection: usize,
    },

    /// The position count does not fit the backbone
    #[error("heads are built for {heads} positions but the backbone provides {backbone}")]
    Positions {
        /// Positions the heads were built for
        heads: usize,
        /// Positions the backbone is configured with
        backbone: usize,
    },

    /// Attention heads must evenly split the projection dimension
    #[error("projection dim {proj_dim} is not divisible by {num_heads} attention heads")]
    Heads {
        /// The projection dimension
        proj_dim: usize,
        /// The number of attention heads
        num_heads: usize,
    },

    /// A tensor does not have the shape the model was configured for
    #[error("{field} has size {found} along dim {dim}, expected {expected}")]
    Shape {
        /// The offending tensor
        field: &'static str,
        /// The offending dimension
        dim: usize,
        /// The configured size
        expected: usize,
        /// The size that was found
        found: usize,
    },

    /// A label id with no tag in the id to tag mapping
    #[error("label id {id} has no tag at tag level {level}")]
    Decoding {
        /// The tag level (or "IC")
        level: String,
        /// The offending id
        id: i64,
    },

    /// A label string that is not part of its label set
    #[error("label {label} is not part of label set {level}")]
    UnknownLabel {
        /// The tag level (or "IC")
        level: String,
        /// The unknown label
        label: String,
    },

    /// The language array is not aligned with the evaluated examples
    #[error("language array has {found} entries but {expected} examples were evaluated")]
    LanguageCount {
        /// Number of evaluated examples
        expected: usize,
        /// Number of language entries
        found: usize,
    },

    /// No examples were produced by the batch source
    #[error("the evaluation set is empty")]
    EmptyEvaluation,

    /// Entity scoring failed
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl Error {
    /// Compare an actual tensor size against the configured one
    pub fn check_dim(
        field: &'static str,
        dim: usize,
        expected: usize,
        found: usize,
    ) -> Result<(), Self> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::Shape {
                field,
                dim,
                expected,
                found,
            })
        }
    }
}
