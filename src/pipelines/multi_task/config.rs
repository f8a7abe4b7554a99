use burn::tensor::backend::Backend;

use super::{
    heads::{Cascade, Head, Pooling, Projection},
    Error, LabelCounts,
};

/// Configuration for the backbone-agnostic multi-task heads
#[derive(burn::config::Config)]
pub struct HeadConfig {
    /// Size of the backbone hidden state (e.g., 768 for bert-base-uncased)
    pub hidden_size: usize,

    /// Number of positions in every input sequence
    pub positions: usize,

    /// Tag level names, in hierarchy order
    pub tags: Vec<String>,

    /// Label counts for IC and for each tag level
    pub num_labels: LabelCounts,

    /// Dimension of the task-specific projections
    #[config(default = 128)]
    pub proj_dim: usize,

    /// Number of heads in each cross-attention module of the cascade
    #[config(default = 4)]
    pub num_heads: usize,
}

impl HeadConfig {
    /// Initialize the heads, failing fast on an inconsistent configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Head<B>, Error> {
        let tag_counts = self.num_labels.resolve(&self.tags)?;

        if self.num_heads == 0 || self.proj_dim % self.num_heads != 0 {
            return Err(Error::Heads {
                proj_dim: self.proj_dim,
                num_heads: self.num_heads,
            });
        }

        Ok(Head {
            projection: Projection::init(
                self.hidden_size,
                self.proj_dim,
                tag_counts.len(),
                device,
            ),
            cascade: Cascade::init(
                self.positions,
                self.proj_dim,
                self.num_heads,
                &tag_counts,
                device,
            )?,
            pooling: Pooling::init(self.proj_dim, self.num_labels.ic, device),
            hidden_size: self.hidden_size,
            positions: self.positions,
        })
    }
}
