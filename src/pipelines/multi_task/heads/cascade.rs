use burn::{
    module::Module,
    nn::{
        attention::{MhaInput, MhaOutput, MultiHeadAttention, MultiHeadAttentionConfig},
        Linear, LinearConfig,
    },
    tensor::{backend::Backend, Tensor},
};

use crate::pipelines::multi_task::Error;

use super::projection::Projected;

/// The result of the IC to NER cascade
#[derive(Clone, Debug)]
pub struct CascadeOutput<B: Backend> {
    /// Logits for each tag level, in hierarchy order: [batch_size, positions, n_tags]
    pub ner: Vec<Tensor<B, 3>>,

    /// The attention-updated projection of the final tag level: [batch_size, positions, proj_dim]
    pub last: Tensor<B, 3>,
}

/// Shares information from the IC branch into every tag level, and from each tag level into the
/// next one down the hierarchy
#[derive(Module, Debug)]
pub struct Cascade<B: Backend> {
    /// Maps the IC projection from positions to the tag count of each level
    pub reshape: Vec<Linear<B>>,

    /// Cross-attention from level i to level i + 1. There is one fewer module than tag levels.
    pub attention: Vec<MultiHeadAttention<B>>,
}

impl<B: Backend> Cascade<B> {
    /// Create the cascade for tag levels with the given tag counts
    pub fn init(
        positions: usize,
        proj_dim: usize,
        num_heads: usize,
        tag_counts: &[usize],
        device: &B::Device,
    ) -> Result<Self, Error> {
        if tag_counts.is_empty() {
            return Err(Error::EmptyHierarchy);
        }

        let reshape = tag_counts
            .iter()
            .map(|&n_tags| LinearConfig::new(positions, n_tags).init(device))
            .collect();

        let attention = (1..tag_counts.len())
            .map(|_| {
                MultiHeadAttentionConfig::new(proj_dim, num_heads)
                    .with_dropout(0.0)
                    .init(device)
            })
            .collect();

        Ok(Self { reshape, attention })
    }

    /// Run the cascade over the projected tensors
    pub fn forward(&self, projected: &Projected<B>) -> Result<CascadeOutput<B>, Error> {
        if self.reshape.is_empty() {
            return Err(Error::EmptyHierarchy);
        }

        Error::check_dim("ner_levels", 0, self.reshape.len(), projected.ner.len())?;
        Error::check_dim("attention", 0, self.reshape.len() - 1, self.attention.len())?;

        // [batch_size, proj_dim, positions]
        let ic = projected.ic.clone().swap_dims(1, 2);

        // One IC-derived label space per level: [batch_size, proj_dim, n_tags]
        let label_spaces = self
            .reshape
            .iter()
            .map(|linear| linear.forward(ic.clone()));

        // Level 0 is never updated, and each update feeds the next level's query
        let mut ner = projected.ner.clone();
        for (level, attention) in self.attention.iter().enumerate() {
            let query = ner[level].clone();
            let key_value = ner[level + 1].clone();

            let MhaOutput { context, .. } =
                attention.forward(MhaInput::new(query, key_value.clone(), key_value));

            ner[level + 1] = context;
        }

        let logits = ner
            .iter()
            .zip(label_spaces)
            .map(|(projection, label_space)| projection.clone().matmul(label_space))
            .collect();

        let last = ner.last().cloned().ok_or(Error::EmptyHierarchy)?;

        Ok(CascadeOutput { ner: logits, last })
    }
}
