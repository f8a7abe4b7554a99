/// Projection of backbone hidden states into task spaces
pub mod projection;

/// IC to NER cross-attention cascade over the tag hierarchy
pub mod cascade;

/// NER to IC pooling
pub mod pooling;

pub use cascade::{Cascade, CascadeOutput};
pub use pooling::Pooling;
pub use projection::{Projected, Projection};

use burn::{
    module::Module,
    tensor::{backend::Backend, Tensor},
};

use super::{Error, Output};

/// The multi-task heads: projection, then the IC to NER cascade, then NER to IC pooling
#[derive(Module, Debug)]
pub struct Head<B: Backend> {
    /// Task-specific projections
    pub projection: Projection<B>,

    /// IC to NER information sharing
    pub cascade: Cascade<B>,

    /// NER to IC information sharing
    pub pooling: Pooling<B>,

    /// The backbone hidden size the projections were built for
    pub hidden_size: usize,

    /// The number of positions the IC reshape was built for
    pub positions: usize,
}

impl<B: Backend> Head<B> {
    /// Run the heads over backbone hidden states of shape [batch_size, positions, hidden_size]
    pub fn forward(&self, hidden_states: Tensor<B, 3>) -> Result<Output<B>, Error> {
        let [_batch_size, positions, hidden_size] = hidden_states.dims();

        Error::check_dim("hidden_states", 1, self.positions, positions)?;
        Error::check_dim("hidden_states", 2, self.hidden_size, hidden_size)?;

        let projected = self.projection.forward(hidden_states);

        let CascadeOutput { ner, last } = self.cascade.forward(&projected)?;

        let ic = self.pooling.forward(projected.ic, last);

        Ok(Output { ic, ner })
    }

    /// The number of tag levels
    pub fn levels(&self) -> usize {
        self.projection.ner.len()
    }
}
