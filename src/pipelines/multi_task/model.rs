use burn::tensor::backend::Backend;

use super::{batcher::Infer, Error, Output};

/// A trait for models that can be used in the multi-task pipeline
pub trait Model<B: Backend> {
    /// The number of positions every input sequence must have
    fn positions(&self) -> usize;

    /// Defines forward pass for inference, returning intent logits and tag logits per level
    fn infer(&self, input: Infer<B>) -> Result<Output<B>, Error>;
}
