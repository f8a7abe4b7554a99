use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{backend::Backend, Tensor},
};

/// Pools the final tag level back into the IC branch with a low-rank bilinear fusion
#[derive(Module, Debug)]
pub struct Pooling<B: Backend> {
    /// Linear layer from the projection dimension to the intent classes
    pub output: Linear<B>,
}

impl<B: Backend> Pooling<B> {
    /// Create the pooling head
    pub fn init(proj_dim: usize, n_intents: usize, device: &B::Device) -> Self {
        Self {
            output: LinearConfig::new(proj_dim, n_intents).init(device),
        }
    }

    /// Produce intent logits of shape [batch_size, n_intents]
    pub fn forward(&self, ic: Tensor<B, 3>, last_ner: Tensor<B, 3>) -> Tensor<B, 2> {
        let ic = ic.mean_dim(2); // [batch_size, positions, 1]
        let last_ner = last_ner.mean_dim(1); // [batch_size, 1, proj_dim]

        let pooled = ic
            .matmul(last_ner) // [batch_size, positions, proj_dim]
            .mean_dim(1)
            .squeeze::<2>(1); // [batch_size, proj_dim]

        self.output.forward(pooled)
    }
}
