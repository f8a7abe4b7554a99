use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{backend::Backend, Tensor},
};

/// Task-specific projections of the backbone hidden states
#[derive(Clone, Debug)]
pub struct Projected<B: Backend> {
    /// The IC projection: [batch_size, positions, proj_dim]
    pub ic: Tensor<B, 3>,

    /// One NER projection per tag level, in hierarchy order: [batch_size, positions, proj_dim]
    pub ner: Vec<Tensor<B, 3>>,
}

/// Independent linear maps from the backbone hidden size to the projection dimension, one for IC
/// and one for each tag level
#[derive(Module, Debug)]
pub struct Projection<B: Backend> {
    /// Linear layer for the IC branch
    pub ic: Linear<B>,

    /// Linear layers for each tag level, indexed by hierarchy position
    pub ner: Vec<Linear<B>>,
}

impl<B: Backend> Projection<B> {
    /// Create a projection layer for the given number of tag levels
    pub fn init(hidden_size: usize, proj_dim: usize, levels: usize, device: &B::Device) -> Self {
        Self {
            ic: LinearConfig::new(hidden_size, proj_dim).init(device),
            ner: (0..levels)
                .map(|_| LinearConfig::new(hidden_size, proj_dim).init(device))
                .collect(),
        }
    }

    /// Project hidden states of shape [batch_size, positions, hidden_size]
    pub fn forward(&self, hidden_states: Tensor<B, 3>) -> Projected<B> {
        let ner = self
            .ner
            .iter()
            .map(|linear| linear.forward(hidden_states.clone()))
            .collect();

        Projected {
            ic: self.ic.forward(hidden_states),
            ner,
        }
    }
}
