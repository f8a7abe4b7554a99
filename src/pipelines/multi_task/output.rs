use burn::tensor::{backend::Backend, Int, Tensor};
use derive_new::new;

/// Multi-task model output
#[derive(Clone, Debug, new)]
pub struct Output<B: Backend> {
    /// Intent logits: [batch_size, n_intents]
    pub ic: Tensor<B, 2>,

    /// Tag logits for each tag level, in hierarchy order: [batch_size, positions, n_tags]
    pub ner: Vec<Tensor<B, 3>>,
}

/// Arg-max label ids taken from an [`Output`]
#[derive(Clone, Debug)]
pub struct Predictions<B: Backend> {
    /// Intent ids: [batch_size]
    pub ic: Tensor<B, 1, Int>,

    /// Tag ids for each tag level: [batch_size, positions]
    pub ner: Vec<Tensor<B, 2, Int>>,
}

impl<B: Backend> Output<B> {
    /// Take the highest scoring intent per example and tag per position
    pub fn argmax(&self) -> Predictions<B> {
        Predictions {
            ic: self.ic.clone().argmax(1).squeeze(1),
            ner: self
                .ner
                .iter()
                .map(|logits| logits.clone().argmax(2).squeeze(2))
                .collect(),
        }
    }
}
