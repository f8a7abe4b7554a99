use std::collections::BTreeMap;

use burn::{
    data::dataloader,
    tensor::{backend::Backend, Bool, Int, Tensor},
};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::utils::tensors;

use super::{Error, LabelLayout, LabelSpace, IC};

/// An inference batch for the multi-task pipeline
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Token ids as 2D tensor: [batch_size, positions]
    pub tokens: Tensor<B, 2, Int>,

    /// Padding mask for the tokens containing booleans for padding locations
    pub mask_pad: Tensor<B, 2, Bool>,
}

/// A labeled batch for the multi-task pipeline
#[derive(Clone, Debug, new)]
pub struct Batch<B: Backend> {
    /// Model input
    pub input: Infer<B>,

    /// Stacked labels: the intent id in column 0, then one block of tag ids per tag level
    pub labels: Tensor<B, 2, Int>,
}

impl<B: Backend> Batch<B> {
    /// The number of examples in the batch
    pub fn len(&self) -> usize {
        self.input.tokens.dims()[0]
    }

    /// Whether the batch has no examples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the batch against the expected label layout
    pub fn validate(&self, layout: &LabelLayout) -> Result<(), Error> {
        let [batch_size, positions] = self.input.tokens.dims();
        let [mask_batch_size, mask_positions] = self.input.mask_pad.dims();
        let [label_batch_size, width] = self.labels.dims();

        Error::check_dim("tokens", 1, layout.positions, positions)?;
        Error::check_dim("mask_pad", 0, batch_size, mask_batch_size)?;
        Error::check_dim("mask_pad", 1, layout.positions, mask_positions)?;
        Error::check_dim("labels", 0, batch_size, label_batch_size)?;
        Error::check_dim("labels", 1, layout.width(), width)
    }
}

/// A tokenized example with its intent and per-level tags
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct Item {
    /// Token ids, including any special tokens
    pub token_ids: Vec<usize>,

    /// The intent class name
    pub intent: String,

    /// Tag names for each tag level, in hierarchy order, aligned with `token_ids`
    pub tags: Vec<Vec<String>>,
}

/// Struct for batching multi-task items
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// Number of positions every sequence is padded or truncated to
    pub positions: usize,

    /// ID of the padding token
    pub pad_token_id: usize,

    /// A mapping from intent names to intent ids
    pub intent2id: BTreeMap<String, usize>,

    /// Tag level names, in hierarchy order
    pub levels: Vec<String>,

    /// A mapping from tag names to tag ids, for each tag level
    pub tag2id: Vec<BTreeMap<String, usize>>,

    /// The tag id used to pad each tag level
    pub pad_tag_ids: Vec<usize>,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Creates a new batcher
    pub fn new(labels: &LabelSpace, positions: usize, pad_token_id: usize, device: B::Device) -> Self {
        Self {
            positions,
            pad_token_id,
            intent2id: labels.intents.label2id(),
            levels: labels.tags(),
            tag2id: labels.levels.iter().map(|level| level.label2id()).collect(),
            pad_tag_ids: labels.levels.iter().map(|level| level.outside_id()).collect(),
            device,
        }
    }

    /// The label layout of the batches this batcher produces
    pub fn layout(&self) -> LabelLayout {
        LabelLayout::new(self.positions, self.tag2id.len())
    }

    /// Build the stacked label row for an item. Unknown labels fall back to id 0 for intents and
    /// the level's padding id for tags, and are returned alongside the row as (level, label).
    fn label_row(&self, item: &Item) -> (Vec<usize>, Vec<(String, String)>) {
        let layout = self.layout();
        let mut row = Vec::with_capacity(layout.width());
        let mut unknown = Vec::new();

        row.push(match self.intent2id.get(&item.intent) {
            Some(&id) => id,
            None => {
                unknown.push((IC.to_string(), item.intent.clone()));
                0
            }
        });

        for (level, ((name, tag2id), &pad)) in self
            .levels
            .iter()
            .zip(&self.tag2id)
            .zip(&self.pad_tag_ids)
            .enumerate()
        {
            let tags = item.tags.get(level).map(Vec::as_slice).unwrap_or_default();

            let mut ids: Vec<usize> = tags
                .iter()
                .map(|tag| match tag2id.get(tag) {
                    Some(&id) => id,
                    None => {
                        unknown.push((name.clone(), tag.clone()));
                        pad
                    }
                })
                .collect();

            // Pad the tags to match the token sequence length
            ids.resize(self.positions, pad);
            row.extend(ids);
        }

        (row, unknown)
    }

    fn collate(&self, items: Vec<Item>, rows: Vec<Vec<usize>>) -> Batch<B> {
        let width = self.layout().width();

        let token_ids: Vec<Vec<usize>> = items.into_iter().map(|item| item.token_ids).collect();
        let input = <Self as dataloader::batcher::Batcher<Vec<usize>, Infer<B>>>::batch(self, token_ids);

        let labels = tensors::pad_to::<B>(0, rows, width, &self.device);

        Batch { input, labels }
    }

    /// Collects multi-task items into a labeled batch, rejecting any intent or tag that is not part
    /// of the label space
    pub fn try_batch(&self, items: Vec<Item>) -> Result<Batch<B>, Error> {
        let mut rows = Vec::with_capacity(items.len());

        for item in &items {
            let (row, unknown) = self.label_row(item);

            if let Some((level, label)) = unknown.into_iter().next() {
                return Err(Error::UnknownLabel { level, label });
            }

            rows.push(row);
        }

        Ok(self.collate(items, rows))
    }
}

/// Implement Batcher trait for Batcher struct for inference
impl<B: Backend> dataloader::batcher::Batcher<Vec<usize>, Infer<B>> for Batcher<B> {
    /// Collects a vector of token id sequences into an inference batch
    fn batch(&self, items: Vec<Vec<usize>>) -> Infer<B> {
        let tokens = tensors::pad_to::<B>(self.pad_token_id, items, self.positions, &self.device);
        let mask_pad = tokens.clone().equal_elem(self.pad_token_id as i64);

        Infer { tokens, mask_pad }
    }
}

/// Implement Batcher trait for Batcher struct for evaluation. Unknown labels are logged and
/// replaced; use [`Batcher::try_batch`] to reject them instead.
impl<B: Backend> dataloader::batcher::Batcher<Item, Batch<B>> for Batcher<B> {
    /// Collects a vector of multi-task items into a labeled batch
    fn batch(&self, items: Vec<Item>) -> Batch<B> {
        let rows = items
            .iter()
            .map(|item| {
                let (row, unknown) = self.label_row(item);

                for (level, label) in unknown {
                    log::warn!("Unknown label {} in {}, using its fallback id", label, level);
                }

                row
            })
            .collect();

        self.collate(items, rows)
    }
}
