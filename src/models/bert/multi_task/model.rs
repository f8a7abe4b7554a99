use std::path::PathBuf;

use bert_burn::{
    data::BertInferenceBatch,
    model::{BertModel, BertModelConfig, BertModelOutput},
};
use burn::{module::Module, tensor::backend::Backend};

use crate::{
    pipelines::multi_task::{self, Error, Head, Infer, Output},
    utils::hugging_face::download_hf_model,
};

use super::Config;

/// BERT with multi-task IC and hierarchical NER heads
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// The base BERT model
    pub backbone: BertModel<B>,

    /// Projection, cascade and pooling heads
    pub head: Head<B>,
}

impl<B: Backend> Model<B> {
    /// Pair a backbone with heads, checking that the heads were built for it
    pub fn try_new(
        backbone: BertModel<B>,
        backbone_config: &BertModelConfig,
        head: Head<B>,
    ) -> Result<Self, Error> {
        if backbone_config.hidden_size != head.hidden_size {
            return Err(Error::HiddenSize {
                backbone: backbone_config.hidden_size,
                projection: head.hidden_size,
            });
        }

        if head.positions == 0 || head.positions > backbone_config.max_position_embeddings {
            return Err(Error::Positions {
                heads: head.positions,
                backbone: backbone_config.max_position_embeddings,
            });
        }

        Ok(Self { backbone, head })
    }

    /// Load pretrained backbone weights from a safetensors file, with freshly initialized heads
    pub fn from_pretrained(
        device: &B::Device,
        model_file: PathBuf,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let record = BertModel::from_safetensors(model_file, device, config.model.clone());
        let backbone = config.model.init(device).load_record(record);

        let head = config.head_config().init(device)?;

        log::info!("Loaded pretrained backbone {}", config.model_name);

        Ok(Self::try_new(backbone, &config.model, head)?)
    }

    /// Download the backbone weights named by the config from the Hugging Face Hub, then load them
    pub async fn download(device: &B::Device, config: &Config) -> anyhow::Result<Self> {
        let (_config_file, model_file) = download_hf_model(&config.model_name).await?;

        Self::from_pretrained(device, model_file, config)
    }

    /// Defines forward pass for inference
    pub fn forward(&self, input: Infer<B>) -> Result<Output<B>, Error> {
        let [_batch_size, positions] = input.tokens.dims();

        Error::check_dim("tokens", 1, self.head.positions, positions)?;

        let BertModelOutput { hidden_states, .. } = self.backbone.forward(BertInferenceBatch {
            tokens: input.tokens,
            mask_pad: input.mask_pad,
        });

        self.head.forward(hidden_states)
    }
}

impl<B: Backend> multi_task::Model<B> for Model<B> {
    fn positions(&self) -> usize {
        self.head.positions
    }

    fn infer(&self, input: Infer<B>) -> Result<Output<B>, Error> {
        self.forward(input)
    }
}

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher as _};
    use pretty_assertions::assert_eq;

    use crate::pipelines::multi_task::{Batcher, LabelSet, LabelSpace, Model as _, IC};

    use super::*;

    type TestBackend = NdArray;

    fn labels() -> LabelSpace {
        LabelSpace::new(
            LabelSet::from_labels(IC, &["a", "b", "c"]),
            vec![
                LabelSet::from_labels("coarse", &["O", "B-X"]),
                LabelSet::from_labels("fine", &["O", "B-Y", "I-Y"]),
            ],
        )
        .unwrap()
    }

    fn bert_config() -> BertModelConfig {
        BertModelConfig::new(2, 1, 1e-12, 16, 32, 64, 16, 1, 0.0, "bert".to_string(), 0)
            .with_max_seq_len(Some(8))
            .with_with_pooling_layer(Some(false))
    }

    fn config() -> Config {
        Config::new("tiny-bert".to_string(), bert_config(), labels())
            .with_proj_dim(8)
            .with_num_heads(2)
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let model = config().init::<TestBackend>(&device).unwrap();

        assert_eq!(model.positions(), 8);

        let batcher = Batcher::<TestBackend>::new(&labels(), 8, 0, device);
        let input: Infer<TestBackend> = batcher.batch(vec![vec![2, 5, 7, 3], vec![2, 9, 3]]);

        let output = model.infer(input).unwrap();

        assert_eq!(output.ic.dims(), [2, 3]);
        assert_eq!(output.ner.len(), 2);
        assert_eq!(output.ner[0].dims(), [2, 8, 2]);
        assert_eq!(output.ner[1].dims(), [2, 8, 3]);
    }

    #[test]
    fn test_rejects_wrong_sequence_length() {
        let device = Default::default();
        let model = config().init::<TestBackend>(&device).unwrap();

        let batcher = Batcher::<TestBackend>::new(&labels(), 6, 0, device);
        let input: Infer<TestBackend> = batcher.batch(vec![vec![2, 5, 3]]);

        assert_eq!(
            model.infer(input).unwrap_err(),
            Error::Shape {
                field: "tokens",
                dim: 1,
                expected: 8,
                found: 6
            }
        );
    }

    #[test]
    fn test_heads_must_fit_backbone() {
        let device = Default::default();
        let config = config();

        let mut wide = config.head_config();
        wide.hidden_size = 32;
        let wide = wide.init::<TestBackend>(&device).unwrap();
        assert_eq!(
            Model::try_new(config.model.init(&device), &config.model, wide).unwrap_err(),
            Error::HiddenSize {
                backbone: 16,
                projection: 32
            }
        );

        let mut long = config.head_config();
        long.positions = 32;
        let long = long.init::<TestBackend>(&device).unwrap();
        assert_eq!(
            Model::try_new(config.model.init(&device), &config.model, long).unwrap_err(),
            Error::Positions {
                heads: 32,
                backbone: 16
            }
        );
    }
}
