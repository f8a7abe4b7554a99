use bert_burn::model::BertModelConfig;
use burn::{config::Config as _, tensor::backend::Backend};

use crate::{
    pipelines::multi_task::{Error, HeadConfig, LabelSpace},
    utils::hugging_face::resolve_hf_config,
};

use super::Model;

/// Overrides applied on top of a pretrained backbone configuration
#[derive(burn::config::Config)]
pub struct Options {
    /// Dimension of the task-specific projections
    #[config(default = 128)]
    pub proj_dim: usize,

    /// Number of heads in each cross-attention module
    #[config(default = 4)]
    pub num_heads: usize,

    /// Backbone dropout
    #[config(default = 0.1)]
    pub hidden_dropout_prob: f64,

    /// Backbone layer normalization epsilon
    #[config(default = 1e-7)]
    pub layer_norm_eps: f64,

    /// Number of positions every sequence is padded to, defaulting to the backbone's maximum
    pub max_seq_len: Option<usize>,
}

/// The Model Configuration
#[derive(burn::config::Config)]
pub struct Config {
    /// The backbone name on the Hugging Face Hub, or a local model directory
    pub model_name: String,

    /// The base BERT config
    pub model: BertModelConfig,

    /// Intent labels and the tag hierarchy
    pub labels: LabelSpace,

    /// Dimension of the task-specific projections
    #[config(default = 128)]
    pub proj_dim: usize,

    /// Number of heads in each cross-attention module
    #[config(default = 4)]
    pub num_heads: usize,
}

impl Config {
    /// Load the backbone configuration for a pretrained model and attach the task labels
    pub async fn load_pretrained(
        model_name: &str,
        labels: LabelSpace,
        options: &Options,
    ) -> anyhow::Result<Self> {
        labels.validate()?;

        let config_file = resolve_hf_config(model_name).await?;

        let mut bert_config = BertModelConfig::load(config_file)
            .map_err(|e| anyhow!("Unable to load Hugging Face Config file: {}", e))?;

        // The heads read the hidden states directly, so the pooler is never used
        bert_config.with_pooling_layer = Some(false);
        bert_config.hidden_dropout_prob = options.hidden_dropout_prob;
        bert_config.layer_norm_eps = options.layer_norm_eps;

        if options.max_seq_len.is_some() {
            bert_config.max_seq_len = options.max_seq_len;
        }

        let config = Config::new(model_name.to_string(), bert_config, labels)
            .with_proj_dim(options.proj_dim)
            .with_num_heads(options.num_heads);

        log::info!(
            "Configured {} with {} positions and {} tag levels",
            model_name,
            config.positions(),
            config.labels.levels.len()
        );

        Ok(config)
    }

    /// Number of positions every input sequence is padded to
    pub fn positions(&self) -> usize {
        self.model
            .max_seq_len
            .unwrap_or(self.model.max_position_embeddings)
    }

    /// The configuration of the multi-task heads on top of the backbone
    pub fn head_config(&self) -> HeadConfig {
        HeadConfig::new(
            self.model.hidden_size,
            self.positions(),
            self.labels.tags(),
            self.labels.counts(),
        )
        .with_proj_dim(self.proj_dim)
        .with_num_heads(self.num_heads)
    }

    /// Initializes a model with default weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Model<B>, Error> {
        let head = self.head_config().init(device)?;

        Model::try_new(self.model.init(device), &self.model, head)
    }
}
