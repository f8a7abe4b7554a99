use std::path::{Path, PathBuf};

use hf_hub::api::tokio;

/// Resolve the `config.json` for a backbone, either from a local model directory or from the
/// Hugging Face Hub. Files already in the hub cache are not downloaded again.
pub async fn resolve_hf_config(model_name: &str) -> anyhow::Result<PathBuf> {
    let local = Path::new(model_name).join("config.json");
    if local.is_file() {
        log::info!("Using local backbone config at {}", local.display());

        return Ok(local);
    }

    log::info!("Fetching backbone config for {} from the Hugging Face Hub", model_name);

    let api = tokio::Api::new()
        .map_err(|e| anyhow!("Unable to reach the Hugging Face Hub: {}", e))?;

    api.model(model_name.to_string())
        .get("config.json")
        .await
        .map_err(|e| anyhow!("Unable to resolve backbone {}: {}", model_name, e))
}

/// Download model config and weights from Hugging Face Hub
/// If file exists in cache, it will not be downloaded again
// NOTE: Modified from the built-in function to work within an already-async context
pub async fn download_hf_model(model_name: &str) -> anyhow::Result<(PathBuf, PathBuf)> {
    let api = tokio::Api::new()
        .map_err(|e| anyhow!("Unable to reach the Hugging Face Hub: {}", e))?;
    let repo = api.model(model_name.to_string());

    let model_filepath = repo.get("model.safetensors").await.map_err(|e| {
        anyhow!(
            "Failed to download: {} weights with name: model.safetensors from HuggingFace Hub: {}",
            model_name,
            e
        )
    })?;

    let config_filepath = resolve_hf_config(model_name).await?;

    Ok((config_filepath, model_filepath))
}
