use anyhow::{Context, Result, anyhow};
use log::info;
use std::path::{Path, PathBuf};

pub const AVAILABLE_MODELS: &[&str] = &[
    "tiny",
    "tiny.en",
    "base",
    "base.en",
    "small",
    "small.en",
    "medium",
    "medium.en",
    "large-v1",
    "large-v2",
    "large-v3",
    "large-v3-turbo",
];

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

pub fn list_available_models() -> String {
    let mut output = String::from("Available models:");
    for model in AVAILABLE_MODELS {
        output.push(' ');
        output.push_str(model);
    }
    output
}

pub fn validate_model(model: &str) -> Result<()> {
    if AVAILABLE_MODELS.contains(&model) {
        Ok(())
    } else {
        Err(anyhow!("Invalid model: {}\n{}", model, list_available_models()))
    }
}

pub fn model_file(dir: &Path, model: &str) -> PathBuf {
    dir.join(format!("ggml-{model}.bin"))
}

pub async fn download_model(model: &str, dir: &Path) -> Result<PathBuf> {
    validate_model(model)?;

    let path = model_file(dir, model);
    if path.exists() {
        info!(
            "Model '{}' already exists at {}. Skipping download.",
            model,
            path.display()
        );
        return Ok(path);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create model directory")?;
    }

    let url = format!("{MODEL_BASE_URL}/ggml-{model}.bin");
    info!("Downloading ggml model '{model}' from {url}");

    let response = reqwest::get(&url)
        .await
        .context("Failed to reach model repository")?;
    if !response.status().is_success() {
        return Err(anyhow!("Download failed: HTTP {}", response.status()));
    }
    let bytes = response
        .bytes()
        .await
        .context("Failed to read model download")?;

    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Model '{}' saved to {}", model, path.display());
    Ok(path)
}
