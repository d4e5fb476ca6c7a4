use dotenv::dotenv;
use std::path::PathBuf;

pub const DEFAULT_NLP_PORT: u16 = 5001;
pub const DEFAULT_SPEECH_PORT: u16 = 5000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env(default_port: u16) -> Self {
        dotenv().ok();
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parsed("PORT", default_port),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NlpConfig {
    /// spaCy pipeline package name, e.g. `nl_core_news_sm`.
    pub model: String,
}

impl Default for NlpConfig {
    fn default() -> Self {
        dotenv().ok();
        Self {
            model: env_or("SPACY_MODEL", "nl_core_news_sm"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct WhisperConfig {
    /// Model size selector, e.g. `base` or `large-v3`.
    pub model: String,
    pub model_dir: PathBuf,
    pub use_gpu: bool,
    pub language: String,
    pub no_speech_threshold: f32,
    pub num_threads: i32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        dotenv().ok();
        Self {
            model: env_or("WHISPER_MODEL", "base"),
            model_dir: PathBuf::from(env_or("WHISPER_MODEL_DIR", "models")),
            use_gpu: env_flag("WHISPER_USE_GPU", true),
            language: env_or("WHISPER_LANGUAGE", "nl"),
            no_speech_threshold: 0.5,
            num_threads: env_parsed("WHISPER_THREADS", 2),
        }
    }
}

impl WhisperConfig {
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(format!("ggml-{}.bin", self.model))
    }
}

pub fn debug_enabled() -> bool {
    dotenv().ok();
    env_flag("DEBUG", false)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => value.eq_ignore_ascii_case("true") || value == "1",
        Err(_) => default,
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
