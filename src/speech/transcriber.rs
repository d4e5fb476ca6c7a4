use anyhow::{Result, anyhow};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::config::WhisperConfig;
use crate::speech::normalize::{RawSegment, RawTranscription, RawWord};

pub const SUPPORTED_LANGUAGES: &[&str] = &["nl", "en", "de", "fr", "es"];

/// One second at the model's 16 kHz input rate.
const MIN_SAMPLES: usize = 16000;

pub struct TranscribeOptions {
    pub language: String,
    pub translate: bool,
    pub word_timestamps: bool,
    pub initial_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageDetection {
    pub detected_language: String,
    pub confidence: f32,
    pub top_languages: Vec<(String, f32)>,
    pub all_probabilities: HashMap<String, f32>,
}

pub struct WhisperTranscriber {
    ctx: Mutex<WhisperContext>,
    config: WhisperConfig,
}

impl WhisperTranscriber {
    /// Loads the ggml model once; the context lives for the process.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        whisper_rs::install_whisper_log_trampoline();

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(config.use_gpu);

        let model_path = config.model_path();
        let path_str = model_path
            .to_str()
            .ok_or_else(|| anyhow!("Model path is not valid UTF-8: {}", model_path.display()))?;
        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| anyhow!("Failed to load model {}: {}", model_path.display(), e))?;

        info!(
            "Whisper model '{}' loaded from {}",
            config.model,
            model_path.display()
        );
        Ok(Self {
            ctx: Mutex::new(ctx),
            config,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.config.model
    }

    pub fn device(&self) -> &'static str {
        if self.config.use_gpu { "gpu" } else { "cpu" }
    }

    /// Runs the model over mono 16 kHz samples. The caller holds the
    /// inference gate; the internal mutex only protects the context itself.
    pub fn transcribe(&self, samples: &[f32], opts: &TranscribeOptions) -> Result<RawTranscription> {
        if samples.len() < MIN_SAMPLES {
            return Err(anyhow!("Audio is too short (less than 1 second)"));
        }

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(&opts.language));
        params.set_translate(opts.translate);
        params.set_token_timestamps(opts.word_timestamps);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_no_speech_thold(self.config.no_speech_threshold);
        params.set_n_threads(self.config.num_threads);
        if let Some(prompt) = opts.initial_prompt.as_deref() {
            params.set_initial_prompt(prompt);
        }

        let ctx = self
            .ctx
            .lock()
            .map_err(|_| anyhow!("Whisper context lock poisoned"))?;
        let mut state = ctx
            .create_state()
            .map_err(|e| anyhow!("Failed to create whisper state: {e}"))?;
        state
            .full(params, samples)
            .map_err(|e| anyhow!("Failed to run transcription: {e}"))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| anyhow!("Failed to get segment count: {e}"))?;

        let mut combined = String::new();
        let mut segments = Vec::with_capacity(num_segments as usize);
        for i in 0..num_segments {
            let Ok(text) = state.full_get_segment_text(i) else {
                warn!("Segment {i} is unreadable, skipping");
                segments.push(None);
                continue;
            };
            let start = state.full_get_segment_t0(i).ok().map(centiseconds);
            let end = state.full_get_segment_t1(i).ok().map(centiseconds);
            let avg_logprob = segment_avg_logprob(&state, i);
            let words = if opts.word_timestamps {
                segment_words(&state, i)
            } else {
                None
            };
            combined.push_str(&text);
            segments.push(Some(RawSegment {
                start,
                end,
                text: Some(text),
                avg_logprob,
                words,
            }));
        }

        Ok(RawTranscription {
            text: Some(combined),
            language: Some(opts.language.clone()),
            segments: Some(segments),
        })
    }

    /// Language probabilities over the first model window of the audio.
    pub fn detect_language(&self, samples: &[f32]) -> Result<LanguageDetection> {
        if samples.len() < MIN_SAMPLES {
            return Err(anyhow!("Audio is too short (less than 1 second)"));
        }

        let threads = self.config.num_threads.max(1) as usize;
        let ctx = self
            .ctx
            .lock()
            .map_err(|_| anyhow!("Whisper context lock poisoned"))?;
        let mut state = ctx
            .create_state()
            .map_err(|e| anyhow!("Failed to create whisper state: {e}"))?;
        state
            .pcm_to_mel(samples, threads)
            .map_err(|e| anyhow!("Failed to compute mel spectrogram: {e}"))?;
        let (_, probs) = state
            .lang_detect(0, threads)
            .map_err(|e| anyhow!("Language detection failed: {e}"))?;

        let mut ranked: Vec<(String, f32)> = probs
            .iter()
            .enumerate()
            .filter_map(|(id, p)| {
                whisper_rs::get_lang_str(id as i32).map(|lang| (lang.to_string(), *p))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let (detected_language, confidence) = ranked
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("Model returned no language probabilities"))?;

        Ok(LanguageDetection {
            detected_language,
            confidence,
            top_languages: ranked.iter().take(3).cloned().collect(),
            all_probabilities: ranked.into_iter().collect(),
        })
    }
}

fn centiseconds(t: i64) -> f64 {
    t as f64 / 100.0
}

fn segment_avg_logprob(state: &whisper_rs::WhisperState, segment: i32) -> Option<f32> {
    let n_tokens = state.full_n_tokens(segment).ok()?;
    if n_tokens == 0 {
        return None;
    }
    let mut sum = 0.0_f32;
    for token in 0..n_tokens {
        sum += state.full_get_token_data(segment, token).ok()?.plog;
    }
    Some(sum / n_tokens as f32)
}

fn segment_words(state: &whisper_rs::WhisperState, segment: i32) -> Option<Vec<RawWord>> {
    let n_tokens = state.full_n_tokens(segment).ok()?;
    let mut words = Vec::new();
    for token in 0..n_tokens {
        let Ok(text) = state.full_get_token_text(segment, token) else {
            continue;
        };
        // Timestamp and marker tokens are not words.
        if text.starts_with("[_") || text.starts_with("<|") {
            continue;
        }
        let data = state.full_get_token_data(segment, token).ok()?;
        words.push(RawWord {
            word: Some(text),
            start: Some(centiseconds(data.t0)),
            end: Some(centiseconds(data.t1)),
            probability: Some(data.p),
        });
    }
    Some(words)
}
