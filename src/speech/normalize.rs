//! Normalization layer at the speech-model boundary.
//!
//! The raw result shape is not trusted: every field is optional and segment
//! entries may be absent entirely. Normalization turns it into a well-typed
//! [`TranscriptionResult`] so nothing downstream has to re-check the model's
//! output shape.

use serde::Serialize;

pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Transcription output exactly as the model layer produced it.
#[derive(Debug, Clone, Default)]
pub struct RawTranscription {
    pub text: Option<String>,
    pub language: Option<String>,
    pub segments: Option<Vec<Option<RawSegment>>>,
}

#[derive(Debug, Clone, Default)]
pub struct RawSegment {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub text: Option<String>,
    pub avg_logprob: Option<f32>,
    pub words: Option<Vec<RawWord>>,
}

#[derive(Debug, Clone, Default)]
pub struct RawWord {
    pub word: Option<String>,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub probability: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordTiming>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingInfo {
    pub model: String,
    pub device: String,
    pub task: String,
    pub word_timestamps: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub language: String,
    pub segments: Vec<Segment>,
    pub word_count: usize,
    pub duration: f64,
    pub confidence: f64,
    pub processing_info: ProcessingInfo,
}

pub fn normalize(
    raw: RawTranscription,
    fallback_language: &str,
    processing_info: ProcessingInfo,
) -> TranscriptionResult {
    let text = raw.text.map(|t| t.trim().to_string()).unwrap_or_default();
    let language = raw
        .language
        .unwrap_or_else(|| fallback_language.to_string());

    let segments: Vec<Segment> = raw
        .segments
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(normalize_segment)
        .collect();

    let duration = segments.iter().map(|s| s.end).fold(0.0, f64::max);

    let word_probs: Vec<f64> = segments
        .iter()
        .flat_map(|s| s.words.iter().flatten())
        .filter_map(|w| w.probability)
        .collect();
    let confidence = if !word_probs.is_empty() {
        word_probs.iter().sum::<f64>() / word_probs.len() as f64
    } else if !segments.is_empty() {
        segments.iter().map(|s| s.confidence).sum::<f64>() / segments.len() as f64
    } else {
        DEFAULT_CONFIDENCE
    };

    TranscriptionResult {
        word_count: text.split_whitespace().count(),
        text,
        language,
        segments,
        duration,
        confidence,
        processing_info,
    }
}

fn normalize_segment(raw: RawSegment) -> Segment {
    let words: Option<Vec<WordTiming>> = raw
        .words
        .map(|words| words.into_iter().filter_map(normalize_word).collect());
    let confidence = segment_confidence(raw.avg_logprob, words.as_deref());
    Segment {
        start: raw.start.unwrap_or(0.0),
        end: raw.end.unwrap_or(0.0),
        text: raw.text.map(|t| t.trim().to_string()).unwrap_or_default(),
        confidence,
        words,
    }
}

fn normalize_word(raw: RawWord) -> Option<WordTiming> {
    let word = raw.word?;
    Some(WordTiming {
        word: word.trim().to_string(),
        start: raw.start.unwrap_or(0.0),
        end: raw.end.unwrap_or(0.0),
        probability: raw.probability.map(f64::from),
    })
}

/// Log-probability mapping wins when present; word probabilities are the
/// fallback, then the fixed default.
fn segment_confidence(avg_logprob: Option<f32>, words: Option<&[WordTiming]>) -> f64 {
    if let Some(logprob) = avg_logprob {
        return (f64::from(logprob) + 1.0).clamp(0.0, 1.0);
    }
    let probs: Vec<f64> = words
        .into_iter()
        .flatten()
        .filter_map(|w| w.probability)
        .collect();
    if probs.is_empty() {
        DEFAULT_CONFIDENCE
    } else {
        probs.iter().sum::<f64>() / probs.len() as f64
    }
}
