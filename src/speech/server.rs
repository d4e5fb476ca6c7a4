use actix_cors::Cors;
use actix_multipart::{Field, Multipart};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, post, web};
use chrono::Utc;
use futures_util::TryStreamExt;
use log::{debug, error, info};
use serde::Serialize;

use crate::audio;
use crate::config::{ServerConfig, WhisperConfig};
use crate::error::ServiceError;
use crate::gate::InferenceGate;
use crate::speech::normalize::{self, ProcessingInfo, TranscriptionResult};
use crate::speech::transcriber::{
    LanguageDetection, SUPPORTED_LANGUAGES, TranscribeOptions, WhisperTranscriber,
};

pub struct AppState {
    /// `None` when the model failed to load at startup; inference routes
    /// answer 503 until an operator restarts the process.
    pub transcriber: Option<WhisperTranscriber>,
    pub gate: InferenceGate,
    pub model_name: String,
    pub device: &'static str,
}

impl AppState {
    pub fn new(transcriber: Option<WhisperTranscriber>, config: &WhisperConfig) -> Self {
        Self {
            transcriber,
            gate: InferenceGate::new(),
            model_name: config.model.clone(),
            device: if config.use_gpu { "gpu" } else { "cpu" },
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    model: String,
    device: &'static str,
    model_loaded: bool,
    multilingual: bool,
    supported_languages: &'static [&'static str],
    timestamp: String,
}

#[derive(Serialize)]
struct TranscribeResponse {
    success: bool,
    result: TranscriptionResult,
}

#[derive(Serialize)]
struct DetectLanguageResponse {
    success: bool,
    result: LanguageDetection,
}

#[get("/health")]
async fn health(data: web::Data<AppState>) -> impl Responder {
    debug!("Health check endpoint called");
    HttpResponse::Ok().json(HealthResponse {
        status: if data.transcriber.is_some() {
            "healthy"
        } else {
            "unhealthy"
        },
        service: "whisper-speech-to-text",
        model: data.model_name.clone(),
        device: data.device,
        model_loaded: data.transcriber.is_some(),
        multilingual: !data.model_name.ends_with(".en"),
        supported_languages: SUPPORTED_LANGUAGES,
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[get("/models")]
async fn models(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "available_models": crate::download::AVAILABLE_MODELS,
        "current_model": data.model_name,
        "model_info": {
            "tiny":   {"size": "39M",   "speed": "~10x", "vram": "~1GB"},
            "base":   {"size": "74M",   "speed": "~7x",  "vram": "~1GB"},
            "small":  {"size": "244M",  "speed": "~4x",  "vram": "~2GB"},
            "medium": {"size": "769M",  "speed": "~2x",  "vram": "~5GB"},
            "large":  {"size": "1550M", "speed": "1x",   "vram": "~10GB"},
            "turbo":  {"size": "809M",  "speed": "~8x",  "vram": "~6GB"},
        },
    }))
}

struct TranscribeUpload {
    audio: Option<Vec<u8>>,
    language: String,
    task: String,
    word_timestamps: bool,
    initial_prompt: Option<String>,
}

#[post("/transcribe")]
async fn transcribe(
    data: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    debug!("Transcription request received");
    let upload = read_transcribe_request(payload).await?;

    let audio_bytes = upload
        .audio
        .ok_or_else(|| ServiceError::Validation("No audio file provided".to_string()))?;
    if !SUPPORTED_LANGUAGES.contains(&upload.language.as_str()) {
        return Err(ServiceError::Validation(format!(
            "Unsupported language: {}",
            upload.language
        )));
    }
    let translate = match upload.task.as_str() {
        "transcribe" => false,
        "translate" => true,
        other => {
            return Err(ServiceError::Validation(format!(
                "Unsupported task: {other}"
            )));
        }
    };

    info!(
        "Processing audio upload: {} bytes, language={}, task={}",
        audio_bytes.len(),
        upload.language,
        upload.task
    );
    let samples = decode_and_prepare(&audio_bytes)?;

    let _guard = data.gate.try_acquire().ok_or(ServiceError::Busy)?;
    let transcriber = data.transcriber.as_ref().ok_or_else(|| {
        ServiceError::ModelUnavailable("Speech service not available".to_string())
    })?;

    let opts = TranscribeOptions {
        language: upload.language,
        translate,
        word_timestamps: upload.word_timestamps,
        initial_prompt: upload.initial_prompt,
    };
    let raw = transcriber.transcribe(&samples, &opts).map_err(|e| {
        error!("Transcription failed: {e}");
        ServiceError::Inference(e.to_string())
    })?;

    let result = normalize::normalize(
        raw,
        &opts.language,
        ProcessingInfo {
            model: transcriber.model_name().to_string(),
            device: transcriber.device().to_string(),
            task: upload.task,
            word_timestamps: opts.word_timestamps,
            timestamp: Utc::now().to_rfc3339(),
        },
    );
    info!(
        "Transcription completed: {} segments, {} characters",
        result.segments.len(),
        result.text.len()
    );

    Ok(HttpResponse::Ok().json(TranscribeResponse {
        success: true,
        result,
    }))
}

#[post("/detect-language")]
async fn detect_language(
    data: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    debug!("Language detection request received");

    let mut audio_bytes: Option<Vec<u8>> = None;
    while let Some(field) = payload.try_next().await.unwrap_or(None) {
        if field.name() == Some("audio") {
            match read_field_data(field).await {
                Ok(bytes) => audio_bytes = Some(bytes),
                Err(e) => {
                    error!("Failed to read audio data: {e}");
                    return Err(ServiceError::Validation(
                        "Failed to read audio data".to_string(),
                    ));
                }
            }
        }
    }

    let audio_bytes = audio_bytes
        .ok_or_else(|| ServiceError::Validation("No audio file provided".to_string()))?;
    let samples = decode_and_prepare(&audio_bytes)?;

    let transcriber = data.transcriber.as_ref().ok_or_else(|| {
        ServiceError::ModelUnavailable("Speech service not available".to_string())
    })?;
    let result = transcriber.detect_language(&samples).map_err(|e| {
        error!("Language detection failed: {e}");
        ServiceError::Inference(e.to_string())
    })?;
    info!(
        "Detected language '{}' with confidence {:.3}",
        result.detected_language, result.confidence
    );

    Ok(HttpResponse::Ok().json(DetectLanguageResponse {
        success: true,
        result,
    }))
}

async fn read_transcribe_request(mut payload: Multipart) -> Result<TranscribeUpload, ServiceError> {
    let mut upload = TranscribeUpload {
        audio: None,
        language: "nl".to_string(),
        task: "transcribe".to_string(),
        word_timestamps: true,
        initial_prompt: None,
    };

    while let Some(field) = payload.try_next().await.unwrap_or(None) {
        match field.name() {
            Some("audio") => match read_field_data(field).await {
                Ok(bytes) => {
                    debug!("Audio data received: {} bytes", bytes.len());
                    upload.audio = Some(bytes);
                }
                Err(e) => {
                    error!("Failed to read audio data: {e}");
                    return Err(ServiceError::Validation(
                        "Failed to read audio data".to_string(),
                    ));
                }
            },
            Some("language") => {
                if let Some(text) = read_text_field(field).await {
                    upload.language = text;
                }
            }
            Some("task") => {
                if let Some(text) = read_text_field(field).await {
                    upload.task = text;
                }
            }
            Some("word_timestamps") => {
                if let Some(text) = read_text_field(field).await {
                    upload.word_timestamps = text.eq_ignore_ascii_case("true");
                }
            }
            Some("initial_prompt") => {
                if let Some(text) = read_text_field(field).await {
                    if !text.is_empty() {
                        upload.initial_prompt = Some(text);
                    }
                }
            }
            _ => continue,
        }
    }

    Ok(upload)
}

async fn read_field_data(mut field: Field) -> Result<Vec<u8>, actix_web::Error> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        data.extend_from_slice(&chunk);
    }
    debug!("Read field data: {} bytes", data.len());
    Ok(data)
}

async fn read_text_field(field: Field) -> Option<String> {
    let bytes = read_field_data(field).await.ok()?;
    String::from_utf8(bytes).ok().map(|s| s.trim().to_string())
}

fn decode_and_prepare(bytes: &[u8]) -> Result<Vec<f32>, ServiceError> {
    let wav = audio::decode_wav(bytes).map_err(ServiceError::Validation)?;
    let resampled = audio::resample_to_16khz(&wav.samples, wav.sample_rate, wav.channels)
        .map_err(|e| ServiceError::Validation(e.to_string()))?;
    Ok(audio::downmix_to_mono(&resampled, wav.channels))
}

async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Endpoint not found"
    }))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(models)
        .service(transcribe)
        .service(detect_language)
        .default_service(web::route().to(not_found));
}

pub async fn run_server(server: ServerConfig, whisper: WhisperConfig) -> std::io::Result<()> {
    info!("Starting Whisper speech-to-text service");
    info!(
        "Loading Whisper model '{}' from {}...",
        whisper.model,
        whisper.model_path().display()
    );

    let transcriber = match WhisperTranscriber::new(whisper.clone()) {
        Ok(transcriber) => Some(transcriber),
        Err(e) => {
            error!("Failed to initialize transcriber: {e:#}");
            error!("Serving in degraded mode; transcription routes will return 503");
            None
        }
    };

    let state = web::Data::new(AppState::new(transcriber, &whisper));

    info!("Starting HTTP server on {}:{}", server.host, server.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(
                actix_multipart::form::MultipartFormConfig::default()
                    .total_limit(100 * 1024 * 1024), // 100MB
            )
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes)
    })
    .bind((server.host.as_str(), server.port))?
    .run()
    .await
}
