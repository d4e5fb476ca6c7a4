use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, post, web};
use chrono::Utc;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::config::{NlpConfig, ServerConfig};
use crate::error::ServiceError;
use crate::gate::InferenceGate;
use crate::nlp::analysis::{self, AnalysisResult};
use crate::nlp::engine::SpacyEngine;
use crate::nlp::skills::{ScoringConfig, SkillReport};

pub struct AppState {
    /// `None` when the model failed to load at startup; inference routes
    /// answer 503 until an operator restarts the process.
    pub engine: Option<SpacyEngine>,
    pub gate: InferenceGate,
    pub model_name: String,
    pub scoring: ScoringConfig,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub text: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    model: String,
    model_loaded: bool,
    pipeline: Vec<String>,
    timestamp: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    success: bool,
    result: AnalysisResult,
}

#[derive(Serialize)]
struct SkillsResponse {
    success: bool,
    skills: SkillReport,
}

#[get("/health")]
async fn health(data: web::Data<AppState>) -> impl Responder {
    debug!("Health check endpoint called");
    let (status, pipeline) = match &data.engine {
        Some(engine) => ("healthy", engine.pipe_names().to_vec()),
        None => ("unhealthy", Vec::new()),
    };
    HttpResponse::Ok().json(HealthResponse {
        status,
        service: "spacy-dutch-nlp",
        model: data.model_name.clone(),
        model_loaded: data.engine.is_some(),
        pipeline,
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[post("/analyze")]
async fn analyze(
    data: web::Data<AppState>,
    body: Option<web::Json<AnalyzeRequest>>,
) -> Result<HttpResponse, ServiceError> {
    let text = validate_text(body)?;
    let _guard = data.gate.try_acquire().ok_or(ServiceError::Busy)?;
    let engine = data
        .engine
        .as_ref()
        .ok_or_else(|| ServiceError::ModelUnavailable("NLP service not available".to_string()))?;

    info!("Analyzing text of length: {}", text.chars().count());
    let doc = engine.parse(&text).map_err(|e| {
        error!("Text analysis failed: {e}");
        e
    })?;
    let result = analysis::analyze(&doc, &text, engine.model_name(), &data.scoring);
    info!(
        "Text analysis completed. Found {} entities, {} skills",
        result.entities.total(),
        result.skills.total()
    );

    Ok(HttpResponse::Ok().json(AnalyzeResponse {
        success: true,
        result,
    }))
}

#[post("/skills")]
async fn skills(
    data: web::Data<AppState>,
    body: Option<web::Json<AnalyzeRequest>>,
) -> Result<HttpResponse, ServiceError> {
    let text = validate_text(body)?;
    let engine = data
        .engine
        .as_ref()
        .ok_or_else(|| ServiceError::ModelUnavailable("NLP service not available".to_string()))?;

    let doc = engine.parse(&text).map_err(|e| {
        error!("Skills extraction failed: {e}");
        e
    })?;
    let skills = SkillReport::extract(&doc, &text, &data.scoring);

    Ok(HttpResponse::Ok().json(SkillsResponse {
        success: true,
        skills,
    }))
}

fn validate_text(body: Option<web::Json<AnalyzeRequest>>) -> Result<String, ServiceError> {
    let Some(text) = body.and_then(|b| b.into_inner().text) else {
        return Err(ServiceError::Validation("No text provided".to_string()));
    };
    if text.trim().is_empty() {
        return Err(ServiceError::Validation("Empty text provided".to_string()));
    }
    Ok(text)
}

async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Endpoint not found"
    }))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(analyze)
        .service(skills)
        .default_service(web::route().to(not_found));
}

pub async fn run_server(server: ServerConfig, nlp: NlpConfig) -> std::io::Result<()> {
    info!("Starting spaCy Dutch NLP service");
    info!("Loading spaCy model '{}'...", nlp.model);

    let engine = match SpacyEngine::load(&nlp.model) {
        Ok(engine) => Some(engine),
        Err(e) => {
            error!("Failed to initialize NLP service: {e:#}");
            error!("Serving in degraded mode; analysis routes will return 503");
            None
        }
    };

    let state = web::Data::new(AppState {
        engine,
        gate: InferenceGate::new(),
        model_name: nlp.model.clone(),
        scoring: ScoringConfig::default(),
    });

    info!("Starting HTTP server on {}:{}", server.host, server.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10MB
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
