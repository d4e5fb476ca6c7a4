//! HTTP-level behavior of the NLP service in degraded (model-less) mode.

use actix_web::http::StatusCode;
use actix_web::{App, test, web};

use cv_services::gate::InferenceGate;
use cv_services::nlp::server::{AppState, routes};
use cv_services::nlp::skills::ScoringConfig;

fn degraded_state() -> web::Data<AppState> {
    web::Data::new(AppState {
        engine: None,
        gate: InferenceGate::new(),
        model_name: "nl_core_news_sm".to_string(),
        scoring: ScoringConfig::default(),
    })
}

#[actix_web::test]
async fn health_always_succeeds_and_reports_model_state() {
    let app =
        test::init_service(App::new().app_data(degraded_state()).configure(routes)).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["service"], "spacy-dutch-nlp");
    assert_eq!(body["model"], "nl_core_news_sm");
    assert_eq!(body["model_loaded"], false);
    assert!(body["pipeline"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn analyze_with_empty_text_is_400() {
    let app =
        test::init_service(App::new().app_data(degraded_state()).configure(routes)).await;
    let req = test::TestRequest::post()
        .uri("/analyze")
        .set_json(serde_json::json!({ "text": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Empty text provided");
}

#[actix_web::test]
async fn analyze_without_a_body_is_400() {
    let app =
        test::init_service(App::new().app_data(degraded_state()).configure(routes)).await;
    let resp =
        test::call_service(&app, test::TestRequest::post().uri("/analyze").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No text provided");
}

#[actix_web::test]
async fn analyze_with_whitespace_only_text_is_400() {
    let app =
        test::init_service(App::new().app_data(degraded_state()).configure(routes)).await;
    let req = test::TestRequest::post()
        .uri("/analyze")
        .set_json(serde_json::json!({ "text": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn analyze_while_gate_is_held_is_429() {
    let state = degraded_state();
    let _held = state.gate.try_acquire().unwrap();

    let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;
    let req = test::TestRequest::post()
        .uri("/analyze")
        .set_json(serde_json::json!({ "text": "python ervaring" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn analyze_without_a_model_is_503() {
    let app =
        test::init_service(App::new().app_data(degraded_state()).configure(routes)).await;
    let req = test::TestRequest::post()
        .uri("/analyze")
        .set_json(serde_json::json!({ "text": "python ervaring" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NLP service not available");
}

#[actix_web::test]
async fn skills_is_not_gated() {
    // A held gate must not affect /skills; it fails on the missing model
    // instead of reporting busy.
    let state = degraded_state();
    let _held = state.gate.try_acquire().unwrap();

    let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;
    let req = test::TestRequest::post()
        .uri("/skills")
        .set_json(serde_json::json!({ "text": "python" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn unknown_routes_return_a_json_404() {
    let app =
        test::init_service(App::new().app_data(degraded_state()).configure(routes)).await;
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/nonexistent").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Endpoint not found");
}
