use anyhow::{Result, anyhow};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub async fn check_server_health(server_url: &str) -> Result<()> {
    let client = reqwest::Client::new();

    println!("🔍 Checking server health at: {server_url}/health");

    let response = client
        .get(format!("{server_url}/health"))
        .send()
        .await
        .map_err(|e| anyhow!("Failed to connect to server: {}", e))?;

    if response.status().is_success() {
        println!("✅ Server is reachable");
        Ok(())
    } else {
        Err(anyhow!("Server health check failed: {}", response.status()))
    }
}

async fn parse_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| anyhow!("Failed to read response: {}", e))?;

    if !status.is_success() {
        return Err(anyhow!("Server returned error {}: {}", status, body));
    }

    serde_json::from_str(&body).map_err(|e| anyhow!("Failed to parse JSON response: {}", e))
}

async fn post_text(server_url: &str, route: &str, text_file: &str) -> Result<Value> {
    if !Path::new(text_file).exists() {
        return Err(anyhow!("Text file not found: {}", text_file));
    }
    let text =
        fs::read_to_string(text_file).map_err(|e| anyhow!("Failed to read text file: {}", e))?;

    println!("📄 Text source: {} ({} characters)", text_file, text.chars().count());
    println!("🚀 Sending request to: {server_url}{route}");

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{server_url}{route}"))
        .json(&serde_json::json!({ "text": text }))
        .send()
        .await
        .map_err(|e| anyhow!("Failed to send request: {}", e))?;

    parse_response(response).await
}

async fn post_audio(
    server_url: &str,
    route: &str,
    audio_file: &str,
    extra_fields: Vec<(&'static str, String)>,
) -> Result<Value> {
    if !Path::new(audio_file).exists() {
        return Err(anyhow!("Audio file not found: {}", audio_file));
    }
    let audio_data =
        fs::read(audio_file).map_err(|e| anyhow!("Failed to read audio file: {}", e))?;

    println!("📁 Audio source: {} ({} bytes)", audio_file, audio_data.len());
    println!("🚀 Sending request to: {server_url}{route}");

    let mut form = reqwest::multipart::Form::new().part(
        "audio",
        reqwest::multipart::Part::bytes(audio_data).file_name(audio_file.to_string()),
    );
    for (name, value) in extra_fields {
        form = form.text(name, value);
    }

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{server_url}{route}"))
        .multipart(form)
        .send()
        .await
        .map_err(|e| anyhow!("Failed to send request: {}", e))?;

    parse_response(response).await
}

fn print_result(result: &Value) -> Result<()> {
    println!("\n✅ Request completed!");
    println!("📝 Result:");
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

pub async fn run_analyze(server_url: &str, text_file: &str, skills_only: bool) -> Result<()> {
    check_server_health(server_url).await.map_err(|e| {
        eprintln!("💡 Make sure the NLP service is running: cv-services serve-nlp");
        e
    })?;
    let route = if skills_only { "/skills" } else { "/analyze" };
    let result = post_text(server_url, route, text_file).await?;
    print_result(&result)
}

pub async fn run_transcribe(
    server_url: &str,
    audio_file: &str,
    language: &str,
    word_timestamps: bool,
) -> Result<()> {
    check_server_health(server_url).await.map_err(|e| {
        eprintln!("💡 Make sure the speech service is running: cv-services serve-speech");
        e
    })?;
    let fields = vec![
        ("language", language.to_string()),
        ("word_timestamps", word_timestamps.to_string()),
    ];
    let result = post_audio(server_url, "/transcribe", audio_file, fields).await?;
    print_result(&result)
}

pub async fn run_detect_language(server_url: &str, audio_file: &str) -> Result<()> {
    check_server_health(server_url).await.map_err(|e| {
        eprintln!("💡 Make sure the speech service is running: cv-services serve-speech");
        e
    })?;
    let result = post_audio(server_url, "/detect-language", audio_file, Vec::new()).await?;
    print_result(&result)
}
