use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use cv_services::cli::{Cli, Commands};
use cv_services::config::{
    self, DEFAULT_NLP_PORT, DEFAULT_SPEECH_PORT, NlpConfig, ServerConfig, WhisperConfig,
};
use cv_services::{client, download, nlp, speech};

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::ServeNlp { host, port, model } => {
            let mut server = ServerConfig::from_env(DEFAULT_NLP_PORT);
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            let mut nlp_config = NlpConfig::default();
            if let Some(model) = model {
                nlp_config.model = model;
            }
            nlp::server::run_server(server, nlp_config).await?;
        }
        Commands::ServeSpeech { host, port, model } => {
            let mut server = ServerConfig::from_env(DEFAULT_SPEECH_PORT);
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            let mut whisper = WhisperConfig::default();
            if let Some(model) = model {
                whisper.model = model;
            }
            speech::server::run_server(server, whisper).await?;
        }
        Commands::Download { model, dir } => {
            let dir = dir
                .map(PathBuf::from)
                .unwrap_or_else(|| WhisperConfig::default().model_dir);
            let path = download::download_model(&model, &dir).await?;
            println!("Model ready at {}", path.display());
            println!("You can now start the service:");
            println!("  $ cv-services serve-speech --model {model}");
        }
        Commands::Analyze {
            text_file,
            server_url,
        } => client::run_analyze(&server_url, &text_file, false).await?,
        Commands::Skills {
            text_file,
            server_url,
        } => client::run_analyze(&server_url, &text_file, true).await?,
        Commands::Transcribe {
            audio_file,
            server_url,
            language,
            no_word_timestamps,
        } => client::run_transcribe(&server_url, &audio_file, &language, !no_word_timestamps).await?,
        Commands::DetectLanguage {
            audio_file,
            server_url,
        } => client::run_detect_language(&server_url, &audio_file).await?,
    }

    Ok(())
}

fn init_logging() {
    // RUST_LOG wins when set; DEBUG=true only raises the default level.
    let default_level = if config::debug_enabled() {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}
