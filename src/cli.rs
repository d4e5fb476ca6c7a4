use clap::{Parser, Subcommand};

use crate::speech::transcriber::SUPPORTED_LANGUAGES;

#[derive(Parser)]
#[command(
    name = "cv-services",
    about = "Dutch CV analysis services - text analysis and speech transcription",
    long_about = "Two JSON-over-HTTP microservices behind one binary: a Dutch NLP service (entity, skill and sentiment extraction over text) and a speech-to-text service (audio transcription and language detection), plus client commands for talking to a running instance.",
    after_help = "EXAMPLES:\n    # Start the NLP service on the default port (5001)\n    cv-services serve-nlp\n\n    # Start the speech service on a custom port\n    cv-services serve-speech --port 8000\n\n    # Download a Whisper model into ./models\n    cv-services download base\n\n    # Analyze a CV text file against a running NLP service\n    cv-services analyze cv.txt\n\n    # Transcribe a WAV recording\n    cv-services transcribe interview.wav --language nl"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Dutch NLP analysis service
    #[command(name = "serve-nlp")]
    ServeNlp {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// spaCy pipeline package name
        #[arg(long)]
        model: Option<String>,
    },
    /// Start the speech-to-text service
    #[command(name = "serve-speech")]
    ServeSpeech {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// Whisper model size, e.g. base or large-v3
        #[arg(long)]
        model: Option<String>,
    },
    /// Download a Whisper ggml model
    #[command(name = "download")]
    Download {
        model: String,

        #[arg(long)]
        dir: Option<String>,
    },
    /// Run a full analysis of a text file against a running NLP service
    #[command(name = "analyze")]
    Analyze {
        text_file: String,

        #[arg(long, default_value = "http://localhost:5001")]
        server_url: String,
    },
    /// Extract only skills from a text file
    #[command(name = "skills")]
    Skills {
        text_file: String,

        #[arg(long, default_value = "http://localhost:5001")]
        server_url: String,
    },
    /// Transcribe a WAV file against a running speech service
    #[command(name = "transcribe")]
    Transcribe {
        audio_file: String,

        #[arg(long, default_value = "http://localhost:5000")]
        server_url: String,

        #[arg(long, default_value = "nl", value_parser = validate_language)]
        language: String,

        #[arg(long)]
        no_word_timestamps: bool,
    },
    /// Detect the spoken language of a WAV file
    #[command(name = "detect-language")]
    DetectLanguage {
        audio_file: String,

        #[arg(long, default_value = "http://localhost:5000")]
        server_url: String,
    },
}

pub fn validate_language(s: &str) -> Result<String, String> {
    if SUPPORTED_LANGUAGES.contains(&s) {
        Ok(s.to_string())
    } else {
        Err(format!(
            "Unsupported language '{}'. Supported: {}",
            s,
            SUPPORTED_LANGUAGES.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_validator_accepts_supported_codes() {
        assert_eq!(validate_language("nl").unwrap(), "nl");
        assert!(validate_language("xx").is_err());
    }
}
