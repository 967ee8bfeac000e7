//! Error types for pagespeak

use std::io;
use thiserror::Error;

/// Main error type for pagespeak
#[derive(Error, Debug)]
pub enum SpeechError {
    /// The host has no speech synthesis at all. Nothing else is safe to call.
    #[error("Speech synthesis is not supported on this host: {0}")]
    CapabilityUnsupported(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for pagespeak operations
pub type Result<T> = std::result::Result<T, SpeechError>;

impl From<serde_json::Error> for SpeechError {
    fn from(e: serde_json::Error) -> Self {
        SpeechError::Config(format!("JSON error: {}", e))
    }
}
