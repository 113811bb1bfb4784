//! Error types for the Campus Connect client

use thiserror::Error;

/// Result type alias for Campus Connect operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Campus Connect client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Locale code outside the supported set
    #[error("unsupported locale: {0}")]
    InvalidLocale(String),

    /// Speech capture is not usable on this host
    #[error("speech capture unavailable: {0}")]
    CaptureUnsupported(String),

    /// Query text was empty after trimming
    #[error("query is empty")]
    EmptyQuery,

    /// Transport-level failure talking to the answer service
    #[error("network error: {0}")]
    Network(String),

    /// Answer service returned an error or an unusable reply
    #[error("answer service error: {0}")]
    Service(String),

    /// No voice is mapped for the locale
    #[error("no voice mapped for locale: {0}")]
    UnsupportedVoice(String),

    /// Audio device or codec error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
