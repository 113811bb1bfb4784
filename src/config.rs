//! Configuration for the Campus Connect client
//!
//! Loaded from a TOML file (explicit path or the XDG config dir), then
//! overridden by environment variables. Every field has a default; the
//! only value most deployments set is the answer service base URL.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::answer::WireConfig;
use crate::locale::Locale;
use crate::{Error, Result};

/// Campus Connect client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Answer service settings
    pub answer: AnswerConfig,

    /// Speech capture and output settings
    pub voice: VoiceConfig,

    /// Locale active at startup
    pub locale: Locale,
}

/// Answer service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Base URL of the answer service (host:port)
    pub base_url: String,

    /// Request timeout; hangs surface as network failures
    pub timeout_secs: u64,

    /// Ask the service to synthesize answer audio
    pub request_audio: bool,

    /// Wire dialect of this deployment
    pub wire: WireConfig,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 15,
            request_audio: true,
            wire: WireConfig::default(),
        }
    }
}

/// Speech capture and output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Enable microphone capture and spoken output
    pub enabled: bool,

    /// Transcription endpoint (Whisper-compatible)
    pub stt_url: String,

    /// STT model identifier
    pub stt_model: String,

    /// Synthesis endpoint
    pub tts_url: String,

    /// TTS model identifier
    pub tts_model: String,

    /// TTS speed multiplier
    pub tts_speed: f32,

    /// API key for the speech endpoints, when they require one
    pub api_key: Option<String>,

    /// Locale to voice-tag table for text-to-speech
    pub voices: HashMap<Locale, String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_url: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_url: "https://api.openai.com/v1/audio/speech".to_string(),
            tts_model: "tts-1".to_string(),
            tts_speed: 1.0,
            api_key: None,
            voices: default_voices(),
        }
    }
}

/// The fixed default locale-to-voice table
#[must_use]
pub fn default_voices() -> HashMap<Locale, String> {
    [
        (Locale::En, "en-US"),
        (Locale::Hi, "hi-IN"),
        (Locale::Te, "te-IN"),
        (Locale::Kn, "kn-IN"),
    ]
    .into_iter()
    .map(|(locale, voice)| (locale, voice.to_string()))
    .collect()
}

impl Config {
    /// Load configuration, preferring `path` over the default location
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };

        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        let config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// The XDG config file location (`campus-connect/config.toml`)
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "campus", "campus-connect")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply environment overrides on top of the file values
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("CAMPUS_ANSWER_URL") {
            self.answer.base_url = url;
        }

        if let Ok(code) = std::env::var("CAMPUS_LOCALE") {
            match code.parse() {
                Ok(locale) => self.locale = locale,
                Err(e) => tracing::warn!(code = %code, error = %e, "ignoring CAMPUS_LOCALE"),
            }
        }

        if self.voice.api_key.is_none() {
            self.voice.api_key = std::env::var("CAMPUS_SPEECH_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.answer.base_url, "http://localhost:8000");
        assert_eq!(config.answer.timeout_secs, 15);
        assert!(config.answer.request_audio);
        assert_eq!(config.locale, Locale::En);
        assert_eq!(
            config.voice.voices.get(&Locale::Hi).map(String::as_str),
            Some("hi-IN")
        );
        assert_eq!(config.voice.voices.len(), 4);
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            locale = "te"

            [answer]
            base_url = "http://campus.example:9000"
            timeout_secs = 5

            [answer.wire]
            query_field = "text"
            reply_field = "response"

            [voice]
            enabled = false

            [voice.voices]
            en = "en-GB"
            "#,
        )
        .unwrap();

        assert_eq!(config.locale, Locale::Te);
        assert_eq!(config.answer.base_url, "http://campus.example:9000");
        assert_eq!(config.answer.timeout_secs, 5);
        assert_eq!(
            config.answer.wire.query_field,
            crate::answer::QueryField::Text
        );
        assert_eq!(
            config.answer.wire.reply_field,
            crate::answer::ReplyField::Response
        );
        assert!(!config.voice.enabled);
        // An explicit voices table replaces the default mapping
        assert_eq!(
            config.voice.voices.get(&Locale::En).map(String::as_str),
            Some("en-GB")
        );
        assert!(!config.voice.voices.contains_key(&Locale::Hi));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.answer.base_url, "http://localhost:8000");
        assert!(config.voice.enabled);
    }
}
