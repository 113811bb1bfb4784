//! Text-to-speech over HTTP

use crate::config::VoiceConfig;
use crate::{Error, Result};

/// Synthesizes speech from text
pub struct TtsClient {
    client: reqwest::Client,
    url: String,
    model: String,
    speed: f32,
    api_key: Option<String>,
}

impl TtsClient {
    /// Create a TTS client from voice configuration
    #[must_use]
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.tts_url.clone(),
            model: config.tts_model.clone(),
            speed: config.tts_speed,
            api_key: config.api_key.clone(),
        }
    }

    /// Synthesize `text` with the given voice tag
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            speed: self.speed,
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Tts(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS API error {status}: {body}")));
        }

        let audio = response.bytes().await.map_err(|e| Error::Tts(e.to_string()))?;
        tracing::debug!(bytes = audio.len(), voice, "synthesis complete");
        Ok(audio.to_vec())
    }
}
