//! Speech-to-text over HTTP

use crate::config::VoiceConfig;
use crate::locale::Locale;
use crate::{Error, Result};

/// Response from a Whisper-compatible transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes captured speech to text
pub struct SttClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl SttClient {
    /// Create an STT client from voice configuration
    #[must_use]
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.stt_url.clone(),
            model: config.stt_model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Transcribe WAV audio in the given locale
    ///
    /// # Errors
    ///
    /// Returns error if the request or transcription fails.
    pub async fn transcribe(&self, wav: Vec<u8>, locale: Locale) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), locale = %locale, "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("utterance.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language", locale.code());

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "transcription request failed");
            Error::Stt(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("STT API error {status}: {body}")));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Stt(format!("failed to parse transcription: {e}")))?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}
