//! Answer service client
//!
//! One request/response exchange per query. Two deployments of the answer
//! service disagree on wire field names (`query` vs `text` in the request,
//! `text` vs `response` in the reply), so both are configuration rather
//! than hard-coded contract. Every call resolves to an [`AnswerOutcome`]
//! value; nothing escapes this boundary as a panic or a stray `Err`.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AnswerConfig;
use crate::locale::Locale;
use crate::{Error, Result};

/// Why an answer request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Query text was empty after trimming; no request was made
    EmptyQuery,
    /// Transport-level failure (connect, timeout)
    Network,
    /// The service answered with an error or an unusable reply
    Service,
}

/// Outcome of one answer service call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// A localized answer, optionally with pre-synthesized audio
    Success {
        /// Answer text in the requested locale
        text: String,
        /// MP3 audio of the answer, when the service synthesized it
        audio: Option<Vec<u8>>,
    },
    /// The turn failed; the session controller owns user-visible messaging
    Failure {
        /// Failure classification
        reason: FailureReason,
    },
}

/// Anything that can answer a query for a locale
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    /// Ask one question; always resolves to a value
    async fn ask(&self, text: &str, locale: Locale) -> AnswerOutcome;
}

/// Request field carrying the query text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryField {
    /// `{"query": ...}`
    #[default]
    Query,
    /// `{"text": ...}`
    Text,
}

impl QueryField {
    /// Wire name of the field
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Text => "text",
        }
    }
}

/// Reply field carrying the by-locale answer map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyField {
    /// `{"text": {"en": ...}}`
    #[default]
    Text,
    /// `{"response": {"en": ...}}`
    Response,
}

impl ReplyField {
    /// Wire name of the field
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Response => "response",
        }
    }

    /// The other observed variant, accepted as a fallback
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Text => Self::Response,
            Self::Response => Self::Text,
        }
    }
}

/// Wire dialect of one answer service deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireConfig {
    /// Request field carrying the query text
    pub query_field: QueryField,

    /// Reply field carrying the by-locale answer map
    pub reply_field: ReplyField,
}

/// HTTP client for the answer service
pub struct AnswerClient {
    client: reqwest::Client,
    base_url: String,
    wire: WireConfig,
    request_audio: bool,
}

impl AnswerClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &AnswerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            wire: config.wire,
            request_audio: config.request_audio,
        })
    }

    /// Probe the service's health endpoint
    ///
    /// # Errors
    ///
    /// Returns `Network` if the service is unreachable, `Service` if it
    /// answers unhealthy.
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Service(format!(
                "health check returned {}",
                response.status()
            )))
        }
    }

    fn request_body(&self, text: &str, locale: Locale) -> Value {
        let mut body = serde_json::Map::new();
        body.insert(
            self.wire.query_field.name().to_string(),
            Value::String(text.to_string()),
        );
        body.insert(
            "language".to_string(),
            Value::String(locale.code().to_string()),
        );
        body.insert("audio".to_string(), Value::Bool(self.request_audio));
        Value::Object(body)
    }
}

#[async_trait]
impl AnswerBackend for AnswerClient {
    async fn ask(&self, text: &str, locale: Locale) -> AnswerOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return AnswerOutcome::Failure {
                reason: FailureReason::EmptyQuery,
            };
        }

        let url = format!("{}/query", self.base_url);
        tracing::debug!(url = %url, locale = %locale, "sending query");

        let response = match self
            .client
            .post(&url)
            .json(&self.request_body(trimmed, locale))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "answer request failed");
                return AnswerOutcome::Failure {
                    reason: FailureReason::Network,
                };
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "answer service error");
            return AnswerOutcome::Failure {
                reason: FailureReason::Service,
            };
        }

        let payload: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read answer payload");
                let reason = if e.is_decode() {
                    FailureReason::Service
                } else {
                    FailureReason::Network
                };
                return AnswerOutcome::Failure { reason };
            }
        };

        let Some(reply) = select_reply(&payload, self.wire.reply_field, locale) else {
            tracing::warn!(locale = %locale, "reply missing requested locale");
            return AnswerOutcome::Failure {
                reason: FailureReason::Service,
            };
        };

        let audio = decode_audio(&payload);
        tracing::info!(locale = %locale, audio = audio.is_some(), "answer received");

        AnswerOutcome::Success { text: reply, audio }
    }
}

/// Select the answer string for `locale` from the reply payload
///
/// The configured reply field is preferred; the other observed variant is
/// accepted as a fallback so one build serves both deployments.
fn select_reply(payload: &Value, field: ReplyField, locale: Locale) -> Option<String> {
    let map = payload
        .get(field.name())
        .or_else(|| payload.get(field.other().name()))?;

    map.get(locale.code())
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// Decode the optional base64 audio payload
///
/// Undecodable audio is dropped rather than failing the turn; the text
/// answer is still useful on its own.
fn decode_audio(payload: &Value) -> Option<Vec<u8>> {
    let encoded = payload.get("audio").and_then(Value::as_str)?;
    match BASE64.decode(encoded) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(error = %e, "discarding undecodable audio payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> AnswerClient {
        AnswerClient::new(&AnswerConfig {
            base_url: base_url.to_string(),
            ..AnswerConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_select_reply_both_dialects() {
        let text_shape = serde_json::json!({
            "text": { "en": "The library is open 9am-9pm.", "hi": "..." }
        });
        let response_shape = serde_json::json!({
            "response": { "en": "Open 9 to 9." }
        });

        assert_eq!(
            select_reply(&text_shape, ReplyField::Text, Locale::En).as_deref(),
            Some("The library is open 9am-9pm.")
        );
        // Configured for one dialect, served the other
        assert_eq!(
            select_reply(&response_shape, ReplyField::Text, Locale::En).as_deref(),
            Some("Open 9 to 9.")
        );
        assert_eq!(
            select_reply(&text_shape, ReplyField::Response, Locale::Hi).as_deref(),
            Some("...")
        );
    }

    #[test]
    fn test_select_reply_missing_locale() {
        let payload = serde_json::json!({ "text": { "en": "hello" } });
        assert!(select_reply(&payload, ReplyField::Text, Locale::Te).is_none());
        assert!(select_reply(&serde_json::json!({}), ReplyField::Text, Locale::En).is_none());
    }

    #[test]
    fn test_decode_audio() {
        let payload = serde_json::json!({ "audio": BASE64.encode(b"mp3-bytes") });
        assert_eq!(decode_audio(&payload).as_deref(), Some(&b"mp3-bytes"[..]));

        assert!(decode_audio(&serde_json::json!({})).is_none());
        assert!(decode_audio(&serde_json::json!({ "audio": "not base64!!" })).is_none());
    }

    #[test]
    fn test_request_body_uses_configured_field() {
        let c = AnswerClient::new(&AnswerConfig {
            wire: WireConfig {
                query_field: QueryField::Text,
                ..WireConfig::default()
            },
            ..AnswerConfig::default()
        })
        .unwrap();

        let body = c.request_body("library hours", Locale::Kn);
        assert_eq!(body["text"], "library hours");
        assert_eq!(body["language"], "kn");
        assert_eq!(body["audio"], true);
        assert!(body.get("query").is_none());
    }

    #[tokio::test]
    async fn test_empty_query_fails_without_network() {
        // Nothing listens here; a network attempt would yield Network, not
        // EmptyQuery.
        let c = client("http://127.0.0.1:9");

        for text in ["", "   ", "\t\n"] {
            let outcome = c.ask(text, Locale::En).await;
            assert_eq!(
                outcome,
                AnswerOutcome::Failure {
                    reason: FailureReason::EmptyQuery
                }
            );
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_failure() {
        let c = client("http://127.0.0.1:9");
        let outcome = c.ask("library hours", Locale::En).await;
        assert_eq!(
            outcome,
            AnswerOutcome::Failure {
                reason: FailureReason::Network
            }
        );
    }
}
