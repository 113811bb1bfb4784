//! Speech output dispatch
//!
//! Decides whether to play service-supplied audio or invoke locale-aware
//! text-to-speech, and remembers the most recent presentation for manual
//! replay. The dispatcher never touches the conversation log.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::locale::Locale;
use crate::voice::playback::AudioPlayback;
use crate::voice::tts::TtsClient;
use crate::{Error, Result};

/// Speaks text or plays supplied audio
///
/// Both operations are dispatches: implementations return once output is
/// underway, not once it finishes.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speak `text` with the given voice tag
    async fn speak(&self, voice: &str, text: &str) -> Result<()>;

    /// Play pre-synthesized audio bytes (MP3)
    async fn play(&self, audio: &[u8]) -> Result<()>;
}

/// The most recent presentation, kept for replay
struct Presentation {
    voice: Option<String>,
    text: String,
    audio: Option<Vec<u8>>,
}

/// Routes answers to the speech output provider
pub struct OutputDispatcher<O: SpeechOutput> {
    provider: O,
    voices: HashMap<Locale, String>,
    last: Option<Presentation>,
}

impl<O: SpeechOutput> OutputDispatcher<O> {
    /// Create a dispatcher over `provider` with a locale-to-voice table
    #[must_use]
    pub const fn new(provider: O, voices: HashMap<Locale, String>) -> Self {
        Self {
            provider,
            voices,
            last: None,
        }
    }

    /// Present one answer: supplied audio wins, otherwise locale TTS
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedVoice` if TTS is needed but no voice is mapped
    /// for `locale`; otherwise propagates provider errors.
    pub async fn present(
        &mut self,
        locale: Locale,
        text: &str,
        audio: Option<Vec<u8>>,
    ) -> Result<()> {
        if let Some(bytes) = audio {
            self.last = Some(Presentation {
                voice: None,
                text: text.to_string(),
                audio: Some(bytes.clone()),
            });
            return self.provider.play(&bytes).await;
        }

        let voice = self
            .voices
            .get(&locale)
            .cloned()
            .ok_or_else(|| Error::UnsupportedVoice(locale.code().to_string()))?;

        self.last = Some(Presentation {
            voice: Some(voice.clone()),
            text: text.to_string(),
            audio: None,
        });
        self.provider.speak(&voice, text).await
    }

    /// Re-play the most recent presentation; no-op if there is none
    ///
    /// # Errors
    ///
    /// Propagates provider errors.
    pub async fn replay(&self) -> Result<()> {
        let Some(last) = &self.last else {
            tracing::debug!("nothing to replay");
            return Ok(());
        };

        match (&last.audio, &last.voice) {
            (Some(bytes), _) => self.provider.play(bytes).await,
            (None, Some(voice)) => self.provider.speak(voice, &last.text).await,
            (None, None) => Ok(()),
        }
    }
}

/// Real speech output: HTTP TTS plus local playback
///
/// Playback runs on a blocking task so dispatch returns as soon as output
/// is underway; completion is logged, not reported.
pub struct DeviceSpeechOutput {
    tts: TtsClient,
}

impl DeviceSpeechOutput {
    /// Create a device-backed output provider
    #[must_use]
    pub fn new(tts: TtsClient) -> Self {
        Self { tts }
    }
}

#[async_trait]
impl SpeechOutput for DeviceSpeechOutput {
    async fn speak(&self, voice: &str, text: &str) -> Result<()> {
        let mp3 = self.tts.synthesize(text, voice).await?;
        dispatch_playback(mp3);
        Ok(())
    }

    async fn play(&self, audio: &[u8]) -> Result<()> {
        dispatch_playback(audio.to_vec());
        Ok(())
    }
}

/// Fire-and-forget playback on the blocking pool
fn dispatch_playback(mp3: Vec<u8>) {
    tokio::task::spawn_blocking(move || {
        match AudioPlayback::new().and_then(|playback| playback.play_mp3(&mp3)) {
            Ok(()) => tracing::debug!("playback finished"),
            Err(e) => tracing::warn!(error = %e, "playback failed"),
        }
    });
}
