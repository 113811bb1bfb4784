//! Shared test fakes
//!
//! The session controller is exercised without audio hardware or network:
//! a scripted answer backend, a flag-only capture provider, and a
//! recording output provider.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use campus_connect::voice::{SpeechCapture, SpeechOutput};
use campus_connect::{AnswerBackend, AnswerOutcome, Locale, Result, TranscriptEvent};

/// Answer backend returning a fixed outcome, recording every call
pub struct ScriptedAnswer {
    outcome: AnswerOutcome,
    calls: AtomicUsize,
    last_query: Mutex<Option<(String, Locale)>>,
}

impl ScriptedAnswer {
    pub fn new(outcome: AnswerOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    /// Number of `ask` calls observed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent query and locale asked
    pub fn last_query(&self) -> Option<(String, Locale)> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerBackend for ScriptedAnswer {
    async fn ask(&self, text: &str, locale: Locale) -> AnswerOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some((text.to_string(), locale));
        self.outcome.clone()
    }
}

/// Capture provider that only tracks whether a session is active
pub struct FlagCapture {
    available: bool,
    active: Arc<AtomicBool>,
}

impl FlagCapture {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle observing whether capture is currently active
    pub fn active_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }
}

#[async_trait]
impl SpeechCapture for FlagCapture {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn start(
        &mut self,
        _locale: Locale,
        _events: mpsc::Sender<TranscriptEvent>,
    ) -> Result<()> {
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Output provider that records dispatches instead of making sound
#[derive(Default)]
pub struct RecordingOutput {
    spoken: Arc<Mutex<Vec<(String, String)>>>,
    played: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingOutput {
    /// Handle observing `(voice, text)` speak dispatches
    pub fn spoken_handle(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.spoken)
    }

    /// Handle observing play-from-bytes dispatches
    pub fn played_handle(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.played)
    }
}

#[async_trait]
impl SpeechOutput for RecordingOutput {
    async fn speak(&self, voice: &str, text: &str) -> Result<()> {
        self.spoken
            .lock()
            .unwrap()
            .push((voice.to_string(), text.to_string()));
        Ok(())
    }

    async fn play(&self, audio: &[u8]) -> Result<()> {
        self.played.lock().unwrap().push(audio.to_vec());
        Ok(())
    }
}
