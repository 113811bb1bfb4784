//! Voice session controller
//!
//! The state machine orchestrating capture start/stop, finality detection,
//! dispatch to the answer client, and handoff to speech output. Owns the
//! conversation log and the active locale; both are mutated only through
//! the named transitions below.
//!
//! All work is event-driven on one logical execution thread: user input
//! and capability callbacks arrive as [`SessionEvent`]s drained by a
//! single driver loop, so no locking is needed around session state. The
//! answer call is spawned, not awaited inline, which is what makes a
//! capture toggle during `Submitting` observable (and rejected) rather
//! than queued.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::answer::{AnswerBackend, AnswerOutcome};
use crate::locale::{LanguageSelector, Locale};
use crate::transcript::{TranscriptAggregator, TranscriptEvent};
use crate::voice::{OutputDispatcher, SpeechCapture, SpeechOutput};
use crate::{Error, Result};

/// Fallback reply appended when a turn fails
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong. Please try again.";

/// Current mode of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for user input
    Idle,
    /// Microphone open, recognizing an utterance
    Capturing,
    /// Query in flight to the answer service
    Submitting,
    /// Answer being handed to speech output
    Speaking,
}

/// Who produced a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The person asking
    User,
    /// The assistant's reply
    Assistant,
}

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Who produced it
    pub origin: Origin,

    /// The text as shown
    pub text: String,
}

impl Message {
    /// A user entry
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::User,
            text: text.into(),
        }
    }

    /// An assistant entry
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Assistant,
            text: text.into(),
        }
    }
}

/// An event for the session's driver loop
#[derive(Debug)]
pub enum SessionEvent {
    /// A recognition callback from the capture provider
    Transcript(TranscriptEvent),
    /// The spawned answer call resolved
    Answer(AnswerOutcome),
}

/// The session controller
pub struct SessionController<C, A, O>
where
    C: SpeechCapture,
    A: AnswerBackend + 'static,
    O: SpeechOutput,
{
    state: SessionState,
    selector: LanguageSelector,
    log: Vec<Message>,
    aggregator: Option<TranscriptAggregator>,
    capture: C,
    answer: Arc<A>,
    output: OutputDispatcher<O>,
    events_tx: mpsc::Sender<SessionEvent>,
}

impl<C, A, O> SessionController<C, A, O>
where
    C: SpeechCapture,
    A: AnswerBackend + 'static,
    O: SpeechOutput,
{
    /// Create a controller in `Idle` with an empty conversation log
    ///
    /// `events_tx` must feed the queue the driver loop drains into
    /// [`Self::handle_event`].
    pub fn new(
        locale: Locale,
        capture: C,
        answer: Arc<A>,
        output: OutputDispatcher<O>,
        events_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            selector: LanguageSelector::new(locale),
            log: Vec::new(),
            aggregator: None,
            capture,
            answer,
            output,
            events_tx,
        }
    }

    /// Current session state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The conversation log, oldest first
    #[must_use]
    pub fn log(&self) -> &[Message] {
        &self.log
    }

    /// The active locale
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.selector.current()
    }

    /// Advance the locale cycle and return the new selection
    pub const fn cycle_locale(&mut self) -> Locale {
        self.selector.cycle_next()
    }

    /// Set the locale from a wire code
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocale` for codes outside the supported set.
    pub fn set_locale_code(&mut self, code: &str) -> Result<Locale> {
        self.selector.set_code(code)
    }

    /// Toggle microphone capture
    ///
    /// `Idle` starts a capture for the active locale; `Capturing` cancels
    /// it, discarding the in-flight utterance. Outside those states the
    /// toggle is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CaptureUnsupported` when the capture provider is
    /// unavailable; the session stays `Idle`.
    pub async fn toggle_capture(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle => {
                if !self.capture.is_available() {
                    return Err(Error::CaptureUnsupported(
                        "speech capture is not available on this host".to_string(),
                    ));
                }

                let locale = self.selector.current();
                let (tx, mut rx) = mpsc::channel(16);
                self.capture.start(locale, tx).await?;

                // Forward provider callbacks into the session event queue
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        if events.send(SessionEvent::Transcript(event)).await.is_err() {
                            break;
                        }
                    }
                });

                self.aggregator = Some(TranscriptAggregator::new());
                self.state = SessionState::Capturing;
                tracing::info!(locale = %locale, "capture started");
                Ok(())
            }
            SessionState::Capturing => {
                self.capture.stop().await;
                self.aggregator = None;
                self.state = SessionState::Idle;
                tracing::info!("capture cancelled");
                Ok(())
            }
            SessionState::Submitting | SessionState::Speaking => {
                tracing::debug!(state = ?self.state, "capture toggle ignored");
                Ok(())
            }
        }
    }

    /// Submit typed text, bypassing capture
    ///
    /// Ignored outside `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyQuery` for text that is empty after trimming; nothing
    /// is logged or dispatched.
    pub fn submit_text(&mut self, text: &str) -> Result<()> {
        if self.state != SessionState::Idle {
            tracing::debug!(state = ?self.state, "text submission ignored");
            return Ok(());
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyQuery);
        }

        self.begin_submission(trimmed.to_string());
        Ok(())
    }

    /// Re-play the most recently presented answer; no-op if none
    ///
    /// # Errors
    ///
    /// Propagates speech output provider errors.
    pub async fn replay(&self) -> Result<()> {
        self.output.replay().await
    }

    /// Process one session event
    ///
    /// # Errors
    ///
    /// Returns capability errors worth reporting inline (`UnsupportedVoice`,
    /// output provider failures); the session is `Idle` and usable again
    /// whenever an error is returned.
    pub async fn handle_event(&mut self, event: SessionEvent) -> Result<()> {
        match event {
            SessionEvent::Transcript(event) => self.handle_transcript(event).await,
            SessionEvent::Answer(outcome) => self.handle_answer(outcome).await,
        }
    }

    /// Fold one recognition event into the current utterance
    async fn handle_transcript(&mut self, event: TranscriptEvent) -> Result<()> {
        if self.state != SessionState::Capturing {
            tracing::debug!(state = ?self.state, "stale transcript event ignored");
            return Ok(());
        }

        let Some(aggregator) = self.aggregator.as_mut() else {
            return Ok(());
        };

        let utterance = aggregator.on_event(&event);
        if !utterance.is_final {
            return Ok(());
        }

        let text = utterance.text.trim().to_string();
        self.capture.stop().await;
        self.aggregator = None;

        if text.is_empty() {
            tracing::debug!("utterance finalized empty, nothing to submit");
            self.state = SessionState::Idle;
        } else {
            self.begin_submission(text);
        }

        Ok(())
    }

    /// Log the user message and dispatch the answer call
    ///
    /// The call is spawned; its outcome returns through the event queue, so
    /// the session sits in `Submitting` until then and rejects capture
    /// toggles in the meantime.
    fn begin_submission(&mut self, text: String) {
        self.log.push(Message::user(text.clone()));
        self.state = SessionState::Submitting;

        let answer = Arc::clone(&self.answer);
        let locale = self.selector.current();
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let outcome = answer.ask(&text, locale).await;
            if events.send(SessionEvent::Answer(outcome)).await.is_err() {
                tracing::debug!("session closed before the answer arrived");
            }
        });

        tracing::info!(locale = %locale, "query submitted");
    }

    /// Complete the turn with the answer outcome
    async fn handle_answer(&mut self, outcome: AnswerOutcome) -> Result<()> {
        if self.state != SessionState::Submitting {
            tracing::debug!(state = ?self.state, "stray answer outcome ignored");
            return Ok(());
        }

        match outcome {
            AnswerOutcome::Success { text, audio } => {
                self.log.push(Message::assistant(text.clone()));
                self.state = SessionState::Speaking;

                let locale = self.selector.current();
                let result = self.output.present(locale, &text, audio).await;

                // Output is fire-and-forget: the turn ends once dispatch is
                // issued (or refused)
                self.state = SessionState::Idle;
                result
            }
            AnswerOutcome::Failure { reason } => {
                tracing::warn!(?reason, "turn failed");
                self.log.push(Message::assistant(FALLBACK_REPLY));
                self.state = SessionState::Idle;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let user = Message::user("library hours");
        assert_eq!(user.origin, Origin::User);
        assert_eq!(user.text, "library hours");

        let reply = Message::assistant(FALLBACK_REPLY);
        assert_eq!(reply.origin, Origin::Assistant);
    }
}
