//! Campus Connect - voice query client for the campus assistant
//!
//! This library provides the core functionality of the client:
//! - Session control (capture, submission, spoken playback, conversation log)
//! - Answer service client with configurable wire dialects
//! - Speech capture and output capability providers
//!
//! # Architecture
//!
//! ```text
//! typed text / mic toggle
//!         │
//! ┌───────▼────────────────────────────────────┐
//! │           Session Controller               │
//! │  Idle │ Capturing │ Submitting │ Speaking  │
//! └──┬──────────┬──────────────┬───────────────┘
//!    │          │              │
//!    │   ┌──────▼──────┐  ┌────▼─────────┐
//!    │   │   Capture   │  │ Answer Client│──► Answer Service
//!    │   │ mic/STT/end-│  └──────────────┘
//!    │   │  pointing   │
//!    │   └─────────────┘
//! ┌──▼─────────────────┐
//! │  Output Dispatcher │──► TTS / audio playback
//! └────────────────────┘
//! ```
//!
//! The capture and output providers are trait seams so the controller runs
//! against fakes in tests and against cpal/HTTP speech services in the
//! binary.

pub mod answer;
pub mod config;
pub mod error;
pub mod locale;
pub mod session;
pub mod transcript;
pub mod voice;

pub use answer::{AnswerBackend, AnswerClient, AnswerOutcome, FailureReason};
pub use config::Config;
pub use error::{Error, Result};
pub use locale::{LanguageSelector, Locale};
pub use session::{
    FALLBACK_REPLY, Message, Origin, SessionController, SessionEvent, SessionState,
};
pub use transcript::{TranscriptAggregator, TranscriptEvent, Utterance};
pub use voice::{
    DeviceSpeechOutput, MicCapture, OutputDispatcher, SpeechCapture, SpeechOutput,
};
