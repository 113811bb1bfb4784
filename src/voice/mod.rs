//! Speech capability providers
//!
//! Capture (microphone, end-of-utterance detection, STT) and output
//! (TTS, playback) behind the trait seams the session controller uses.

mod capture;
mod endpoint;
mod output;
mod playback;
mod stt;
mod tts;

pub use capture::{MicCapture, SAMPLE_RATE, SpeechCapture, samples_to_wav};
pub use endpoint::{EndpointDetector, EndpointState};
pub use output::{DeviceSpeechOutput, OutputDispatcher, SpeechOutput};
pub use playback::AudioPlayback;
pub use stt::SttClient;
pub use tts::TtsClient;
