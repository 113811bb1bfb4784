//! Speech capture
//!
//! [`SpeechCapture`] is the capability boundary the session controller
//! talks to; [`MicCapture`] is the real implementation, combining cpal
//! microphone input, end-of-utterance detection, and HTTP transcription.
//! cpal streams are not `Send`, so audio runs on a dedicated thread and
//! only sample buffers cross into the async runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use tokio::sync::mpsc;

use crate::config::VoiceConfig;
use crate::locale::Locale;
use crate::transcript::TranscriptEvent;
use crate::voice::endpoint::EndpointDetector;
use crate::voice::stt::SttClient;
use crate::{Error, Result};

/// Sample rate for capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Audio polling interval on the capture thread
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Turns live audio into a stream of transcript events for a locale
#[async_trait]
pub trait SpeechCapture: Send {
    /// Whether capture is usable on this host
    fn is_available(&self) -> bool;

    /// Begin one capture session, emitting events into `events`
    ///
    /// # Errors
    ///
    /// Returns `CaptureUnsupported` if the capability is unavailable.
    async fn start(
        &mut self,
        locale: Locale,
        events: mpsc::Sender<TranscriptEvent>,
    ) -> Result<()>;

    /// Stop the active capture session, discarding anything unfinished
    async fn stop(&mut self);
}

/// Microphone-backed speech capture
pub struct MicCapture {
    stt: Arc<SttClient>,
    enabled: bool,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl MicCapture {
    /// Create a capture provider from voice configuration
    #[must_use]
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            stt: Arc::new(SttClient::new(config)),
            enabled: config.enabled,
            stop_flag: None,
        }
    }
}

#[async_trait]
impl SpeechCapture for MicCapture {
    fn is_available(&self) -> bool {
        self.enabled && cpal::default_host().default_input_device().is_some()
    }

    async fn start(
        &mut self,
        locale: Locale,
        events: mpsc::Sender<TranscriptEvent>,
    ) -> Result<()> {
        if self.stop_flag.is_some() {
            return Ok(());
        }

        if !self.is_available() {
            return Err(Error::CaptureUnsupported(
                "no input device available".to_string(),
            ));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let (utterance_tx, mut utterance_rx) = mpsc::channel::<Vec<f32>>(1);

        // Audio thread: poll the microphone until the utterance ends or
        // capture is cancelled
        let thread_stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            if let Err(e) = run_capture(&thread_stop, &utterance_tx) {
                tracing::warn!(error = %e, "capture thread failed");
            }
        });

        // Async side: transcribe the finished utterance and report finality
        let stt = Arc::clone(&self.stt);
        tokio::spawn(async move {
            while let Some(samples) = utterance_rx.recv().await {
                let event = match transcribe(&stt, samples, locale).await {
                    Ok(text) => TranscriptEvent {
                        fragments: vec![text],
                        is_final: true,
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "transcription failed");
                        // Finality with no text cancels the utterance cleanly
                        TranscriptEvent {
                            fragments: Vec::new(),
                            is_final: true,
                        }
                    }
                };

                if events.send(event).await.is_err() {
                    break;
                }
            }
        });

        self.stop_flag = Some(stop);
        tracing::debug!(locale = %locale, "capture started");
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(flag) = self.stop_flag.take() {
            flag.store(true, Ordering::SeqCst);
            tracing::debug!("capture stopped");
        }
    }
}

/// Poll the microphone, hand the utterance over once it completes
fn run_capture(stop: &AtomicBool, out: &mpsc::Sender<Vec<f32>>) -> Result<()> {
    let input = InputStream::open()?;
    let mut detector = EndpointDetector::new();

    loop {
        std::thread::sleep(POLL_INTERVAL);

        if stop.load(Ordering::SeqCst) {
            return Ok(());
        }

        let samples = input.take_buffer();
        if detector.feed(&samples) {
            let speech = detector.take_speech();
            if out.blocking_send(speech).is_err() {
                tracing::debug!("utterance receiver dropped");
            }
            return Ok(());
        }
    }
}

/// WAV-encode and transcribe one utterance
async fn transcribe(stt: &SttClient, samples: Vec<f32>, locale: Locale) -> Result<String> {
    let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
    stt.transcribe(wav, locale).await
}

/// An open microphone stream accumulating samples
struct InputStream {
    #[allow(dead_code)]
    stream: Stream,
    buffer: Arc<std::sync::Mutex<Vec<f32>>>,
}

impl InputStream {
    /// Open the default input device at the capture sample rate
    fn open() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable input config found".to_string()))?;

        let config: StreamConfig = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        let buffer = Arc::new(std::sync::Mutex::new(Vec::new()));
        let buffer_cb = Arc::clone(&buffer);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer_cb.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "audio capture initialized"
        );

        Ok(Self { stream, buffer })
    }

    /// Take the samples captured since the last call
    fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_to_wav_header() {
        let samples = vec![0.0f32, 0.5, -0.5, 0.25];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert!(wav.len() > 44);
    }

    #[test]
    fn test_wav_preserves_sample_count() {
        let samples = vec![0.1f32; 320];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.samples::<i16>().count(), samples.len());
    }
}
