//! End-of-utterance detection
//!
//! Decides when the speaker has finished, using RMS energy with a trailing
//! silence window. This is what turns an open microphone into discrete
//! utterances for transcription.

/// Minimum audio energy to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum utterance length to accept (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Trailing silence that ends the utterance (in samples)
const TRAILING_SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// State of the endpoint detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// Waiting for the speaker to start
    Waiting,
    /// Accumulating an utterance
    Speech,
}

/// Detects the end of one spoken utterance
#[derive(Debug)]
pub struct EndpointDetector {
    state: EndpointState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl Default for EndpointDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointDetector {
    /// Create a detector waiting for speech
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: EndpointState::Waiting,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Feed captured samples; returns true once the utterance is complete
    pub fn feed(&mut self, samples: &[f32]) -> bool {
        if samples.is_empty() {
            return false;
        }

        let energy = rms_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            EndpointState::Waiting => {
                if is_speech {
                    self.state = EndpointState::Speech;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
            }
            EndpointState::Speech => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > TRAILING_SILENCE_SAMPLES {
                    if self.speech_buffer.len() > MIN_SPEECH_SAMPLES {
                        tracing::debug!(
                            samples = self.speech_buffer.len(),
                            "utterance complete"
                        );
                        return true;
                    }

                    // Too short to be an utterance; treat as a false start
                    tracing::trace!("false start, resetting");
                    self.reset();
                }
            }
        }

        false
    }

    /// Take the accumulated utterance samples and reset
    pub fn take_speech(&mut self) -> Vec<f32> {
        self.state = EndpointState::Waiting;
        self.silence_counter = 0;
        std::mem::take(&mut self.speech_buffer)
    }

    /// Discard any accumulated speech and wait again
    pub fn reset(&mut self) {
        self.state = EndpointState::Waiting;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> EndpointState {
        self.state
    }
}

/// RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(duration_samples: usize, amplitude: f32) -> Vec<f32> {
        (0..duration_samples)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / 16000.0;
                amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_energy_calculation() {
        assert!(rms_energy(&vec![0.0; 100]) < 0.001);
        assert!(rms_energy(&vec![0.5; 100]) > 0.4);
        assert!(rms_energy(&[]) < f32::EPSILON);
    }

    #[test]
    fn test_silence_does_not_start_utterance() {
        let mut detector = EndpointDetector::new();
        assert!(!detector.feed(&vec![0.0; 8000]));
        assert_eq!(detector.state(), EndpointState::Waiting);
    }

    #[test]
    fn test_speech_then_silence_completes() {
        let mut detector = EndpointDetector::new();

        // Half a second of speech
        assert!(!detector.feed(&tone(8000, 0.3)));
        assert_eq!(detector.state(), EndpointState::Speech);

        // Trailing silence closes it out
        let complete = detector.feed(&vec![0.0; 9000]);
        assert!(complete);

        let speech = detector.take_speech();
        assert_eq!(speech.len(), 8000 + 9000);
        assert_eq!(detector.state(), EndpointState::Waiting);
    }

    #[test]
    fn test_false_start_resets() {
        let mut detector = EndpointDetector::new();

        // A blip too short to be an utterance
        detector.feed(&tone(1600, 0.3));
        assert_eq!(detector.state(), EndpointState::Speech);

        assert!(!detector.feed(&vec![0.0; 9000]));
        assert_eq!(detector.state(), EndpointState::Waiting);
    }

    #[test]
    fn test_brief_pause_does_not_end_utterance() {
        let mut detector = EndpointDetector::new();

        detector.feed(&tone(8000, 0.3));
        // 0.2s pause, under the trailing-silence window
        assert!(!detector.feed(&vec![0.0; 3200]));
        // Speaker resumes
        assert!(!detector.feed(&tone(3200, 0.3)));
        assert_eq!(detector.state(), EndpointState::Speech);
    }
}
