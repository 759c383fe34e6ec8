use thiserror::Error;

use super::decoding_options::DecodingOptions;
use super::transcript::Transcript;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscriptionError {
    #[error("audio contains no samples")]
    EmptyAudio,
    #[error("audio sample {index} is not a finite number")]
    InvalidSample { index: usize },
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Domain interface for speech-to-text transcription.
///
/// Implementations hold a constructed model and may be shared across threads;
/// `transcribe` must not mutate model state between calls.
pub trait SpeechRecognizer: Send + Sync {
    fn transcribe(
        &self,
        audio: &[f32],
        options: &DecodingOptions,
    ) -> Result<Transcript, TranscriptionError>;
}

/// Reject input that cannot be fed to a decoder.
pub fn validate_audio(audio: &[f32]) -> Result<(), TranscriptionError> {
    if audio.is_empty() {
        return Err(TranscriptionError::EmptyAudio);
    }
    match audio.iter().position(|s| !s.is_finite()) {
        Some(index) => Err(TranscriptionError::InvalidSample { index }),
        None => Ok(()),
    }
}
