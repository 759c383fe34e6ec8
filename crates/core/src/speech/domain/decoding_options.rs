use crate::shared::constants::{BEAM_SIZE, NO_SPEECH_THRESHOLD, TEMPERATURE, TRANSCRIBE_LANGUAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Transcribe,
    Translate,
}

/// Decoder settings passed to a [`SpeechRecognizer`](super::speech_recognizer::SpeechRecognizer).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodingOptions {
    pub language: String,
    pub task: Task,
    /// Candidate paths kept per decoding step. 1 means greedy decoding.
    pub beam_size: usize,
    pub temperature: f32,
    /// Segments whose no-speech probability exceeds this are treated as silence.
    pub no_speech_threshold: f32,
}

impl DecodingOptions {
    /// The configuration every worker transcription runs with: Indonesian
    /// transcription, beam width 2, temperature 0, no-speech threshold 0.6.
    pub fn fixed() -> Self {
        Self {
            language: TRANSCRIBE_LANGUAGE.to_string(),
            task: Task::Transcribe,
            beam_size: BEAM_SIZE,
            temperature: TEMPERATURE,
            no_speech_threshold: NO_SPEECH_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_configuration() {
        let options = DecodingOptions::fixed();
        assert_eq!(options.language, "id");
        assert_eq!(options.task, Task::Transcribe);
        assert_eq!(options.beam_size, 2);
        assert_relative_eq!(options.temperature, 0.0);
        assert_relative_eq!(options.no_speech_threshold, 0.6);
    }
}
