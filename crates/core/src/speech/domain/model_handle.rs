use std::fmt;
use std::sync::Arc;

use super::decoding_options::DecodingOptions;
use super::speech_recognizer::{SpeechRecognizer, TranscriptionError};
use super::transcript::Transcript;

/// Shared, read-only handle to a constructed recognizer.
///
/// Cloning is cheap; all clones refer to the same model instance.
#[derive(Clone)]
pub struct ModelHandle {
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl ModelHandle {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn transcribe(
        &self,
        audio: &[f32],
        options: &DecodingOptions,
    ) -> Result<Transcript, TranscriptionError> {
        self.recognizer.transcribe(audio, options)
    }

    /// True if both handles point at the same model instance.
    pub fn same_instance(&self, other: &ModelHandle) -> bool {
        Arc::ptr_eq(&self.recognizer, &other.recognizer)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("instance", &Arc::as_ptr(&self.recognizer).cast::<()>())
            .finish()
    }
}
