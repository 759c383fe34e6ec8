use std::fmt;
use std::path::{Path, PathBuf};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::speech::domain::decoding_options::{DecodingOptions, Task};
use crate::speech::domain::model_loader::ModelConstructionError;
use crate::speech::domain::speech_recognizer::{
    validate_audio, SpeechRecognizer, TranscriptionError,
};
use crate::speech::domain::transcript::{SegmentText, Transcript};

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// The model weights are loaded once in [`WhisperRecognizer::new`]; every
/// `transcribe` call runs on a fresh decoder state, so concurrent and
/// repeated calls see the same model.
pub struct WhisperRecognizer {
    context: WhisperContext,
    model_path: PathBuf,
}

impl WhisperRecognizer {
    pub fn new(model_path: &Path) -> Result<Self, ModelConstructionError> {
        if !model_path.exists() {
            return Err(ModelConstructionError::Initialize(format!(
                "Whisper model not found at: {}",
                model_path.display()
            )));
        }
        let path = model_path.to_str().ok_or_else(|| {
            ModelConstructionError::Initialize(format!(
                "Invalid model path: {}",
                model_path.display()
            ))
        })?;

        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| {
                ModelConstructionError::Initialize(format!("Failed to load Whisper model: {e}"))
            })?;

        Ok(Self {
            context,
            model_path: model_path.to_path_buf(),
        })
    }
}

impl fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("model_path", &self.model_path)
            .finish_non_exhaustive()
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(
        &self,
        audio: &[f32],
        options: &DecodingOptions,
    ) -> Result<Transcript, TranscriptionError> {
        validate_audio(audio)?;

        let mut state = self.context.create_state().map_err(|e| {
            TranscriptionError::Inference(format!("Failed to create Whisper state: {e}"))
        })?;

        state
            .full(full_params(options), audio)
            .map_err(|e| TranscriptionError::Inference(format!("Whisper inference failed: {e}")))?;

        let num_segments = state.full_n_segments();
        let mut segments = Vec::new();
        for seg_idx in 0..num_segments {
            let segment = match state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };
            let text = match segment.to_str() {
                Ok(t) => t,
                Err(_) => continue,
            };
            segments.push(SegmentText {
                text: text.to_string(),
                no_speech_probability: segment.no_speech_probability(),
            });
        }

        let transcript = Transcript::from_segments(&segments, options.no_speech_threshold);
        log::debug!(
            "Decoded {num_segments} segment(s) into {} chars",
            transcript.text.len()
        );
        Ok(transcript)
    }
}

fn full_params(options: &DecodingOptions) -> FullParams<'_, '_> {
    let strategy = if options.beam_size > 1 {
        SamplingStrategy::BeamSearch {
            beam_size: options.beam_size as i32,
            patience: -1.0,
        }
    } else {
        SamplingStrategy::Greedy { best_of: 1 }
    };
    let mut params = FullParams::new(strategy);
    params.set_language(Some(options.language.as_str()));
    params.set_translate(options.task == Task::Translate);
    params.set_temperature(options.temperature);
    // No fallback to higher temperatures when decoding fails the thresholds
    params.set_temperature_inc(0.0);
    params.set_no_speech_thold(options.no_speech_threshold);
    params.set_suppress_blank(true);
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    params.set_n_threads(num_cpus().min(4) as i32);
    params
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
