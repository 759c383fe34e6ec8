use std::sync::Arc;

use crate::shared::config::ProviderConfig;
use crate::shared::model_resolver;
use crate::speech::domain::load_progress::{DownloadProgress, LoadProgressEvent};
use crate::speech::domain::model_handle::ModelHandle;
use crate::speech::domain::model_loader::{ModelConstructionError, ModelLoader};

use super::whisper_recognizer::WhisperRecognizer;

/// Resolves the ggml artifact (downloading it if needed) and loads it into
/// a [`WhisperRecognizer`].
#[derive(Debug, Default)]
pub struct WhisperModelLoader;

impl WhisperModelLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ModelLoader for WhisperModelLoader {
    fn load(
        &self,
        config: &ProviderConfig,
        progress: &dyn Fn(LoadProgressEvent),
    ) -> Result<ModelHandle, ModelConstructionError> {
        let file_name = config.model_file_name();
        progress(LoadProgressEvent::initiating(&file_name));

        let on_chunk = |loaded: u64, total: u64| {
            progress(LoadProgressEvent::chunk(DownloadProgress::new(
                &file_name, loaded, total,
            )));
        };
        let result = model_resolver::resolve(config, Some(&on_chunk))
            .map_err(|e| ModelConstructionError::Resolve(e.to_string()))
            .and_then(|path| {
                log::info!("Loading Whisper model from {}", path.display());
                WhisperRecognizer::new(&path)
            });

        match result {
            Ok(recognizer) => {
                progress(LoadProgressEvent::ready(file_name.as_str()));
                Ok(ModelHandle::new(Arc::new(recognizer)))
            }
            Err(e) => {
                progress(LoadProgressEvent::error(e.to_string()));
                Err(e)
            }
        }
    }
}
