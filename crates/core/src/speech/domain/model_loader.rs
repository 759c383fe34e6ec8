use thiserror::Error;

use super::load_progress::LoadProgressEvent;
use super::model_handle::ModelHandle;
use crate::shared::config::ProviderConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelConstructionError {
    #[error("failed to resolve model artifact: {0}")]
    Resolve(String),
    #[error("failed to initialize model: {0}")]
    Initialize(String),
}

/// Builds a model instance from deployment configuration.
///
/// Called at most once per successful construction; the caller memoizes
/// the returned handle. `progress` receives events in emission order.
pub trait ModelLoader: Send + Sync {
    fn load(
        &self,
        config: &ProviderConfig,
        progress: &dyn Fn(LoadProgressEvent),
    ) -> Result<ModelHandle, ModelConstructionError>;
}
