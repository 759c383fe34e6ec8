use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Byte-level progress for one model artifact download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub file: String,
    pub loaded: u64,
    /// 0 when the server did not report a length.
    pub total: u64,
    /// Percentage in `0.0..=100.0`; stays 0 when `total` is unknown.
    pub progress: f64,
}

impl DownloadProgress {
    pub fn new(file: &str, loaded: u64, total: u64) -> Self {
        let progress = if total > 0 {
            (loaded as f64 / total as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        Self {
            file: file.to_string(),
            loaded,
            total,
            progress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Initiating,
    DownloadingChunk,
    Ready,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadDetail {
    Download(DownloadProgress),
    Message(String),
}

/// Notification emitted while a model is being constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgressEvent {
    pub status: LoadStatus,
    pub detail: LoadDetail,
}

impl LoadProgressEvent {
    pub fn initiating(file: &str) -> Self {
        Self {
            status: LoadStatus::Initiating,
            detail: LoadDetail::Message(file.to_string()),
        }
    }

    pub fn chunk(progress: DownloadProgress) -> Self {
        Self {
            status: LoadStatus::DownloadingChunk,
            detail: LoadDetail::Download(progress),
        }
    }

    pub fn ready(message: impl Into<String>) -> Self {
        Self {
            status: LoadStatus::Ready,
            detail: LoadDetail::Message(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: LoadStatus::Error,
            detail: LoadDetail::Message(message.into()),
        }
    }

    /// The download payload of a chunk event, `None` for every other status.
    pub fn chunk_progress(&self) -> Option<&DownloadProgress> {
        match (&self.status, &self.detail) {
            (LoadStatus::DownloadingChunk, LoadDetail::Download(progress)) => Some(progress),
            _ => None,
        }
    }
}

/// Shared progress listener. Several callers may observe one construction.
pub type ProgressCallback = Arc<dyn Fn(&LoadProgressEvent) + Send + Sync>;
