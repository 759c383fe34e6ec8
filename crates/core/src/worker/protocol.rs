use serde::{Deserialize, Deserializer, Serialize};

use crate::speech::domain::load_progress::DownloadProgress;

/// Messages sent from the host to the worker, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerRequest {
    Load,
    /// A missing or undecodable `audio` payload becomes an empty buffer, which
    /// the worker answers with an `error` notification.
    Transcribe {
        #[serde(default, deserialize_with = "lenient_audio")]
        audio: Vec<f32>,
    },
    /// Any other `type`. The worker ignores it.
    #[serde(other)]
    Unknown,
}

impl WorkerRequest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn lenient_audio<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(value) => Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("Discarding undecodable audio payload: {e}");
            Vec::new()
        })),
    }
}

/// Messages sent from the worker to the host, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerNotification {
    Loading { message: String },
    Downloading { detail: DownloadProgress },
    Ready { message: String },
    Processing { message: String },
    Complete { text: String },
    Error { message: String },
}

impl WorkerNotification {
    /// `ready`, `complete` and `error` end a request; the others are interim.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerNotification::Ready { .. }
                | WorkerNotification::Complete { .. }
                | WorkerNotification::Error { .. }
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
