use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{WHISPER_MODEL_BASE_URL, WHISPER_MODEL_ID};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the model artifact comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelSource {
    /// Download from a CDN, `<base_url>/<file>`.
    Remote { base_url: String },
    /// Read `<path_prefix>/<file>` from disk. Never downloads.
    Local { path_prefix: PathBuf },
}

/// Deployment-time settings for model construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub model_id: String,
    pub quantized: bool,
    pub source: ModelSource,
    /// Reuse a previously downloaded artifact from the cache directory.
    pub use_cache: bool,
    /// Overrides the platform cache directory.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model_id: WHISPER_MODEL_ID.to_string(),
            quantized: true,
            source: ModelSource::Remote {
                base_url: WHISPER_MODEL_BASE_URL.to_string(),
            },
            use_cache: true,
            cache_dir: None,
        }
    }
}

impl ProviderConfig {
    /// File name of the ggml artifact, e.g. `ggml-base-q5_1.bin`.
    pub fn model_file_name(&self) -> String {
        if self.quantized {
            format!("ggml-{}-q5_1.bin", self.model_id)
        } else {
            format!("ggml-{}.bin", self.model_id)
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_default_uses_remote_quantized_base() {
        let config = ProviderConfig::default();
        assert_eq!(config.model_id, "base");
        assert!(config.quantized);
        assert!(config.use_cache);
        assert!(matches!(config.source, ModelSource::Remote { .. }));
    }

    #[rstest]
    #[case::quantized(true, "ggml-base-q5_1.bin")]
    #[case::full_precision(false, "ggml-base.bin")]
    fn test_model_file_name(#[case] quantized: bool, #[case] expected: &str) {
        let config = ProviderConfig {
            quantized,
            ..ProviderConfig::default()
        };
        assert_eq!(config.model_file_name(), expected);
    }

    #[test]
    fn test_load_preserves_local_source() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("worker.json");
        let config = ProviderConfig {
            model_id: "small".to_string(),
            quantized: false,
            source: ModelSource::Local {
                path_prefix: PathBuf::from("/opt/models"),
            },
            use_cache: false,
            cache_dir: Some(tmp.path().to_path_buf()),
        };

        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = ProviderConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("worker.json");
        fs::write(&path, r#"{ "model_id": "tiny" }"#).unwrap();

        let loaded = ProviderConfig::load(&path).unwrap();
        assert_eq!(loaded.model_id, "tiny");
        assert!(loaded.quantized);
        assert_eq!(loaded.source, ProviderConfig::default().source);
    }

    #[test]
    fn test_source_is_tagged_by_kind() {
        let json = r#"{ "source": { "kind": "local", "path_prefix": "/models" } }"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.source,
            ModelSource::Local {
                path_prefix: PathBuf::from("/models")
            }
        );
    }

    #[test]
    fn test_load_invalid_json_returns_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("worker.json");
        fs::write(&path, "not json").unwrap();

        let err = ProviderConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file_returns_read_error() {
        let err = ProviderConfig::load(Path::new("/nonexistent/worker.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
