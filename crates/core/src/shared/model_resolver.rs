use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use thiserror::Error;

use super::config::{ModelSource, ProviderConfig};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read download body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model not found at: {}", .0.display())]
    NotFound(PathBuf),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

const CHUNK_SIZE: usize = 1024 * 1024;

/// Resolve the model artifact described by `config`.
///
/// Resolution order:
/// 1. Local source: `<path_prefix>/<file>`, or `NotFound`
/// 2. Remote source: cache directory (when `use_cache` is set)
/// 3. Remote source: download `<base_url>/<file>` into the cache directory
///
/// `progress` receives `(bytes_downloaded, total_bytes)` per chunk;
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub fn resolve(
    config: &ProviderConfig,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<PathBuf, ModelResolveError> {
    let file_name = config.model_file_name();

    match &config.source {
        ModelSource::Local { path_prefix } => {
            let local_path = path_prefix.join(&file_name);
            if local_path.exists() {
                Ok(local_path)
            } else {
                Err(ModelResolveError::NotFound(local_path))
            }
        }
        ModelSource::Remote { base_url } => {
            let cache_dir = match &config.cache_dir {
                Some(dir) => dir.clone(),
                None => model_cache_dir()?,
            };
            let cached_path = cache_dir.join(&file_name);
            if config.use_cache && cached_path.exists() {
                log::debug!("Using cached model at {}", cached_path.display());
                return Ok(cached_path);
            }

            fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
            let url = format!("{}/{}", base_url.trim_end_matches('/'), file_name);
            log::info!("Downloading model from {url}");
            download(&Client::new(), &url, &cached_path, progress)?;
            Ok(cached_path)
        }
    }
}

/// Platform-specific model cache directory.
///
/// - Linux: `$XDG_CACHE_HOME/whisper-worker/models/` or `~/.cache/whisper-worker/models/`
/// - macOS: `~/Library/Caches/whisper-worker/models/`
/// - Windows: `%LOCALAPPDATA%/whisper-worker/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::cache_dir()
        .map(|d| d.join("whisper-worker").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(
    http: &Client,
    url: &str,
    dest: &Path,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<(), ModelResolveError> {
    let download_err = |e: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    };
    let mut response = http
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;

    let total = response.content_length().unwrap_or(0);

    // Write to a temp file first, then rename for atomicity
    let temp_path = dest.with_extension("part");
    let result = write_body(&mut response, url, &temp_path, total, progress)
        .and_then(|()| {
            fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
                path: dest.to_path_buf(),
                source: e,
            })
        });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_body(
    body: &mut impl Read,
    url: &str,
    temp_path: &Path,
    total: u64,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<(), ModelResolveError> {
    let write_err = |e: std::io::Error| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    };
    let mut file = fs::File::create(temp_path).map_err(write_err)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;

    loop {
        let n = body.read(&mut buf).map_err(|e| ModelResolveError::Body {
            url: url.to_string(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_client, serve_once};
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn remote_config(base_url: &str, cache_dir: &Path, use_cache: bool) -> ProviderConfig {
        ProviderConfig {
            source: ModelSource::Remote {
                base_url: base_url.to_string(),
            },
            use_cache,
            cache_dir: Some(cache_dir.to_path_buf()),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_resolve_finds_local_file() {
        let tmp = TempDir::new().unwrap();
        let config = ProviderConfig {
            source: ModelSource::Local {
                path_prefix: tmp.path().to_path_buf(),
            },
            ..ProviderConfig::default()
        };
        let model_path = tmp.path().join(config.model_file_name());
        fs::write(&model_path, b"local model").unwrap();

        assert_eq!(resolve(&config, None).unwrap(), model_path);
    }

    #[test]
    fn test_resolve_local_missing_does_not_download() {
        let tmp = TempDir::new().unwrap();
        let config = ProviderConfig {
            source: ModelSource::Local {
                path_prefix: tmp.path().to_path_buf(),
            },
            ..ProviderConfig::default()
        };

        let err = resolve(&config, None).unwrap_err();
        assert!(matches!(err, ModelResolveError::NotFound(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_resolve_prefers_cached_file() {
        let tmp = TempDir::new().unwrap();
        let config = remote_config("http://invalid.nonexistent.example.com", tmp.path(), true);
        let cached = tmp.path().join(config.model_file_name());
        fs::write(&cached, b"cached model").unwrap();

        let called = RefCell::new(false);
        let progress = |_: u64, _: u64| *called.borrow_mut() = true;
        assert_eq!(resolve(&config, Some(&progress)).unwrap(), cached);
        assert!(!*called.borrow());
    }

    #[test]
    fn test_resolve_ignores_cache_when_disabled() {
        let tmp = TempDir::new().unwrap();
        let config = remote_config("http://invalid.nonexistent.example.com", tmp.path(), false);
        fs::write(tmp.path().join(config.model_file_name()), b"stale").unwrap();

        let err = resolve(&config, None).unwrap_err();
        assert!(matches!(err, ModelResolveError::Download { .. }));
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("whisper-worker"));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_download_reports_monotonic_progress() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.bin");
        let body = vec![7u8; 3 * CHUNK_SIZE / 2];
        let (url, _request) = serve_once("200 OK", body.clone());

        let seen = RefCell::new(Vec::new());
        let progress = |loaded: u64, total: u64| seen.borrow_mut().push((loaded, total));
        download(&local_client(), &url, &dest, Some(&progress)).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), body);
        let seen = seen.into_inner();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(seen.last().unwrap(), &(body.len() as u64, body.len() as u64));
    }

    #[test]
    fn test_download_http_error_leaves_no_partial() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.bin");
        let (url, _request) = serve_once("404 Not Found", b"missing".to_vec());

        let err = download(&local_client(), &url, &dest, None).unwrap_err();
        assert!(matches!(err, ModelResolveError::Download { .. }));
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.bin");
        let result = download(
            &local_client(),
            "http://invalid.nonexistent.example.com/model",
            &dest,
            None,
        );
        assert!(result.is_err());
        assert!(!dest.with_extension("part").exists());
    }
}
