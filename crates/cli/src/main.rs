use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand};

use whisper_worker_core::external::url_probe::UrlProbe;
use whisper_worker_core::external::webhook_client::WebhookClient;
use whisper_worker_core::shared::config::ProviderConfig;
use whisper_worker_core::shared::constants::{PROBE_URLS, WEBHOOK_URL};
use whisper_worker_core::speech::infrastructure::whisper_model_loader::WhisperModelLoader;
use whisper_worker_core::worker::model_provider::ModelProvider;
use whisper_worker_core::worker::protocol::{WorkerNotification, WorkerRequest};
use whisper_worker_core::worker::transcription_worker::{self, WorkerHandle};

/// Host for the Whisper transcription worker.
#[derive(Parser)]
#[command(name = "whisper-worker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Speak the worker protocol as JSON lines: requests on stdin, notifications on stdout.
    Serve {
        /// Model provider config (JSON). Defaults to the remote base model.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load the model and transcribe a raw little-endian f32 PCM file (16 kHz mono).
    Transcribe {
        input: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Post a chat message to the webhook and print the JSON reply.
    SendMessage {
        message: String,

        #[arg(long)]
        session_id: String,

        #[arg(long, default_value = WEBHOOK_URL)]
        url: String,
    },

    /// Probe URLs with GET and log each status code (defaults to the avatar model URLs).
    CheckUrls { urls: Vec<String> },
}

fn main() {
    // Info by default: `check-urls` reports through the log
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config } => run_serve(load_config(config.as_deref())?),
        Command::Transcribe { input, config } => {
            run_transcribe(&input, load_config(config.as_deref())?)
        }
        Command::SendMessage {
            message,
            session_id,
            url,
        } => {
            let reply = WebhookClient::new(url).send_message(&message, &session_id)?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
            Ok(())
        }
        Command::CheckUrls { urls } => {
            UrlProbe::new().probe_all(&probe_targets(&urls));
            Ok(())
        }
    }
}

fn probe_targets(urls: &[String]) -> Vec<&str> {
    if urls.is_empty() {
        PROBE_URLS.to_vec()
    } else {
        urls.iter().map(String::as_str).collect()
    }
}

fn load_config(path: Option<&Path>) -> Result<ProviderConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            Ok(ProviderConfig::load(path)?)
        }
        None => Ok(ProviderConfig::default()),
    }
}

fn spawn_worker(config: ProviderConfig) -> WorkerHandle {
    let provider = ModelProvider::new(config, Box::new(WhisperModelLoader::new()));
    transcription_worker::spawn(Arc::new(provider))
}

fn run_serve(config: ProviderConfig) -> Result<(), Box<dyn std::error::Error>> {
    let worker = spawn_worker(config);
    let notifications = worker.notifications().clone();

    let writer = thread::spawn(move || -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for notification in notifications.iter() {
            match notification.to_json() {
                Ok(line) => writeln!(stdout, "{line}")?,
                Err(e) => log::error!("Failed to encode notification: {e}"),
            }
            stdout.flush()?;
        }
        Ok(())
    });

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match WorkerRequest::from_json(&line) {
            Ok(request) => worker.send(request)?,
            Err(e) => log::warn!("Ignoring malformed request: {e}"),
        }
    }

    worker.shutdown();
    writer
        .join()
        .map_err(|_| "notification writer panicked")??;
    Ok(())
}

fn run_transcribe(input: &Path, config: ProviderConfig) -> Result<(), Box<dyn std::error::Error>> {
    let audio = read_pcm(input)?;
    let worker = spawn_worker(config);

    worker.send(WorkerRequest::Load)?;
    if let WorkerNotification::Error { message } = wait_for_terminal(&worker)? {
        return Err(message.into());
    }

    worker.send(WorkerRequest::Transcribe { audio })?;
    match wait_for_terminal(&worker)? {
        WorkerNotification::Complete { text } => {
            println!("{text}");
            Ok(())
        }
        WorkerNotification::Error { message } => Err(message.into()),
        other => Err(format!("Unexpected notification: {other:?}").into()),
    }
}

/// Print interim notifications to stderr and return the terminal one.
fn wait_for_terminal(worker: &WorkerHandle) -> Result<WorkerNotification, Box<dyn std::error::Error>> {
    for notification in worker.notifications().iter() {
        match &notification {
            WorkerNotification::Downloading { detail } => {
                if detail.total > 0 {
                    eprint!("\rDownloading {}... {:.0}%", detail.file, detail.progress);
                } else {
                    eprint!("\rDownloading {}... {} bytes", detail.file, detail.loaded);
                }
            }
            WorkerNotification::Loading { message } | WorkerNotification::Processing { message } => {
                eprintln!("{message}");
            }
            WorkerNotification::Ready { message } => {
                eprintln!();
                eprintln!("{message}");
            }
            WorkerNotification::Complete { .. } | WorkerNotification::Error { .. } => {}
        }
        if notification.is_terminal() {
            return Ok(notification);
        }
    }
    Err("Worker stopped before finishing the request".into())
}

fn read_pcm(path: &Path) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    decode_f32_le(&bytes)
}

fn decode_f32_le(bytes: &[u8]) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    if bytes.len() % 4 != 0 {
        return Err(format!(
            "PCM input must be 32-bit float samples, got {} bytes",
            bytes.len()
        )
        .into());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
