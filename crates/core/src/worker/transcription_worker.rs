use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, SendError, Sender};

use super::model_provider::ModelProvider;
use super::protocol::{WorkerNotification, WorkerRequest};
use super::worker_state::WorkerState;
use crate::speech::domain::decoding_options::DecodingOptions;
use crate::speech::domain::load_progress::{LoadProgressEvent, ProgressCallback};
use crate::speech::domain::speech_recognizer::TranscriptionError;

pub const LOADING_MESSAGE: &str = "Downloading Whisper Base model (online CDN)...";
pub const READY_MESSAGE: &str = "Whisper AI ready.";
pub const PROCESSING_MESSAGE: &str = "Analyzing audio...";

/// Host-side handle to a running worker.
///
/// Requests go in through [`send`](Self::send); notifications come back on
/// [`notifications`](Self::notifications). Dropping the handle closes the
/// request channel and waits for in-flight operations to finish.
pub struct WorkerHandle {
    requests: Option<Sender<WorkerRequest>>,
    notifications: Receiver<WorkerNotification>,
    state: Arc<Mutex<WorkerState>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn send(&self, request: WorkerRequest) -> Result<(), SendError<WorkerRequest>> {
        match &self.requests {
            Some(tx) => tx.send(request),
            None => Err(SendError(request)),
        }
    }

    pub fn notifications(&self) -> &Receiver<WorkerNotification> {
        &self.notifications
    }

    pub fn state(&self) -> WorkerState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stop accepting requests and wait until every in-flight operation has
    /// delivered its terminal notification.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Spawn a background transcription worker backed by `provider`.
pub fn spawn(provider: Arc<ModelProvider>) -> WorkerHandle {
    let (request_tx, request_rx) = crossbeam_channel::unbounded::<WorkerRequest>();
    let (notification_tx, notification_rx) = crossbeam_channel::unbounded::<WorkerNotification>();
    let state = Arc::new(Mutex::new(WorkerState::Idle));

    let worker = TranscriptionWorker {
        provider,
        notifications: notification_tx,
        state: Arc::clone(&state),
    };
    let thread = thread::spawn(move || worker.run(&request_rx));

    WorkerHandle {
        requests: Some(request_tx),
        notifications: notification_rx,
        state,
        thread: Some(thread),
    }
}

#[derive(Clone)]
struct TranscriptionWorker {
    provider: Arc<ModelProvider>,
    notifications: Sender<WorkerNotification>,
    state: Arc<Mutex<WorkerState>>,
}

impl TranscriptionWorker {
    /// Receive loop. Each operation runs on its own thread so new requests
    /// are accepted while a model loads or inference runs.
    fn run(self, requests: &Receiver<WorkerRequest>) {
        let mut operations: Vec<JoinHandle<()>> = Vec::new();

        for request in requests.iter() {
            match request {
                WorkerRequest::Load => {
                    let worker = self.clone();
                    operations.push(thread::spawn(move || worker.load()));
                }
                WorkerRequest::Transcribe { audio } => {
                    let worker = self.clone();
                    operations.push(thread::spawn(move || worker.transcribe(&audio)));
                }
                WorkerRequest::Unknown => {
                    log::debug!("Ignoring unrecognized request");
                }
            }
            operations.retain(|op| !op.is_finished());
        }

        for op in operations {
            if op.join().is_err() {
                log::error!("Worker operation panicked");
            }
        }
        log::debug!("Worker exiting");
    }

    fn load(&self) {
        self.set_state(WorkerState::LoadingModel);
        self.emit(WorkerNotification::Loading {
            message: LOADING_MESSAGE.to_string(),
        });

        let relay_tx = self.notifications.clone();
        let relay: ProgressCallback = Arc::new(move |event: &LoadProgressEvent| {
            if let Some(detail) = event.chunk_progress() {
                let _ = relay_tx.send(WorkerNotification::Downloading {
                    detail: detail.clone(),
                });
            }
        });

        match self.provider.get_instance(Some(relay)) {
            Ok(_) => {
                self.set_state(WorkerState::Ready);
                self.emit(WorkerNotification::Ready {
                    message: READY_MESSAGE.to_string(),
                });
            }
            Err(e) => {
                let message = format!("Failed to load model: {e}");
                log::error!("{message}");
                self.fail(message);
            }
        }
    }

    fn transcribe(&self, audio: &[f32]) {
        self.set_state(WorkerState::Transcribing);
        self.emit(WorkerNotification::Processing {
            message: PROCESSING_MESSAGE.to_string(),
        });

        let result = self
            .provider
            .get_instance(None)
            .map_err(|e| e.to_string())
            .and_then(|model| {
                panic::catch_unwind(AssertUnwindSafe(|| {
                    model.transcribe(audio, &DecodingOptions::fixed())
                }))
                .unwrap_or_else(|_| {
                    Err(TranscriptionError::Inference(
                        "recognizer panicked".to_string(),
                    ))
                })
                .map_err(|e| e.to_string())
            });

        match result {
            Ok(transcript) => {
                if transcript.is_empty() {
                    log::info!("No speech detected in {} samples", audio.len());
                } else {
                    log::info!("Transcribed {} samples", audio.len());
                }
                self.set_state(WorkerState::Ready);
                self.emit(WorkerNotification::Complete {
                    text: transcript.text,
                });
            }
            Err(e) => {
                let message = format!("Transcription error: {e}");
                log::error!("{message}");
                self.fail(message);
            }
        }
    }

    fn fail(&self, message: String) {
        self.set_state(WorkerState::Failed {
            message: message.clone(),
        });
        self.emit(WorkerNotification::Error { message });
    }

    fn set_state(&self, state: WorkerState) {
        log::debug!("Worker state -> {state}");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn emit(&self, notification: WorkerNotification) {
        // The host may have stopped listening; there is nobody left to tell.
        let _ = self.notifications.send(notification);
    }
}
