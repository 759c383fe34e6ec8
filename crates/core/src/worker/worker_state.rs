use std::fmt;

/// Lifecycle of a transcription worker.
///
/// `Failed` annotates the last operation only; the worker keeps accepting
/// requests from every state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkerState {
    #[default]
    Idle,
    LoadingModel,
    Ready,
    Transcribing,
    Failed {
        message: String,
    },
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Idle => write!(f, "idle"),
            WorkerState::LoadingModel => write!(f, "loading model"),
            WorkerState::Ready => write!(f, "ready"),
            WorkerState::Transcribing => write!(f, "transcribing"),
            WorkerState::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}
