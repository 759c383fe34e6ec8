pub mod model_provider;
pub mod protocol;
pub mod transcription_worker;
pub mod worker_state;
