pub mod decoding_options;
pub mod load_progress;
pub mod model_handle;
pub mod model_loader;
pub mod speech_recognizer;
pub mod transcript;
