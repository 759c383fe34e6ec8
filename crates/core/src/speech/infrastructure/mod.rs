pub mod whisper_model_loader;
pub mod whisper_recognizer;
