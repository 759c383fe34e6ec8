pub const WHISPER_MODEL_ID: &str = "base";
pub const WHISPER_MODEL_BASE_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Fixed decoding configuration used for every transcription request.
pub const TRANSCRIBE_LANGUAGE: &str = "id";
pub const BEAM_SIZE: usize = 2;
pub const TEMPERATURE: f32 = 0.0;
pub const NO_SPEECH_THRESHOLD: f32 = 0.6;

pub const WEBHOOK_URL: &str = "https://deeplearning.pcr.ac.id/webhook/bot-parawisata-pekanbaru";

pub const PROBE_URLS: &[&str] = &[
    "https://models.readyplayer.me/63c59a35d72bffc6fa179c78.glb",
    "https://raw.githubusercontent.com/readyplayerme/visage/master/Models/Female.glb",
    "https://threejs.org/examples/models/gltf/Michelle.glb",
];
