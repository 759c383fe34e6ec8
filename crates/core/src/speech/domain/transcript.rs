/// Decoded text of one segment together with the model's silence estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentText {
    pub text: String,
    pub no_speech_probability: f32,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Transcript {
    pub text: String,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Join segment texts, dropping blank segments and those the model
    /// considers silence (`no_speech_probability > no_speech_threshold`).
    pub fn from_segments(segments: &[SegmentText], no_speech_threshold: f32) -> Self {
        let text = segments
            .iter()
            .filter(|s| s.no_speech_probability <= no_speech_threshold)
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self { text }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
