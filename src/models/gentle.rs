use serde::{Deserialize, Serialize};

/// Alignment case reported for a successfully placed word
pub const CASE_SUCCESS: &str = "success";

/// Root response from the Gentle forced-alignment service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GentleResponse {
    /// The transcript the aligner was given
    #[serde(default)]
    pub transcript: String,
    /// One entry per transcript word, in transcript order
    #[serde(default)]
    pub words: Vec<GentleWord>,
}

/// A single word from the aligner with placement info
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GentleWord {
    /// The transcript text of this word
    pub word: String,
    /// Alignment case: "success" when the word was placed in the audio,
    /// otherwise e.g. "not-found-in-audio" / "not-found-in-transcript"
    pub case: String,
    /// The vocabulary form the aligner matched, only on success
    #[serde(default, rename = "alignedWord")]
    pub aligned_word: Option<String>,
    /// Start timestamp in seconds, absent when alignment failed
    #[serde(default)]
    pub start: Option<f64>,
    /// End timestamp in seconds, absent when alignment failed
    #[serde(default)]
    pub end: Option<f64>,
    /// Character offset of the word in the transcript
    #[serde(default, rename = "startOffset")]
    pub start_offset: Option<u64>,
    /// Character offset of the end of the word in the transcript
    #[serde(default, rename = "endOffset")]
    pub end_offset: Option<u64>,
}

impl GentleWord {
    /// Whether the aligner placed this word in the audio
    pub fn is_success(&self) -> bool {
        self.case == CASE_SUCCESS
    }
}

impl GentleResponse {
    /// Number of words the aligner placed successfully
    pub fn aligned_count(&self) -> usize {
        self.words.iter().filter(|w| w.is_success()).count()
    }

    /// Fraction of words placed successfully (0-1), 1.0 for an empty list
    pub fn aligned_fraction(&self) -> f64 {
        if self.words.is_empty() {
            return 1.0;
        }
        self.aligned_count() as f64 / self.words.len() as f64
    }
}
