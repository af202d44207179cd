use serde::{Deserialize, Serialize};

use super::MergedToken;

/// A bounded-duration audio excerpt composed of one or more merged tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// Zero-based index, monotonically increasing per source recording
    pub index: usize,
    /// Constituent tokens in temporal order
    pub tokens: Vec<MergedToken>,
    /// Start of the first token in seconds
    pub start: f64,
    /// End of the last token in seconds
    pub end: f64,
}

impl Clip {
    /// Build a clip from a non-empty token run. Returns None on an empty run.
    pub fn from_tokens(index: usize, tokens: Vec<MergedToken>) -> Option<Self> {
        let first = tokens.first()?;
        let last = tokens.last()?;
        let (start, end) = (first.start, last.end);
        Some(Self {
            index,
            tokens,
            start,
            end,
        })
    }

    /// Duration of the concatenated token spans in seconds. This is the
    /// measure the packer accumulates; gaps between tokens are cut out of
    /// the clip audio and do not count.
    pub fn packed_duration(&self) -> f64 {
        self.tokens.iter().map(MergedToken::duration).sum()
    }

    /// Wall-clock span in the source recording in seconds
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// All constituent words in order
    pub fn words(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .flat_map(|t| t.text.split_whitespace())
            .collect()
    }

    /// Stable, human-readable output file name: zero-padded index followed
    /// by the sanitized constituent words and the wav extension
    pub fn file_name(&self) -> String {
        format!("{:03}_{}.wav", self.index, sanitize_words(&self.words()))
    }
}

/// Join words with underscores, dropping punctuation
fn sanitize_words(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// One source recording's accepted clips, in temporal order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationResult {
    /// Identifier of the source recording (file stem)
    pub source_id: String,
    /// Accepted clips; empty means the recording was rejected and no
    /// artifact may exist for it
    pub clips: Vec<Clip>,
}
