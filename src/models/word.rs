use serde::{Deserialize, Serialize};

use crate::error::SpliceError;

use super::GentleWord;

/// Whether the aligner managed to place a word in the audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignStatus {
    /// The word was placed; start/end are trustworthy
    Success,
    /// The aligner could not place this word; its timestamps are unreliable
    /// and must not be used for duration math
    Failure,
}

/// Normalized representation of one aligned word
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentWord {
    /// The word text - immutable, never changed by the pipeline
    pub text: String,
    /// Start timestamp in seconds (zero for failed words)
    pub start: f64,
    /// End timestamp in seconds (zero for failed words)
    pub end: f64,
    /// Alignment status
    pub status: AlignStatus,
}

impl AlignmentWord {
    /// Normalize a wire word from the aligner.
    ///
    /// A success word must carry both timestamps with `end >= start`;
    /// anything else is a data-integrity fault in the aligner's output and
    /// is reported, not coerced.
    pub fn from_gentle(word: &GentleWord) -> Result<Self, SpliceError> {
        if !word.is_success() {
            return Ok(Self {
                text: word.word.clone(),
                start: 0.0,
                end: 0.0,
                status: AlignStatus::Failure,
            });
        }

        let (start, end) = match (word.start, word.end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(SpliceError::DataIntegrity(format!(
                    "success word {:?} is missing timestamps",
                    word.word
                )));
            }
        };

        if end < start {
            return Err(SpliceError::DataIntegrity(format!(
                "success word {:?} has inverted timestamps ({start} > {end})",
                word.word
            )));
        }

        Ok(Self {
            text: word.word.clone(),
            start,
            end,
            status: AlignStatus::Success,
        })
    }

    /// Spoken duration of this word in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_success(&self) -> bool {
        self.status == AlignStatus::Success
    }
}

/// Normalize a full aligner result, failing on the first integrity violation
pub fn alignment_words(words: &[GentleWord]) -> Result<Vec<AlignmentWord>, SpliceError> {
    words.iter().map(AlignmentWord::from_gentle).collect()
}

/// A unit of text with a single time span, formed by joining one or more
/// alignment words to satisfy a minimum duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedToken {
    /// One or more original words joined by a space
    pub text: String,
    /// Start timestamp in seconds
    pub start: f64,
    /// End timestamp in seconds
    pub end: f64,
}

impl MergedToken {
    /// Duration of the token span in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
