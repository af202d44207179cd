use thiserror::Error;

/// Errors produced while segmenting a single recording.
///
/// Every variant maps to a per-recording rejection at the orchestrator
/// boundary; none of them abort a batch.
#[derive(Debug, Error)]
pub enum SpliceError {
    /// The alignment service could not be reached, timed out, or returned
    /// something that is not a well-formed alignment result.
    #[error("alignment service unavailable: {0}")]
    AlignmentUnavailable(String),

    /// A success-status word carried missing or inverted timestamps.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// The packer produced zero clips. This is an expected outcome for very
    /// short or poorly aligned source material, not a fault.
    #[error("no viable segments")]
    NoViableSegments,

    /// The input audio could not be decoded or does not match the required
    /// mono 16-bit PCM framing.
    #[error("audio format error: {0}")]
    AudioFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for SpliceError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => SpliceError::Io(io),
            other => SpliceError::AudioFormat(other.to_string()),
        }
    }
}
