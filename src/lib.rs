pub mod align;
pub mod audio;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod segment;

pub use align::{AlignerClient, AlignerConfig};
pub use audio::AudioBuffer;
pub use error::SpliceError;
pub use io::{parse_transcript_file, ManifestWriter, RecordingEntry};
pub use models::{
    alignment_words, AlignStatus, AlignmentWord, Clip, GentleResponse, GentleWord, MergedToken,
    SegmentationResult,
};
pub use pipeline::{
    process_batch, segment_words, Orchestrator, OrchestratorConfig, RecordingOutcome, RejectReason,
    SegmentationStats,
};
pub use segment::{merge_short_words, pack_clips, MergeConfig, PackConfig};
