use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::align::AlignerClient;
use crate::audio::AudioBuffer;
use crate::error::SpliceError;
use crate::io::{materialize_clips, ManifestWriter, RecordingEntry};
use crate::models::{alignment_words, Clip, GentleWord, SegmentationResult};
use crate::segment::{merge_short_words, pack_clips, MergeConfig, PackConfig};

/// Why a recording reached the `Rejected` terminal state
#[derive(Debug, Clone)]
pub enum RejectReason {
    /// The aligner was unreachable, timed out, or returned malformed data
    AlignmentUnavailable(String),
    /// The aligner emitted a success word with unusable timestamps
    DataIntegrity(String),
    /// The packer produced zero clips - a skip, not a fault
    NoViableSegments,
    /// Audio decode or clip write failure; partial output was rolled back
    Io(String),
}

impl From<SpliceError> for RejectReason {
    fn from(err: SpliceError) -> Self {
        match err {
            SpliceError::AlignmentUnavailable(msg) => Self::AlignmentUnavailable(msg),
            SpliceError::DataIntegrity(msg) => Self::DataIntegrity(msg),
            SpliceError::NoViableSegments => Self::NoViableSegments,
            SpliceError::AudioFormat(msg) => Self::Io(msg),
            SpliceError::Io(e) => Self::Io(e.to_string()),
        }
    }
}

/// Explicit terminal state of one recording. The filesystem layout is a
/// side effect of this value, never the source of truth.
#[derive(Debug)]
pub enum RecordingOutcome {
    /// One or more clips were written under the recording's output directory
    Materialized {
        source_id: String,
        clip_paths: Vec<PathBuf>,
    },
    /// Nothing was written (or everything written was rolled back)
    Rejected {
        source_id: String,
        reason: RejectReason,
    },
}

impl RecordingOutcome {
    pub fn source_id(&self) -> &str {
        match self {
            Self::Materialized { source_id, .. } | Self::Rejected { source_id, .. } => source_id,
        }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self, Self::Materialized { .. })
    }
}

/// Batch tallies, folded from per-recording outcomes by the driver so
/// concurrent recordings never share a counter
#[derive(Debug, Default, Clone)]
pub struct SegmentationStats {
    /// Recordings that reached a terminal state
    pub recordings_processed: usize,
    /// Recordings with at least one clip written
    pub materialized: usize,
    /// Recordings skipped because nothing viable could be packed
    pub skipped_no_segments: usize,
    /// Recordings rejected by an actual fault
    pub failed: usize,
    /// Manifest entries whose audio file was not on disk
    pub missing_inputs: usize,
    /// Total clips written across all materialized recordings
    pub clips_written: usize,
}

impl SegmentationStats {
    pub fn record(&mut self, outcome: &RecordingOutcome) {
        self.recordings_processed += 1;
        match outcome {
            RecordingOutcome::Materialized { clip_paths, .. } => {
                self.materialized += 1;
                self.clips_written += clip_paths.len();
            }
            RecordingOutcome::Rejected {
                reason: RejectReason::NoViableSegments,
                ..
            } => self.skipped_no_segments += 1,
            RecordingOutcome::Rejected { .. } => self.failed += 1,
        }
    }
}

/// Run the full in-memory segmentation for one recording: normalize the
/// wire words (data-integrity validation), merge short words, pack clips.
///
/// Zero packed clips is reported as `NoViableSegments` so the caller can
/// treat it as a skip distinct from real faults.
pub fn segment_words(
    words: &[GentleWord],
    source_duration: f64,
    merge_config: &MergeConfig,
    pack_config: &PackConfig,
) -> Result<Vec<Clip>, SpliceError> {
    let words = alignment_words(words)?;
    let tokens = merge_short_words(&words, merge_config);
    let clips = pack_clips(&tokens, source_duration, pack_config);

    if clips.is_empty() {
        return Err(SpliceError::NoViableSegments);
    }
    Ok(clips)
}

/// Configuration for the segmentation orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub merge: MergeConfig,
    pub pack: PackConfig,
    /// Root under which each recording gets its own clip directory
    pub output_dir: PathBuf,
}

/// Drives one recording end to end: decode, align, merge, pack,
/// materialize. Holds no per-recording state between calls, so one
/// orchestrator serves any number of concurrent recordings.
pub struct Orchestrator {
    client: AlignerClient,
    config: OrchestratorConfig,
    manifest: Option<ManifestWriter>,
}

impl Orchestrator {
    pub fn new(client: AlignerClient, config: OrchestratorConfig) -> Self {
        Self {
            client,
            config,
            manifest: None,
        }
    }

    /// Attach a shared run manifest; every materialized recording appends
    /// one entry
    pub fn with_manifest(mut self, manifest: ManifestWriter) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Process one recording to its terminal state. Every failure is caught
    /// here, logged with the recording identifier, and mapped to
    /// `Rejected`; nothing escapes to abort a batch.
    pub async fn process_recording(
        &self,
        source_id: &str,
        audio_path: &Path,
        transcript: &str,
    ) -> RecordingOutcome {
        match self.run_stages(source_id, audio_path, transcript).await {
            Ok(clip_paths) => {
                info!("{source_id}: materialized {} clip(s)", clip_paths.len());
                RecordingOutcome::Materialized {
                    source_id: source_id.to_string(),
                    clip_paths,
                }
            }
            Err(SpliceError::NoViableSegments) => {
                // Expected for very short or poorly aligned material
                info!("{source_id}: no viable segments, skipping");
                RecordingOutcome::Rejected {
                    source_id: source_id.to_string(),
                    reason: RejectReason::NoViableSegments,
                }
            }
            Err(e) => {
                warn!("{source_id}: rejected: {e}");
                RecordingOutcome::Rejected {
                    source_id: source_id.to_string(),
                    reason: e.into(),
                }
            }
        }
    }

    async fn run_stages(
        &self,
        source_id: &str,
        audio_path: &Path,
        transcript: &str,
    ) -> Result<Vec<PathBuf>, SpliceError> {
        let audio = AudioBuffer::from_wav_file(audio_path)?;
        let response = self.client.align(audio_path, transcript).await?;
        let clips = segment_words(
            &response.words,
            audio.duration_seconds(),
            &self.config.merge,
            &self.config.pack,
        )?;

        let result = SegmentationResult {
            source_id: source_id.to_string(),
            clips,
        };
        let clip_paths = materialize_clips(&audio, &result, &self.config.output_dir)?;

        if let Some(manifest) = &self.manifest {
            if let Err(e) = manifest.append(source_id, &clip_paths) {
                // Keep materialization all-or-nothing: untracked clips are
                // rolled back along with the failed manifest append
                let clip_dir = self.config.output_dir.join(source_id);
                if let Err(cleanup) = std::fs::remove_dir_all(&clip_dir) {
                    warn!("failed to roll back {:?}: {cleanup}", clip_dir);
                }
                return Err(e);
            }
        }

        Ok(clip_paths)
    }
}

/// Process a batch of recordings concurrently, at most `concurrency` in
/// flight, each with fully recording-local state. Returns the folded
/// stats; per-recording failures never abort the batch.
pub async fn process_batch(
    orchestrator: Arc<Orchestrator>,
    entries: Vec<RecordingEntry>,
    input_dir: &Path,
    concurrency: usize,
) -> SegmentationStats {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut stats = SegmentationStats::default();

    for entry in entries {
        let audio_path = input_dir.join(&entry.file_name);
        if !audio_path.exists() {
            warn!("input file not found: {:?}", audio_path);
            stats.missing_inputs += 1;
            continue;
        }

        let orchestrator = Arc::clone(&orchestrator);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            // The semaphore is never closed while tasks are in flight
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            orchestrator
                .process_recording(&entry.source_id(), &audio_path, &entry.transcript)
                .await
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => stats.record(&outcome),
            Err(e) => {
                warn!("recording task failed to join: {e}");
                stats.failed += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_word(word: &str, case: &str, start: Option<f64>, end: Option<f64>) -> GentleWord {
        GentleWord {
            word: word.to_string(),
            case: case.to_string(),
            aligned_word: None,
            start,
            end,
            start_offset: None,
            end_offset: None,
        }
    }

    fn success(word: &str, start: f64, end: f64) -> GentleWord {
        wire_word(word, "success", Some(start), Some(end))
    }

    #[test]
    fn test_segment_words_short_word_merges_into_one_clip() {
        // "a" (0.05s) merges forward into "b"; the single 1.8s token packs
        // into exactly one clip spanning the full recording
        let words = vec![success("a", 0.0, 0.05), success("b", 0.05, 1.8)];

        let clips = segment_words(
            &words,
            1.8,
            &MergeConfig::default(),
            &PackConfig::default(),
        )
        .unwrap();

        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].start, 0.0);
        assert_eq!(clips[0].end, 1.8);
        assert_eq!(clips[0].tokens[0].text, "a b");
    }

    #[test]
    fn test_segment_words_short_source_is_a_skip() {
        let words = vec![success("a", 0.0, 0.6), success("b", 0.6, 1.2)];

        let err = segment_words(
            &words,
            1.2,
            &MergeConfig::default(),
            &PackConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, SpliceError::NoViableSegments));
    }

    #[test]
    fn test_segment_words_integrity_fault_produces_no_clips() {
        // Inverted timestamps on a success word fail before any packing
        let words = vec![wire_word("x", "success", Some(0.1), Some(0.05))];

        let err = segment_words(
            &words,
            5.0,
            &MergeConfig::default(),
            &PackConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, SpliceError::DataIntegrity(_)));
    }

    #[test]
    fn test_segment_words_is_idempotent() {
        let words: Vec<GentleWord> = (0..10)
            .map(|i| success(&format!("w{i}"), i as f64 * 0.4, (i + 1) as f64 * 0.4))
            .collect();

        let first = segment_words(&words, 4.0, &MergeConfig::default(), &PackConfig::default())
            .unwrap();
        let second = segment_words(&words, 4.0, &MergeConfig::default(), &PackConfig::default())
            .unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.index, b.index);
            assert_eq!(a.start, b.start);
            assert_eq!(a.end, b.end);
            assert_eq!(a.tokens.len(), b.tokens.len());
        }
    }

    #[test]
    fn test_stats_fold_outcomes() {
        let mut stats = SegmentationStats::default();

        stats.record(&RecordingOutcome::Materialized {
            source_id: "a".to_string(),
            clip_paths: vec![PathBuf::from("a/000_x.wav"), PathBuf::from("a/001_y.wav")],
        });
        stats.record(&RecordingOutcome::Rejected {
            source_id: "b".to_string(),
            reason: RejectReason::NoViableSegments,
        });
        stats.record(&RecordingOutcome::Rejected {
            source_id: "c".to_string(),
            reason: RejectReason::AlignmentUnavailable("connection refused".to_string()),
        });

        assert_eq!(stats.recordings_processed, 3);
        assert_eq!(stats.materialized, 1);
        assert_eq!(stats.clips_written, 2);
        assert_eq!(stats.skipped_no_segments, 1);
        assert_eq!(stats.failed, 1);
    }
}
