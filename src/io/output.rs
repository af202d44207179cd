use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::audio::AudioBuffer;
use crate::error::SpliceError;
use crate::models::SegmentationResult;

/// Write a recording's accepted clips under `output_root/<source_id>/`.
///
/// All-or-nothing at the directory level: an empty result creates nothing,
/// and a failure partway through removes the whole directory before the
/// error is returned, so a rejected recording leaves no trace.
pub fn materialize_clips(
    source: &AudioBuffer,
    result: &SegmentationResult,
    output_root: &Path,
) -> Result<Vec<PathBuf>, SpliceError> {
    if result.clips.is_empty() {
        return Err(SpliceError::NoViableSegments);
    }

    let clip_dir = output_root.join(&result.source_id);
    std::fs::create_dir_all(&clip_dir)?;

    match write_clip_files(source, result, &clip_dir) {
        Ok(paths) => Ok(paths),
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_dir_all(&clip_dir) {
                warn!(
                    "failed to roll back partial output {:?}: {}",
                    clip_dir, cleanup
                );
            }
            Err(e)
        }
    }
}

fn write_clip_files(
    source: &AudioBuffer,
    result: &SegmentationResult,
    clip_dir: &Path,
) -> Result<Vec<PathBuf>, SpliceError> {
    let mut paths = Vec::with_capacity(result.clips.len());

    for clip in &result.clips {
        let mut buffer = AudioBuffer::empty(source.sample_rate());
        for token in &clip.tokens {
            // Seconds convert to integer milliseconds only here, at the
            // cutting boundary
            let start_ms = (token.start * 1000.0) as u64;
            let end_ms = (token.end * 1000.0) as u64;
            buffer.push_span(source.span_ms(start_ms, end_ms));
        }

        let path = clip_dir.join(clip.file_name());
        buffer.write_wav(&path)?;
        paths.push(path);
    }

    Ok(paths)
}

/// One line of the shared run manifest
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    /// Identifier of the batch run that produced this entry
    pub run_id: String,
    /// Source recording identifier
    pub source_id: String,
    /// Clip file names in temporal order
    pub clips: Vec<String>,
    pub clip_count: usize,
    pub processed_at: DateTime<Utc>,
}

/// Append-only JSON-lines manifest shared across concurrent recordings.
///
/// Appends are serialized behind a mutex; this is the only cross-recording
/// structure in a batch run.
pub struct ManifestWriter {
    run_id: String,
    writer: Mutex<BufWriter<File>>,
}

impl ManifestWriter {
    /// Create (or truncate) the manifest file for a new run
    pub fn create(path: &Path) -> Result<Self, SpliceError> {
        let file = File::create(path)?;
        Ok(Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Append one materialized recording to the manifest
    pub fn append(&self, source_id: &str, clip_paths: &[PathBuf]) -> Result<(), SpliceError> {
        let entry = ManifestEntry {
            run_id: self.run_id.clone(),
            source_id: source_id.to_string(),
            clips: clip_paths
                .iter()
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect(),
            clip_count: clip_paths.len(),
            processed_at: Utc::now(),
        };

        let line = serde_json::to_string(&entry)
            .map_err(|e| SpliceError::Io(std::io::Error::other(e)))?;

        let mut writer = self.writer.lock().expect("manifest writer lock poisoned");
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}
