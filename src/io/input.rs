use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

/// One recording named by the transcript manifest
#[derive(Debug, Clone)]
pub struct RecordingEntry {
    /// Audio file name relative to the input directory
    pub file_name: String,
    /// The transcript text to align against
    pub transcript: String,
}

impl RecordingEntry {
    /// Recording identifier: the file name without its extension
    pub fn source_id(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name.clone())
    }
}

/// Parse a transcript manifest file into recording entries
pub fn parse_transcript_file(path: &Path) -> Result<Vec<RecordingEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript file: {:?}", path))?;
    Ok(parse_transcript_lines(&content))
}

/// Parse `file-name<TAB>transcript` lines. Lines without a tab are ignored;
/// a repeated file name keeps the last transcript; entries come back sorted
/// by file name so runs are deterministic.
pub fn parse_transcript_lines(content: &str) -> Vec<RecordingEntry> {
    let mut transcripts: BTreeMap<String, String> = BTreeMap::new();

    for line in content.lines() {
        if let Some((file_name, transcript)) = line.trim().split_once('\t') {
            transcripts.insert(file_name.to_string(), transcript.to_string());
        }
    }

    transcripts
        .into_iter()
        .map(|(file_name, transcript)| RecordingEntry {
            file_name,
            transcript,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcript_lines() {
        let content = "b.mp3\tsecond recording\na.mp3\tfirst recording\nno tab here\n";
        let entries = parse_transcript_lines(content);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name, "a.mp3");
        assert_eq!(entries[0].transcript, "first recording");
        assert_eq!(entries[1].file_name, "b.mp3");
    }

    #[test]
    fn test_transcript_may_contain_tabs() {
        let entries = parse_transcript_lines("a.wav\tleft\tright\n");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].transcript, "left\tright");
    }

    #[test]
    fn test_duplicate_keeps_last() {
        let entries = parse_transcript_lines("a.wav\tfirst\na.wav\tsecond\n");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].transcript, "second");
    }

    #[test]
    fn test_source_id_strips_extension() {
        let entry = RecordingEntry {
            file_name: "speaker_01.mp3".to_string(),
            transcript: String::new(),
        };
        assert_eq!(entry.source_id(), "speaker_01");
    }
}
