use crate::models::{AlignmentWord, MergedToken};

/// Configuration for the word merger
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Minimum spoken duration for a standalone token in seconds
    pub min_word_duration: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_word_duration: 0.2,
        }
    }
}

/// Merge sub-threshold alignment words into tokens of usable duration.
///
/// Single left-to-right pass:
/// 1. Failed words are skipped outright and contribute nothing.
/// 2. A success word at or above the threshold becomes its own token.
/// 3. A short success word merges forward into the next success word
///    (scanning past failed words), space-joining the text and spanning
///    from the short word's start to the next word's end.
/// 4. With no later success word it merges backward into the previously
///    emitted token; with no previous token either it is emitted as-is, so
///    a one-word recording is never discarded here.
pub fn merge_short_words(words: &[AlignmentWord], config: &MergeConfig) -> Vec<MergedToken> {
    let mut merged: Vec<MergedToken> = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let word = &words[i];
        if !word.is_success() {
            i += 1;
            continue;
        }

        if word.duration() >= config.min_word_duration {
            merged.push(MergedToken {
                text: word.text.clone(),
                start: word.start,
                end: word.end,
            });
            i += 1;
            continue;
        }

        // Scan forward past failed words for a merge partner
        let mut j = i + 1;
        while j < words.len() && !words[j].is_success() {
            j += 1;
        }

        if j < words.len() {
            let next = &words[j];
            merged.push(MergedToken {
                text: format!("{} {}", word.text, next.text),
                start: word.start,
                end: next.end,
            });
            i = j + 1;
        } else if let Some(previous) = merged.last_mut() {
            // No later success word; fold into the previous token
            previous.text.push(' ');
            previous.text.push_str(&word.text);
            previous.end = word.end;
            i += 1;
        } else {
            // First and only word, and it is short: emit it anyway
            merged.push(MergedToken {
                text: word.text.clone(),
                start: word.start,
                end: word.end,
            });
            i += 1;
        }
    }

    merged
}
