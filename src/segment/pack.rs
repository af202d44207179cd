use tracing::debug;

use crate::models::{Clip, MergedToken};

/// Configuration for the clip packer
#[derive(Debug, Clone)]
pub struct PackConfig {
    /// Minimum accumulated duration for an emitted clip in seconds
    pub min_clip_duration: f64,
    /// Target maximum accumulated duration in seconds; crossing it forces a
    /// split, so a clip can exceed it by at most one token
    pub max_clip_duration: f64,
    /// Recordings shorter than this in total are rejected before packing
    pub min_source_duration: f64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            min_clip_duration: 1.5,
            max_clip_duration: 3.0,
            min_source_duration: 1.5,
        }
    }
}

/// Pack merged tokens into time-bounded clips.
///
/// Greedy single pass over the tokens with a running accumulator. Every
/// token except the last feeds the accumulator in turn: once the
/// accumulated duration lands inside `[min, max]` the accumulator is
/// flushed as a clip; past `max` it is force-flushed (still subject to the
/// minimum) and reset so no clip is held open indefinitely. The final token
/// never triggers an in-loop flush; it joins the leftover accumulator,
/// which becomes a last clip only if it reaches the minimum. Trailing
/// material below the minimum is dropped.
///
/// Returns an empty vector when the recording is too short to pack at all
/// or when nothing reaches the minimum; the caller treats that as a
/// per-recording rejection.
pub fn pack_clips(tokens: &[MergedToken], source_duration: f64, config: &PackConfig) -> Vec<Clip> {
    if source_duration < config.min_source_duration {
        debug!(
            "source duration {:.2}s below minimum {:.2}s, rejecting before packing",
            source_duration, config.min_source_duration
        );
        return Vec::new();
    }

    if tokens.is_empty() {
        return Vec::new();
    }

    let mut clips: Vec<Clip> = Vec::new();
    let mut accumulator: Vec<MergedToken> = Vec::new();
    let mut accumulated = 0.0_f64;
    let mut clip_index = 0;

    let (body, tail) = tokens.split_at(tokens.len() - 1);

    for token in body {
        accumulator.push(token.clone());
        accumulated += token.duration();

        if accumulated >= config.min_clip_duration && accumulated <= config.max_clip_duration {
            if let Some(clip) = Clip::from_tokens(clip_index, std::mem::take(&mut accumulator)) {
                clips.push(clip);
                clip_index += 1;
            }
            accumulated = 0.0;
        } else if accumulated > config.max_clip_duration {
            // Force split; the overflowing accumulator is kept only if it
            // reaches the minimum, and is discarded either way
            if accumulated >= config.min_clip_duration {
                if let Some(clip) = Clip::from_tokens(clip_index, std::mem::take(&mut accumulator)) {
                    clips.push(clip);
                    clip_index += 1;
                }
            }
            accumulator.clear();
            accumulated = 0.0;
        }
    }

    // The withheld final token joins whatever is left over; the combined
    // tail is flushed only if it reaches the minimum
    for token in tail {
        accumulator.push(token.clone());
        accumulated += token.duration();
    }
    if accumulated >= config.min_clip_duration {
        if let Some(clip) = Clip::from_tokens(clip_index, accumulator) {
            clips.push(clip);
        }
    } else if !accumulator.is_empty() {
        debug!(
            "dropping {:.2}s trailing remainder ({} tokens) below clip minimum",
            accumulated,
            accumulator.len()
        );
    }

    clips
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, start: f64, end: f64) -> MergedToken {
        MergedToken {
            text: text.to_string(),
            start,
            end,
        }
    }

    /// Ten contiguous tokens of the given duration starting at 0.0
    fn uniform_tokens(count: usize, duration: f64) -> Vec<MergedToken> {
        (0..count)
            .map(|i| {
                token(
                    &format!("w{i}"),
                    i as f64 * duration,
                    (i + 1) as f64 * duration,
                )
            })
            .collect()
    }

    #[test]
    fn test_single_token_recording() {
        // Scenario: one merged token "a b" spanning 0.0-1.8s
        let tokens = vec![token("a b", 0.0, 1.8)];
        let clips = pack_clips(&tokens, 1.8, &PackConfig::default());

        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].index, 0);
        assert_eq!(clips[0].start, 0.0);
        assert_eq!(clips[0].end, 1.8);
    }

    #[test]
    fn test_short_source_rejected_before_packing() {
        // Scenario: 1.2s source never reaches the packer loop
        let tokens = vec![token("a", 0.0, 0.6), token("b", 0.6, 1.2)];
        let clips = pack_clips(&tokens, 1.2, &PackConfig::default());

        assert!(clips.is_empty());
    }

    #[test]
    fn test_uniform_tokens_with_trailing_drop() {
        // Scenario: ten 0.4s tokens -> two clips of four tokens each, the
        // 0.8s tail (tokens 9-10) is below the minimum and dropped
        let tokens = uniform_tokens(10, 0.4);
        let clips = pack_clips(&tokens, 4.0, &PackConfig::default());

        assert_eq!(clips.len(), 2);

        assert_eq!(clips[0].index, 0);
        assert_eq!(clips[0].tokens.len(), 4);
        assert_eq!(clips[0].start, 0.0);
        assert!((clips[0].end - 1.6).abs() < 1e-9);

        assert_eq!(clips[1].index, 1);
        assert_eq!(clips[1].tokens.len(), 4);
        assert!((clips[1].start - 1.6).abs() < 1e-9);
        assert!((clips[1].end - 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_forced_split_on_overflow() {
        // 1.4s accumulated, then a 2.0s token overflows the 3.0s target:
        // the 3.4s accumulator is force-flushed as one clip
        let tokens = vec![
            token("a", 0.0, 1.4),
            token("b", 1.4, 3.4),
            token("c", 3.4, 5.0),
        ];
        let clips = pack_clips(&tokens, 5.0, &PackConfig::default());

        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].tokens.len(), 2);
        let over = clips[0].packed_duration() - 3.0;
        // May exceed the target by at most the overflowing token
        assert!(over > 0.0 && over <= 2.0);
        // The withheld final token still reaches the minimum on its own
        assert_eq!(clips[1].tokens.len(), 1);
    }

    #[test]
    fn test_overflowing_leftover_below_minimum_is_discarded() {
        // A single token longer than the target flushes alone; nothing is
        // carried into the next clip
        let config = PackConfig {
            min_clip_duration: 1.5,
            max_clip_duration: 3.0,
            min_source_duration: 1.5,
        };
        let tokens = vec![token("long", 0.0, 3.5), token("tail", 3.5, 3.9)];
        let clips = pack_clips(&tokens, 3.9, &config);

        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].tokens.len(), 1);
        assert_eq!(clips[0].tokens[0].text, "long");
    }

    #[test]
    fn test_boundary_durations_inclusive() {
        // Exactly 1.5s flushes; exactly 3.0s flushes without a forced split
        let tokens = vec![
            token("a", 0.0, 1.5),
            token("b", 1.5, 4.5),
            token("c", 4.5, 6.5),
        ];
        let clips = pack_clips(&tokens, 6.5, &PackConfig::default());

        assert_eq!(clips.len(), 3);
        assert!((clips[0].packed_duration() - 1.5).abs() < 1e-9);
        assert!((clips[1].packed_duration() - 3.0).abs() < 1e-9);
        assert!((clips[2].packed_duration() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_final_token_joins_leftover() {
        // 1.2s leftover plus a 0.5s final token crosses the minimum and is
        // flushed as the last clip
        let tokens = vec![
            token("a", 0.0, 1.6),
            token("b", 1.6, 2.8),
            token("c", 2.8, 3.3),
        ];
        let clips = pack_clips(&tokens, 3.3, &PackConfig::default());

        assert_eq!(clips.len(), 2);
        assert_eq!(clips[1].tokens.len(), 2);
        assert!((clips[1].packed_duration() - 1.7).abs() < 1e-9);
    }

    #[test]
    fn test_no_viable_clips() {
        // Long enough source, but nothing accumulates to the minimum
        let tokens = vec![token("a", 0.0, 0.4), token("b", 1.4, 1.8)];
        let clips = pack_clips(&tokens, 1.8, &PackConfig::default());

        assert!(clips.is_empty());
    }

    #[test]
    fn test_clip_indices_are_contiguous() {
        let tokens = uniform_tokens(16, 0.4);
        let clips = pack_clips(&tokens, 6.4, &PackConfig::default());

        for (i, clip) in clips.iter().enumerate() {
            assert_eq!(clip.index, i);
        }
    }

    #[test]
    fn test_idempotent_on_same_input() {
        let tokens = uniform_tokens(10, 0.4);
        let first = pack_clips(&tokens, 4.0, &PackConfig::default());
        let second = pack_clips(&tokens, 4.0, &PackConfig::default());

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.index, b.index);
            assert_eq!(a.start, b.start);
            assert_eq!(a.end, b.end);
        }
    }
}
