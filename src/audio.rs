use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::SpliceError;

/// In-memory mono 16-bit PCM audio, the cut-and-encode primitive.
///
/// The whole source recording is decoded once; clips are built by
/// concatenating millisecond-offset spans and encoded back out at the
/// source sample rate. Seconds-to-milliseconds conversion happens at this
/// boundary only.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// An empty buffer at the given sample rate, for clip accumulation
    pub fn empty(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
        }
    }

    pub fn from_samples(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decode a WAV file. Only mono 16-bit integer PCM is accepted; format
    /// conversion belongs to an upstream collaborator.
    pub fn from_wav_file(path: &Path) -> Result<Self, SpliceError> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        if spec.channels != 1 || spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int
        {
            return Err(SpliceError::AudioFormat(format!(
                "expected mono 16-bit PCM, got {} channel(s) at {} bits ({:?})",
                spec.channels, spec.bits_per_sample, spec.sample_format
            )));
        }

        let samples = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// The samples between two millisecond offsets, clamped to the buffer
    pub fn span_ms(&self, start_ms: u64, end_ms: u64) -> &[i16] {
        let start = self.ms_to_sample(start_ms).min(self.samples.len());
        let end = self.ms_to_sample(end_ms).min(self.samples.len());
        &self.samples[start..end.max(start)]
    }

    /// Append a span of samples to this buffer
    pub fn push_span(&mut self, span: &[i16]) {
        self.samples.extend_from_slice(span);
    }

    /// Encode as mono 16-bit PCM WAV
    pub fn write_wav(&self, path: &Path) -> Result<(), SpliceError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    fn ms_to_sample(&self, ms: u64) -> usize {
        (ms as u128 * self.sample_rate as u128 / 1000) as usize
    }
}
