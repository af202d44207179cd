use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::error::SpliceError;
use crate::models::GentleResponse;

const DEFAULT_ALIGNER_URL: &str = "http://localhost:8765";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the forced-alignment service client
#[derive(Debug, Clone)]
pub struct AlignerConfig {
    /// Base URL of the aligner (e.g. "http://localhost:8765")
    pub base_url: String,
    /// Upper bound on one alignment request; a timeout rejects the
    /// recording, it never crashes the run
    pub timeout: Duration,
}

impl AlignerConfig {
    /// Create config from the GENTLE_URL environment variable, falling back
    /// to the local default
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("GENTLE_URL").unwrap_or_else(|_| DEFAULT_ALIGNER_URL.to_string());
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create with a custom base URL
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Client for a Gentle-style forced-alignment service
pub struct AlignerClient {
    client: Client,
    config: AlignerConfig,
}

impl AlignerClient {
    pub fn new(config: AlignerConfig) -> Result<Self, SpliceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                SpliceError::AlignmentUnavailable(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client, config })
    }

    /// Align a recording against its transcript.
    ///
    /// Uploads the audio bytes and transcript as a multipart form and
    /// returns the aligner's word list. Transport failures, timeouts,
    /// non-success statuses, and undecodable bodies all surface as
    /// `AlignmentUnavailable`.
    pub async fn align(
        &self,
        audio_path: &Path,
        transcript: &str,
    ) -> Result<GentleResponse, SpliceError> {
        let audio_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        let form = Form::new()
            .part("audio", Part::bytes(audio_bytes).file_name(file_name))
            .text("transcript", transcript.to_string());

        let url = format!(
            "{}/transcriptions?async=false",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpliceError::AlignmentUnavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SpliceError::AlignmentUnavailable(format!(
                "aligner returned {status}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            SpliceError::AlignmentUnavailable(format!("malformed aligner response: {e}"))
        })
    }
}
