//! Client for a VOICEVOX-compatible synthesis engine.
//!
//! Synthesis is two sequential requests: `audio_query` turns text into a
//! query object, `synthesis` renders that object to WAV. The rendered audio
//! is persisted to a scratch file named after (author, message), so
//! concurrent messages can never collide on a path.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::ACCEPT;
use tracing::debug;

use crate::common::types::{MessageId, SpeakerId, UserId};
use crate::config::{ArtifactConfig, EngineConfig};
use crate::engine::error::EngineError;

pub struct EngineClient {
    http: reqwest::Client,
    base_url: String,
    scratch_dir: PathBuf,
}

impl EngineClient {
    pub fn new(engine: &EngineConfig, artifacts: &ArtifactConfig) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(engine.request_timeout_secs))
            .build()
            .map_err(EngineError::Client)?;
        Ok(Self {
            http,
            base_url: engine.base_url.clone(),
            scratch_dir: artifacts.scratch_dir.clone(),
        })
    }

    /// Scratch path for one message's audio. Deterministic so the reaper,
    /// the queue, and the client all agree on it without shared state.
    pub fn artifact_path(&self, author: &UserId, message: &MessageId) -> PathBuf {
        self.scratch_dir.join(format!("{author}_{message}.wav"))
    }

    /// Renders `text` with `speaker` and returns the written artifact path.
    ///
    /// Exactly one file is created on success; any failure leaves nothing
    /// behind. Errors are never retried here.
    pub async fn synthesize(
        &self,
        text: &str,
        speaker: &SpeakerId,
        author: &UserId,
        message: &MessageId,
    ) -> Result<PathBuf, EngineError> {
        let query_url = format!(
            "{}audio_query?text={}&speaker={}",
            self.base_url,
            urlencoding::encode(text),
            speaker
        );
        let response = self
            .http
            .post(&query_url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(EngineError::Unavailable)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Query { status, body });
        }
        let audio_query: serde_json::Value =
            response.json().await.map_err(EngineError::Unavailable)?;

        let synthesis_url = format!("{}synthesis?speaker={}", self.base_url, speaker);
        let response = self
            .http
            .post(&synthesis_url)
            .header(ACCEPT, "audio/wav")
            .json(&audio_query)
            .send()
            .await
            .map_err(EngineError::Unavailable)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Render { status, body });
        }
        let audio = response.bytes().await.map_err(EngineError::Unavailable)?;

        let path = self.artifact_path(author, message);
        if let Err(source) = tokio::fs::write(&path, &audio).await {
            // Never leave a partial artifact behind.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(EngineError::Artifact { path, source });
        }
        debug!(artifact = %path.display(), bytes = audio.len(), "synthesized message audio");
        Ok(path)
    }
}
