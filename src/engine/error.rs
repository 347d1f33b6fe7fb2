use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures of one synthesis attempt. Terminal for that message only.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to initialize engine http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("audio_query failed: {status} - {body}")]
    Query { status: StatusCode, body: String },
    #[error("synthesis failed: {status} - {body}")]
    Render { status: StatusCode, body: String },
    #[error("synthesis engine unreachable: {0}")]
    Unavailable(#[source] reqwest::Error),
    #[error("failed to store artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
