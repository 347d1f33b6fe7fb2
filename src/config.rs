use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::types::SpeakerId;

const CONFIG_FILE: &str = "koelink.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub speech: SpeechConfig,
    pub artifacts: ArtifactConfig,
}

/// Synthesis engine endpoint settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the VOICEVOX-compatible engine.
    pub base_url: String,
    /// Total per-request timeout. A stalled engine surfaces as
    /// `EngineError::Unavailable` instead of hanging the pipeline.
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:50021/".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speaker used when a participant has not picked one.
    pub default_speaker: SpeakerId,
    /// Spoken-text length cap, in characters, before the truncation marker.
    pub max_text_length: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_speaker: SpeakerId::from("6"),
            max_text_length: 150,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Scratch directory for synthesized WAV files.
    pub scratch_dir: PathBuf,
    /// Grace delay between playback completion and artifact deletion.
    pub delete_grace_secs: u64,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("sounds"),
            delete_grace_secs: 5,
        }
    }
}

impl Config {
    /// Reads `koelink.toml` when present, then applies environment
    /// overrides. A missing file is not an error; defaults apply.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(raw) => toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: CONFIG_FILE.to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: CONFIG_FILE.to_string(),
                    source,
                });
            }
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        config.normalize();
        Ok(config)
    }

    /// Environment-only variant of [`Config::load`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_from(|key| std::env::var(key).ok())?;
        config.normalize();
        Ok(config)
    }

    fn apply_env_from(
        &mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = get("VOICEVOX_URL") {
            self.engine.base_url = url;
        }
        if let Some(speaker) = get("DEFAULT_VOICE") {
            self.speech.default_speaker = SpeakerId(speaker);
        }
        if let Some(raw) = get("MAX_MESSAGE_LENGTH") {
            self.speech.max_text_length = parse_env("MAX_MESSAGE_LENGTH", &raw)?;
        }
        if let Some(raw) = get("FILE_DELETE_DELAY") {
            self.artifacts.delete_grace_secs = parse_env("FILE_DELETE_DELAY", &raw)?;
        }
        if let Some(dir) = get("SOUNDS_DIR") {
            self.artifacts.scratch_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get("ENGINE_TIMEOUT") {
            self.engine.request_timeout_secs = parse_env("ENGINE_TIMEOUT", &raw)?;
        }
        Ok(())
    }

    fn normalize(&mut self) {
        // Request URLs are built by appending the endpoint name.
        if !self.engine.base_url.ends_with('/') {
            self.engine.base_url.push('/');
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: raw.to_string(),
    })
}
