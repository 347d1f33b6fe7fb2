//! Orchestration: wires the normalizer, engine client, connection manager,
//! and playback queues behind the platform boundary, and exposes the
//! command surface.

pub mod commands;
pub mod prefs;

pub use commands::CommandError;
pub use prefs::VoicePrefs;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::engine::{EngineClient, EngineError};
use crate::player::registry::DestinationRegistry;
use crate::player::reaper;
use crate::text::normalize;
use crate::voice::gateway::{InboundMessage, VoiceGateway, VoiceStateChange};
use crate::voice::manager::ConnectionManager;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create scratch directory {path}: {source}")]
    Scratch {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// The speech pipeline. One instance serves every guild the bot is in;
/// event handlers take `&self` and may run concurrently; only playback is
/// serialized, per destination, by the queues.
pub struct SpeechRelay {
    engine: EngineClient,
    registry: Arc<DestinationRegistry>,
    manager: ConnectionManager,
    prefs: VoicePrefs,
    max_text_length: usize,
}

impl SpeechRelay {
    pub fn new(config: &Config, gateway: Arc<dyn VoiceGateway>) -> Result<Self, InitError> {
        std::fs::create_dir_all(&config.artifacts.scratch_dir).map_err(|source| {
            InitError::Scratch {
                path: config.artifacts.scratch_dir.display().to_string(),
                source,
            }
        })?;
        let engine = EngineClient::new(&config.engine, &config.artifacts)?;
        let registry = Arc::new(DestinationRegistry::new(Duration::from_secs(
            config.artifacts.delete_grace_secs,
        )));
        info!(
            engine = %config.engine.base_url,
            scratch = %config.artifacts.scratch_dir.display(),
            "speech relay ready"
        );
        Ok(Self {
            engine,
            registry: registry.clone(),
            manager: ConnectionManager::new(gateway, registry),
            prefs: VoicePrefs::new(config.speech.default_speaker.clone()),
            max_text_length: config.speech.max_text_length,
        })
    }

    /// Passive message-to-speech path. Failures are terminal for this one
    /// message and intentionally silent toward chat: they are logged and
    /// the message's speech is dropped.
    pub async fn handle_message(&self, message: InboundMessage) {
        if message.author_is_bot {
            return;
        }

        let text = normalize(&message.content, self.max_text_length);
        if text.trim().is_empty() {
            return;
        }

        // Fail before the synthesis round trip when we could never play.
        if let Err(e) = self.manager.preflight(message.voice_channel.as_ref()) {
            debug!(guild = %message.guild_id, "dropping message: {e}");
            return;
        }

        let speaker = self.prefs.speaker_for(&message.author_id);
        let artifact = match self
            .engine
            .synthesize(&text, &speaker, &message.author_id, &message.message_id)
            .await
        {
            Ok(path) => path,
            Err(e @ EngineError::Unavailable(_)) => {
                error!(guild = %message.guild_id, "{e}");
                return;
            }
            Err(e) => {
                warn!(guild = %message.guild_id, "{e}");
                return;
            }
        };

        match self
            .manager
            .ensure(&message.guild_id, message.voice_channel.as_ref())
            .await
        {
            Ok(ensured) => {
                self.registry.enqueue(
                    &message.guild_id,
                    ensured.connection().clone(),
                    artifact,
                );
            }
            Err(e) => {
                // Synthesized but nowhere to play: reap right away.
                debug!(guild = %message.guild_id, "dropping synthesized message: {e}");
                reaper::schedule_removal(artifact, Duration::ZERO);
            }
        }
    }

    /// Voice-occupancy change from the platform.
    pub async fn handle_voice_update(&self, change: VoiceStateChange) {
        self.manager.handle_voice_update(&change).await;
    }

    pub(crate) fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub(crate) fn registry(&self) -> &DestinationRegistry {
        &self.registry
    }

    pub(crate) fn prefs(&self) -> &VoicePrefs {
        &self.prefs
    }
}
