//! Voice connection lifecycle: acquire, reuse, move, and tear down.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::common::types::{ChannelId, GuildId};
use crate::player::registry::DestinationRegistry;
use crate::voice::gateway::{GatewayError, VoiceConnection, VoiceGateway, VoiceStateChange};

/// Why a connection could not be provided. The passive message path treats
/// every variant as a silent drop; commands surface the `Display` text.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("join a voice channel first")]
    NotInVoice,
    #[error("missing connect or speak permission in channel {channel}")]
    PermissionDenied { channel: ChannelId },
    #[error("voice gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// How [`ConnectionManager::ensure`] satisfied the request.
pub enum Ensured {
    /// A new connection was opened to the requested channel.
    Joined(Arc<dyn VoiceConnection>),
    /// An existing connection was moved to the requested channel.
    Moved(Arc<dyn VoiceConnection>),
    /// The existing connection already occupied the requested channel.
    Reused(Arc<dyn VoiceConnection>),
}

impl Ensured {
    pub fn connection(&self) -> &Arc<dyn VoiceConnection> {
        match self {
            Ensured::Joined(c) | Ensured::Moved(c) | Ensured::Reused(c) => c,
        }
    }
}

pub struct ConnectionManager {
    gateway: Arc<dyn VoiceGateway>,
    registry: Arc<DestinationRegistry>,
}

impl ConnectionManager {
    pub fn new(gateway: Arc<dyn VoiceGateway>, registry: Arc<DestinationRegistry>) -> Self {
        Self { gateway, registry }
    }

    /// Checks the preconditions of [`ConnectionManager::ensure`] without
    /// touching the gateway: the requester must occupy a voice channel the
    /// bot may connect to and speak in. Lets the message path fail before
    /// paying for a synthesis round trip.
    pub fn preflight<'a>(
        &self,
        requested: Option<&'a ChannelId>,
    ) -> Result<&'a ChannelId, JoinError> {
        let channel = requested.ok_or(JoinError::NotInVoice)?;
        let permissions = self.gateway.permissions(channel);
        if !permissions.connect || !permissions.speak {
            return Err(JoinError::PermissionDenied {
                channel: channel.clone(),
            });
        }
        Ok(channel)
    }

    /// Provides a live connection to `requested` for `guild`: reuses the
    /// current one, moves it, or opens a fresh one (output-only, so always
    /// self-deafened). The handle is stored on the guild's destination.
    pub async fn ensure(
        &self,
        guild: &GuildId,
        requested: Option<&ChannelId>,
    ) -> Result<Ensured, JoinError> {
        let channel = self.preflight(requested)?;
        let destination = self.registry.get_or_create(guild);

        if let Some(connection) = destination.connection() {
            if connection.is_connected() {
                if connection.channel_id() == *channel {
                    return Ok(Ensured::Reused(connection));
                }
                connection.move_to(channel).await?;
                info!(%guild, %channel, "moved voice connection");
                return Ok(Ensured::Moved(connection));
            }
        }

        let connection = self.gateway.connect(guild, channel, true).await?;
        destination.set_connection(connection.clone());
        info!(%guild, %channel, "opened voice connection");
        Ok(Ensured::Joined(connection))
    }

    /// Reacts to a voice-occupancy change: when the channel our connection
    /// occupies has no non-bot occupants left, the destination is torn down
    /// (pending queue cleared, connection released).
    pub async fn handle_voice_update(&self, change: &VoiceStateChange) {
        if change.is_bot {
            return;
        }
        let Some(before) = &change.before else {
            return;
        };
        let Some(destination) = self.registry.get(&change.guild_id) else {
            return;
        };
        let Some(connection) = destination.connection() else {
            return;
        };
        if !connection.is_connected() || connection.channel_id() != *before {
            return;
        }
        if self.gateway.non_bot_occupants(before) == 0 {
            info!(guild = %change.guild_id, channel = %before, "voice channel empty, disconnecting");
            if !self.registry.teardown(&change.guild_id).await {
                warn!(guild = %change.guild_id, "destination vanished during teardown");
            }
        } else {
            debug!(guild = %change.guild_id, channel = %before, "occupants remain, staying connected");
        }
    }

    /// Explicit leave. Identical queue-clearing semantics to the automatic
    /// teardown. Returns whether a connection was actually released.
    pub async fn leave(&self, guild: &GuildId) -> bool {
        self.registry.teardown(guild).await
    }
}
