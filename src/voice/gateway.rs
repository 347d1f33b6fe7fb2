//! The chat-platform boundary.
//!
//! The platform's gateway, event dispatch, and audio transport live outside
//! this crate. Everything the pipeline needs from them is expressed here as
//! two object-safe traits plus plain event structs; the embedding bot feeds
//! events in and supplies the trait implementations.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::common::types::{ChannelId, GuildId, MessageId, UserId};

/// Opaque platform-side failure while connecting or moving.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct GatewayError(pub String);

/// Player-reported mid-playback failure.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PlaybackError(pub String);

/// What the bot may do in a given voice channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPermissions {
    pub connect: bool,
    pub speak: bool,
}

/// An inbound text message, pre-cleaned by the platform layer.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub guild_id: GuildId,
    pub message_id: MessageId,
    pub author_id: UserId,
    pub author_is_bot: bool,
    pub content: String,
    /// Voice channel the author currently occupies, if any.
    pub voice_channel: Option<ChannelId>,
}

/// A participant moved between voice channels (or joined/left).
#[derive(Debug, Clone)]
pub struct VoiceStateChange {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub is_bot: bool,
    pub before: Option<ChannelId>,
    pub after: Option<ChannelId>,
}

/// A live voice connection handle supplied by the platform.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Channel the connection currently occupies.
    fn channel_id(&self) -> ChannelId;

    fn is_connected(&self) -> bool;

    /// Plays one artifact to completion. Resolves when playback finishes,
    /// fails mid-stream, or [`VoiceConnection::stop`] is called.
    async fn play(&self, artifact: &Path) -> Result<(), PlaybackError>;

    /// Stops the in-flight playback, resolving the pending `play` future.
    fn stop(&self);

    async fn move_to(&self, channel: &ChannelId) -> Result<(), GatewayError>;

    async fn disconnect(&self);
}

/// Voice capabilities of the chat platform.
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    async fn connect(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
        self_deaf: bool,
    ) -> Result<Arc<dyn VoiceConnection>, GatewayError>;

    fn permissions(&self, channel: &ChannelId) -> ChannelPermissions;

    /// Occupants of `channel` that are not bots.
    fn non_bot_occupants(&self, channel: &ChannelId) -> usize;
}
