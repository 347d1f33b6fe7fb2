//! The command surface exposed to the chat platform's slash commands.
//!
//! Each command returns a short acknowledgement for an ephemeral reply; a
//! failed command returns a [`CommandError`] whose `Display` is the entire
//! user-facing notice.

use thiserror::Error;

use crate::common::types::{ChannelId, GuildId, SpeakerId, UserId};
use crate::relay::SpeechRelay;
use crate::voice::manager::{Ensured, JoinError};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("join a voice channel first")]
    NotInVoice,
    #[error("I need permission to connect and speak in that channel")]
    PermissionDenied,
    #[error("not connected to a voice channel")]
    NotConnected,
    #[error("nothing is playing right now")]
    NothingPlaying,
    #[error("voice gateway error: {0}")]
    Gateway(String),
}

impl From<JoinError> for CommandError {
    fn from(e: JoinError) -> Self {
        match e {
            JoinError::NotInVoice => CommandError::NotInVoice,
            JoinError::PermissionDenied { .. } => CommandError::PermissionDenied,
            JoinError::Gateway(e) => CommandError::Gateway(e.to_string()),
        }
    }
}

impl SpeechRelay {
    /// `/join`: connect to (or move to) the requester's voice channel.
    pub async fn join(
        &self,
        guild: &GuildId,
        voice_channel: Option<&ChannelId>,
    ) -> Result<String, CommandError> {
        match self.manager().ensure(guild, voice_channel).await? {
            Ensured::Reused(c) => Ok(format!("already connected to <#{}>", c.channel_id())),
            Ensured::Moved(c) => Ok(format!("moved to <#{}>", c.channel_id())),
            Ensured::Joined(c) => Ok(format!("joined <#{}>", c.channel_id())),
        }
    }

    /// `/leave`: disconnect and drop everything queued for this guild.
    pub async fn leave(&self, guild: &GuildId) -> Result<String, CommandError> {
        if self.manager().leave(guild).await {
            Ok("left the voice channel".to_string())
        } else {
            Err(CommandError::NotConnected)
        }
    }

    /// `/skip`: stop the message being spoken right now.
    pub fn skip(&self, guild: &GuildId) -> Result<String, CommandError> {
        let skipped = self
            .registry()
            .get(guild)
            .is_some_and(|destination| destination.skip());
        if skipped {
            Ok("skipped the current message".to_string())
        } else {
            Err(CommandError::NothingPlaying)
        }
    }

    /// `/clear`: drop every queued message without touching the one
    /// currently being spoken.
    pub fn clear_queue(&self, guild: &GuildId) -> Result<String, CommandError> {
        let cleared = self
            .registry()
            .get(guild)
            .map_or(0, |destination| destination.clear());
        if cleared == 0 {
            Ok("the queue is already empty".to_string())
        } else {
            Ok(format!("cleared {cleared} queued message(s)"))
        }
    }

    /// `/setvoice`: remember the requester's preferred speaker.
    pub fn set_voice(&self, user: &UserId, speaker: SpeakerId) -> String {
        self.prefs().set(user.clone(), speaker.clone());
        format!("voice set to speaker {speaker}")
    }
}
