pub mod gateway;
pub mod manager;

pub use gateway::{
    ChannelPermissions, GatewayError, InboundMessage, PlaybackError, VoiceConnection,
    VoiceGateway, VoiceStateChange,
};
pub use manager::{ConnectionManager, Ensured, JoinError};
