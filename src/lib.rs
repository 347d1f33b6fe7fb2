//! koelink relays text chat messages into synthesized speech played back in
//! the sender's voice channel. Synthesis is delegated to a VOICEVOX-style
//! HTTP engine; the chat platform is reached through the traits in
//! [`voice::gateway`].

pub mod common;
pub mod config;
pub mod engine;
pub mod player;
pub mod relay;
pub mod text;
pub mod voice;

pub use config::Config;
pub use relay::SpeechRelay;
