pub mod client;
pub mod error;

pub use client::EngineClient;
pub use error::EngineError;
