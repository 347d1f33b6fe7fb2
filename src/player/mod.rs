pub mod queue;
pub mod registry;
pub mod reaper;

pub use queue::{Destination, PlaybackJob};
pub use registry::DestinationRegistry;
