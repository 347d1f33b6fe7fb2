//! Process-wide registry of per-guild playback destinations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;

use crate::common::types::GuildId;
use crate::player::queue::{Destination, PlaybackJob};
use crate::voice::gateway::VoiceConnection;

/// Owns every live [`Destination`]. Created on first use, removed on
/// teardown; no destination state lives outside this map.
pub struct DestinationRegistry {
    destinations: DashMap<GuildId, Arc<Destination>>,
    grace: Duration,
}

impl DestinationRegistry {
    pub fn new(grace: Duration) -> Self {
        Self {
            destinations: DashMap::new(),
            grace,
        }
    }

    pub fn get(&self, guild: &GuildId) -> Option<Arc<Destination>> {
        self.destinations.get(guild).map(|d| d.value().clone())
    }

    pub fn get_or_create(&self, guild: &GuildId) -> Arc<Destination> {
        self.destinations
            .entry(guild.clone())
            .or_insert_with(|| {
                debug!(%guild, "creating destination");
                Destination::new(guild.clone(), self.grace)
            })
            .value()
            .clone()
    }

    /// Appends a job to the guild's queue, creating the destination and its
    /// drain task on first use.
    pub fn enqueue(
        &self,
        guild: &GuildId,
        connection: Arc<dyn VoiceConnection>,
        artifact: PathBuf,
    ) {
        self.get_or_create(guild).enqueue(PlaybackJob {
            connection,
            artifact,
        });
    }

    /// Removes the guild's destination and shuts it down: pending jobs are
    /// discarded (and their artifacts reaped), the drain task stops, the
    /// connection is released. Returns whether a connection was released.
    pub async fn teardown(&self, guild: &GuildId) -> bool {
        match self.destinations.remove(guild) {
            Some((_, destination)) => {
                debug!(%guild, "tearing down destination");
                destination.shutdown().await
            }
            None => false,
        }
    }
}
