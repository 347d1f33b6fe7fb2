//! Per-participant voice preferences.

use dashmap::DashMap;

use crate::common::types::{SpeakerId, UserId};

/// Participant → chosen speaker. Global per user, in-memory only,
/// last-writer-wins; the default applies when no choice was made.
pub struct VoicePrefs {
    default: SpeakerId,
    voices: DashMap<UserId, SpeakerId>,
}

impl VoicePrefs {
    pub fn new(default: SpeakerId) -> Self {
        Self {
            default,
            voices: DashMap::new(),
        }
    }

    pub fn set(&self, user: UserId, speaker: SpeakerId) {
        self.voices.insert(user, speaker);
    }

    pub fn speaker_for(&self, user: &UserId) -> SpeakerId {
        self.voices
            .get(user)
            .map(|s| s.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}
