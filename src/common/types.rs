//! Strongly typed identifiers shared across the crate.
//!
//! All platform ids are carried as opaque strings; the crate never parses
//! or arithmetically compares them.

macro_rules! define_id {
    ($(#[$doc:meta] $name:ident),* $(,)?) => {
        $(
            #[$doc]
            #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub String);

            impl From<String> for $name {
                fn from(s: String) -> Self {
                    Self(s)
                }
            }

            impl From<&str> for $name {
                fn from(s: &str) -> Self {
                    Self(s.to_string())
                }
            }

            impl std::ops::Deref for $name {
                type Target = str;
                fn deref(&self) -> &Self::Target {
                    &self.0
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

define_id! {
    /// One voice-channel-serving scope (a guild).
    GuildId,
    /// A voice channel inside a guild.
    ChannelId,
    /// A chat participant.
    UserId,
    /// One inbound chat message.
    MessageId,
    /// A synthesis-engine speaker, as passed in the `speaker` query parameter.
    SpeakerId,
}
