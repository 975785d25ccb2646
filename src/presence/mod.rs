//! Presence tracking and the seniority rule built on it.
pub mod election;
pub mod plugin;
pub mod roster;
pub mod systems;

pub use plugin::PresencePlugin;
pub use roster::{JoinTimestamp, PeerId, PresenceRoster};
