//! Host surface: the local player's profile and avatar, peer-left notifications and teleports.
pub mod components;
pub mod events;
pub mod plugin;
pub mod systems;

pub use plugin::HostPlugin;
