//! Core timing shared by every scene plugin.
pub mod plugin;

pub use plugin::{CorePlugin, SimulationClock};
