//! NPC module: records, proximity binding, cosmetic watch and state sync.
pub mod appearance;
pub mod components;
pub mod plugin;
pub mod proximity;
pub mod registry;
pub mod sync;
pub mod systems;

pub use plugin::NpcPlugin;
