//! Scene module: configuration, entry gate and the plugin assembling every scene system.
pub mod config;
pub mod phase;
pub mod plugin;

pub use plugin::{ScenePlugin, SceneSet};

#[cfg(test)]
mod tests;
