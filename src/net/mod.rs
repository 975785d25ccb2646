//! Scene broadcast channel: transport abstraction, message contracts and the ECS pump.
pub mod bus;
pub mod errors;
pub mod events;
pub mod loopback;
pub mod messages;
pub mod plugin;
pub mod systems;

pub use plugin::NetPlugin;
