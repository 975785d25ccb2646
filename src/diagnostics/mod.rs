//! Diagnostics module: sync decisions as messages, a rolling window and a JSON-lines log.
pub mod events;
pub mod plugin;
pub mod telemetry;

pub use events::SyncDiagnostic;
pub use plugin::DiagnosticsPlugin;
