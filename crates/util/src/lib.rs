//! Radtest shared utilities: preset storage, configuration, and redaction.

pub mod config;
pub mod presets;
pub mod redact;

pub use config::AppConfig;
pub use presets::{InMemoryPresetStore, JsonPresetStore, PresetStore, PresetStoreError, builtin_presets};
pub use redact::redact_secrets;
