//! Presets Module
//!
//! Named layout snapshots, the preference store that persists them, and the
//! manager that turns store streams into UI state.

pub mod fan_in;
pub mod manager;
pub mod preset;
pub mod store;

pub use fan_in::{PreferenceFanIn, PreferenceInputs};
pub use manager::{LayoutPresetManager, PresetUiState, UNKNOWN_PRESET_NAME};
pub use preset::{export_preset, parse_exported, preset_checksum, LayoutPreset};
pub use store::{JsonPreferenceStore, PreferenceStore};
