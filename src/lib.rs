//! Padboard - Drum Sampler UI State
//!
//! Padboard holds the UI-side state of a pad-based drum sampler:
//! 1. Layout - responsive screen classification, panel visibility and section collapse
//! 2. Presets - named layout snapshots persisted through a preference store
//! 3. MIDI - pad highlighting driven by incoming trigger and stop events
//!
//! # Architecture
//!
//! Every piece of observable state is held in a `tokio::sync::watch`
//! channel. Observers always see the latest value, rapid updates coalesce,
//! and writing an unchanged value publishes nothing.

pub mod cli;
pub mod error;
pub mod layout;
pub mod midi;
pub mod presets;

pub use error::{PadboardError, Result};
