//! MIDI Module
//!
//! Pad events from controllers and the highlight state they drive.

pub mod board;
pub mod events;
pub mod highlighter;

pub use board::{HighlightBoard, HighlightTicket, PadPhase, TriggerOutcome};
pub use events::{
    MidiPadEvent, PadContextAction, PadStop, PadTrigger, PlaybackMode, SustainedNoteInfo,
};
pub use highlighter::{HighlighterConfig, MidiPadHighlighter, DEFAULT_HIGHLIGHT_DURATION};
