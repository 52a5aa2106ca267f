//! MIDI pad events, playback modes and pad context actions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a pad responds to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Plays through once; the highlight is a short flash
    #[default]
    OneShot,
    /// Plays while the note is held; the highlight lasts until note off
    NoteOnOff,
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackMode::OneShot => write!(f, "One Shot"),
            PlaybackMode::NoteOnOff => write!(f, "Note On/Off"),
        }
    }
}

/// A pad was triggered (note on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadTrigger {
    pub pad_index: usize,
    pub midi_note: u8,
    pub midi_channel: u8,
    pub velocity: u8,
    /// Source timestamp in milliseconds
    pub timestamp_ms: u64,
}

/// A pad's note was released (note off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadStop {
    pub pad_index: usize,
    pub midi_note: u8,
}

/// Inbound pad event. Triggers and stops arrive in real time order with no
/// guaranteed pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MidiPadEvent {
    Trigger(PadTrigger),
    Stop(PadStop),
}

impl MidiPadEvent {
    pub fn pad_index(&self) -> usize {
        match self {
            MidiPadEvent::Trigger(trigger) => trigger.pad_index,
            MidiPadEvent::Stop(stop) => stop.pad_index,
        }
    }
}

/// A note held on a pad in [`PlaybackMode::NoteOnOff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SustainedNoteInfo {
    pub pad_index: usize,
    pub midi_note: u8,
    pub midi_channel: u8,
    pub velocity: u8,
    pub start_time_ms: u64,
}

impl From<&PadTrigger> for SustainedNoteInfo {
    fn from(trigger: &PadTrigger) -> Self {
        Self {
            pad_index: trigger.pad_index,
            midi_note: trigger.midi_note,
            midi_channel: trigger.midi_channel,
            velocity: trigger.velocity,
            start_time_ms: trigger.timestamp_ms,
        }
    }
}

/// Actions offered by a pad's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PadContextAction {
    AssignSample { pad_index: usize },
    ConfigureMidi { pad_index: usize },
    AdjustVolume { pad_index: usize, volume: f32 },
    SetPlaybackMode { pad_index: usize, mode: PlaybackMode },
    CopyPad { pad_index: usize },
    PastePad { pad_index: usize },
    ClearPad { pad_index: usize },
}

impl PadContextAction {
    pub fn pad_index(&self) -> usize {
        match *self {
            PadContextAction::AssignSample { pad_index }
            | PadContextAction::ConfigureMidi { pad_index }
            | PadContextAction::AdjustVolume { pad_index, .. }
            | PadContextAction::SetPlaybackMode { pad_index, .. }
            | PadContextAction::CopyPad { pad_index }
            | PadContextAction::PastePad { pad_index }
            | PadContextAction::ClearPad { pad_index } => pad_index,
        }
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            PadContextAction::AssignSample { .. } => "Assign Sample",
            PadContextAction::ConfigureMidi { .. } => "Configure MIDI",
            PadContextAction::AdjustVolume { .. } => "Adjust Volume",
            PadContextAction::SetPlaybackMode { .. } => "Playback Mode",
            PadContextAction::CopyPad { .. } => "Copy Pad",
            PadContextAction::PastePad { .. } => "Paste Pad",
            PadContextAction::ClearPad { .. } => "Clear Pad",
        }
    }
}
