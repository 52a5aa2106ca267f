//! Pad highlight state machine
//!
//! Per pad: `Idle -> Highlighted -> (Idle | Sustained) -> Idle`.
//!
//! Every change to a pad bumps that pad's generation. A delayed
//! de-highlight carries the generation it was scheduled for in a
//! [`HighlightTicket`] and only takes effect if the pad has not moved on
//! since, so a stale timer can never retract a newer highlight.

use std::collections::{BTreeMap, BTreeSet};

use crate::midi::events::{PadTrigger, PlaybackMode, SustainedNoteInfo};

/// Where a pad is in its highlight lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadPhase {
    Idle,
    Highlighted,
    Sustained,
}

/// Permission to de-highlight one pad at one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightTicket {
    pub pad_index: usize,
    pub generation: u64,
}

/// What a trigger left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Held until a matching stop
    Sustained,
    /// Expires when the ticket is redeemed
    Timed(HighlightTicket),
}

/// Highlighted pads and sustained notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightBoard {
    highlighted: BTreeSet<usize>,
    sustained: BTreeMap<usize, SustainedNoteInfo>,
    generations: BTreeMap<usize, u64>,
}

impl HighlightBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlighted_pads(&self) -> &BTreeSet<usize> {
        &self.highlighted
    }

    pub fn is_highlighted(&self, pad_index: usize) -> bool {
        self.highlighted.contains(&pad_index)
    }

    pub fn sustained_note(&self, pad_index: usize) -> Option<&SustainedNoteInfo> {
        self.sustained.get(&pad_index)
    }

    pub fn sustained_notes(&self) -> impl Iterator<Item = &SustainedNoteInfo> {
        self.sustained.values()
    }

    pub fn phase(&self, pad_index: usize) -> PadPhase {
        if self.sustained.contains_key(&pad_index) {
            PadPhase::Sustained
        } else if self.highlighted.contains(&pad_index) {
            PadPhase::Highlighted
        } else {
            PadPhase::Idle
        }
    }

    fn bump(&mut self, pad_index: usize) -> u64 {
        let generation = self.generations.entry(pad_index).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Highlight a triggered pad. A new trigger replaces any earlier
    /// sustained note on the same pad.
    pub fn trigger(&mut self, trigger: &PadTrigger, mode: PlaybackMode) -> TriggerOutcome {
        let pad_index = trigger.pad_index;
        let generation = self.bump(pad_index);
        self.highlighted.insert(pad_index);

        match mode {
            PlaybackMode::NoteOnOff => {
                self.sustained
                    .insert(pad_index, SustainedNoteInfo::from(trigger));
                TriggerOutcome::Sustained
            }
            PlaybackMode::OneShot => {
                self.sustained.remove(&pad_index);
                TriggerOutcome::Timed(HighlightTicket {
                    pad_index,
                    generation,
                })
            }
        }
    }

    /// Highlight a pad by hand, regardless of its playback mode.
    pub fn highlight(&mut self, pad_index: usize) -> HighlightTicket {
        let generation = self.bump(pad_index);
        self.highlighted.insert(pad_index);
        HighlightTicket {
            pad_index,
            generation,
        }
    }

    /// Redeem a timer ticket. Returns true if the pad went idle.
    ///
    /// Ignored if the pad changed since the ticket was issued or is held
    /// by a sustained note.
    pub fn expire(&mut self, ticket: HighlightTicket) -> bool {
        let current = self.generations.get(&ticket.pad_index).copied();
        if current != Some(ticket.generation) {
            return false;
        }
        if self.sustained.contains_key(&ticket.pad_index) {
            return false;
        }
        self.highlighted.remove(&ticket.pad_index)
    }

    /// Release a sustained note. Only a stop for the note currently held on
    /// the pad counts; anything else is stale and ignored.
    pub fn stop(&mut self, pad_index: usize, midi_note: u8) -> bool {
        match self.sustained.get(&pad_index) {
            Some(info) if info.midi_note == midi_note => {
                self.sustained.remove(&pad_index);
                self.highlighted.remove(&pad_index);
                self.bump(pad_index);
                true
            }
            _ => false,
        }
    }

    /// Force one pad idle. Returns true if anything changed.
    pub fn release(&mut self, pad_index: usize) -> bool {
        let had_note = self.sustained.remove(&pad_index).is_some();
        let was_lit = self.highlighted.remove(&pad_index);
        self.bump(pad_index);
        had_note || was_lit
    }

    /// Force every pad idle and invalidate all outstanding tickets.
    pub fn clear_all(&mut self) -> bool {
        let changed = !self.highlighted.is_empty() || !self.sustained.is_empty();
        self.highlighted.clear();
        self.sustained.clear();
        for generation in self.generations.values_mut() {
            *generation += 1;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(pad_index: usize, midi_note: u8) -> PadTrigger {
        PadTrigger {
            pad_index,
            midi_note,
            midi_channel: 0,
            velocity: 127,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_one_shot_highlights_then_expires() {
        let mut board = HighlightBoard::new();
        let outcome = board.trigger(&trigger(2, 36), PlaybackMode::OneShot);
        assert_eq!(board.phase(2), PadPhase::Highlighted);

        let TriggerOutcome::Timed(ticket) = outcome else {
            panic!("one-shot trigger must be timed");
        };
        assert!(board.expire(ticket));
        assert_eq!(board.phase(2), PadPhase::Idle);
    }

    #[test]
    fn test_stale_ticket_cannot_retract_retrigger() {
        let mut board = HighlightBoard::new();
        let TriggerOutcome::Timed(first) = board.trigger(&trigger(0, 36), PlaybackMode::OneShot)
        else {
            panic!("expected timed outcome");
        };
        let TriggerOutcome::Timed(second) = board.trigger(&trigger(0, 36), PlaybackMode::OneShot)
        else {
            panic!("expected timed outcome");
        };

        assert!(!board.expire(first));
        assert!(board.is_highlighted(0));
        assert!(board.expire(second));
        assert!(!board.is_highlighted(0));
    }

    #[test]
    fn test_note_on_off_sustains_until_matching_stop() {
        let mut board = HighlightBoard::new();
        let outcome = board.trigger(&trigger(5, 40), PlaybackMode::NoteOnOff);
        assert_eq!(outcome, TriggerOutcome::Sustained);
        assert_eq!(board.phase(5), PadPhase::Sustained);

        assert!(!board.stop(5, 41));
        assert_eq!(board.phase(5), PadPhase::Sustained);
        assert_eq!(board.sustained_note(5).map(|n| n.midi_note), Some(40));

        assert!(board.stop(5, 40));
        assert_eq!(board.phase(5), PadPhase::Idle);
    }

    #[test]
    fn test_stop_without_sustain_is_ignored() {
        let mut board = HighlightBoard::new();
        board.trigger(&trigger(1, 36), PlaybackMode::OneShot);
        assert!(!board.stop(1, 36));
        assert!(board.is_highlighted(1));
    }

    #[test]
    fn test_retrigger_overwrites_sustained_note() {
        let mut board = HighlightBoard::new();
        board.trigger(&trigger(3, 40), PlaybackMode::NoteOnOff);
        board.trigger(&trigger(3, 45), PlaybackMode::NoteOnOff);

        assert_eq!(board.sustained_notes().count(), 1);
        assert!(!board.stop(3, 40));
        assert!(board.stop(3, 45));
    }

    #[test]
    fn test_manual_highlight_ticket_does_not_end_sustain() {
        let mut board = HighlightBoard::new();
        board.trigger(&trigger(4, 50), PlaybackMode::NoteOnOff);
        let ticket = board.highlight(4);
        assert!(!board.expire(ticket));
        assert_eq!(board.phase(4), PadPhase::Sustained);
    }

    #[test]
    fn test_clear_all_invalidates_tickets() {
        let mut board = HighlightBoard::new();
        let ticket = board.highlight(7);
        board.trigger(&trigger(8, 60), PlaybackMode::NoteOnOff);

        assert!(board.clear_all());
        assert!(board.highlighted_pads().is_empty());
        assert_eq!(board.sustained_notes().count(), 0);

        // A fresh highlight must survive the old timer.
        board.highlight(7);
        assert!(!board.expire(ticket));
        assert!(board.is_highlighted(7));

        assert!(!HighlightBoard::new().clear_all());
    }

    #[test]
    fn test_release_single_pad() {
        let mut board = HighlightBoard::new();
        board.trigger(&trigger(1, 36), PlaybackMode::NoteOnOff);
        board.highlight(2);

        assert!(board.release(1));
        assert_eq!(board.phase(1), PadPhase::Idle);
        assert!(board.is_highlighted(2));
        assert!(!board.release(1));
    }
}
