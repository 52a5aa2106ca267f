//! MIDI Pad Highlighter
//!
//! Turns pad triggers and stops into the set of pads the UI should light.
//! State lives in a [`HighlightBoard`] published over a `watch` channel.
//! One-shot highlights are retracted by spawned timer tasks; a pad has at
//! most one live timer, and re-triggering, stopping or clearing aborts it.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::midi::board::{HighlightBoard, HighlightTicket, TriggerOutcome};
use crate::midi::events::{
    MidiPadEvent, PadContextAction, PadStop, PadTrigger, PlaybackMode, SustainedNoteInfo,
};

/// How long a one-shot highlight stays lit.
pub const DEFAULT_HIGHLIGHT_DURATION: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlighterConfig {
    pub highlight_duration: Duration,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        Self {
            highlight_duration: DEFAULT_HIGHLIGHT_DURATION,
        }
    }
}

/// Pad highlight driver.
///
/// Timer tasks are spawned on the current tokio runtime. Outside a runtime
/// highlights are still set but only end on stop or clear.
pub struct MidiPadHighlighter {
    config: HighlighterConfig,
    board: Arc<watch::Sender<HighlightBoard>>,
    playback_modes: HashMap<usize, PlaybackMode>,
    timers: HashMap<usize, JoinHandle<()>>,
}

impl MidiPadHighlighter {
    pub fn new(config: HighlighterConfig) -> Self {
        Self {
            config,
            board: Arc::new(watch::Sender::new(HighlightBoard::new())),
            playback_modes: HashMap::new(),
            timers: HashMap::new(),
        }
    }

    pub fn config(&self) -> HighlighterConfig {
        self.config
    }

    pub fn subscribe(&self) -> watch::Receiver<HighlightBoard> {
        self.board.subscribe()
    }

    /// Snapshot of the whole board.
    pub fn board(&self) -> HighlightBoard {
        self.board.borrow().clone()
    }

    pub fn highlighted_pads(&self) -> BTreeSet<usize> {
        self.board.borrow().highlighted_pads().clone()
    }

    pub fn is_highlighted(&self, pad_index: usize) -> bool {
        self.board.borrow().is_highlighted(pad_index)
    }

    pub fn sustained_notes(&self) -> Vec<SustainedNoteInfo> {
        self.board.borrow().sustained_notes().copied().collect()
    }

    pub fn playback_mode(&self, pad_index: usize) -> PlaybackMode {
        self.playback_modes
            .get(&pad_index)
            .copied()
            .unwrap_or_default()
    }

    /// Set a pad's playback mode. Leaving note on/off releases any note
    /// still held on the pad.
    pub fn set_playback_mode(&mut self, pad_index: usize, mode: PlaybackMode) {
        let previous = self.playback_modes.insert(pad_index, mode);
        debug!("[MIDI] Pad {} playback mode: {}", pad_index, mode);

        if previous == Some(PlaybackMode::NoteOnOff) && mode != PlaybackMode::NoteOnOff {
            self.release_pad(pad_index);
        }
    }

    pub fn handle_event(&mut self, event: MidiPadEvent) {
        match event {
            MidiPadEvent::Trigger(trigger) => self.on_trigger(trigger),
            MidiPadEvent::Stop(stop) => self.on_stop(stop),
        }
    }

    pub fn on_trigger(&mut self, trigger: PadTrigger) {
        let mode = self.playback_mode(trigger.pad_index);
        trace!(
            "[MIDI] Trigger pad {} note {} vel {} ({})",
            trigger.pad_index,
            trigger.midi_note,
            trigger.velocity,
            mode
        );

        self.cancel_timer(trigger.pad_index);
        let mut outcome = TriggerOutcome::Sustained;
        self.board.send_modify(|board| {
            outcome = board.trigger(&trigger, mode);
        });

        if let TriggerOutcome::Timed(ticket) = outcome {
            self.schedule_expiry(ticket, self.config.highlight_duration);
        }
    }

    /// A stop only ends a sustained note whose pitch matches.
    pub fn on_stop(&mut self, stop: PadStop) {
        let released = self
            .board
            .send_if_modified(|board| board.stop(stop.pad_index, stop.midi_note));

        if released {
            self.cancel_timer(stop.pad_index);
            trace!("[MIDI] Released pad {} note {}", stop.pad_index, stop.midi_note);
        } else {
            trace!(
                "[MIDI] Ignored stop for pad {} note {}",
                stop.pad_index,
                stop.midi_note
            );
        }
    }

    /// Light a pad for `duration`, independent of playback.
    pub fn highlight_pad(&mut self, pad_index: usize, duration: Duration) {
        self.cancel_timer(pad_index);
        let mut ticket = None;
        self.board.send_modify(|board| {
            ticket = Some(board.highlight(pad_index));
        });
        if let Some(ticket) = ticket {
            self.schedule_expiry(ticket, duration);
        }
    }

    pub fn clear_all_highlights(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        if self.board.send_if_modified(HighlightBoard::clear_all) {
            debug!("[MIDI] Cleared all highlights");
        }
    }

    /// Apply the parts of a pad context action that concern highlighting.
    /// Returns true if the action was handled here.
    pub fn apply_context_action(&mut self, action: &PadContextAction) -> bool {
        match *action {
            PadContextAction::SetPlaybackMode { pad_index, mode } => {
                self.set_playback_mode(pad_index, mode);
                true
            }
            PadContextAction::ClearPad { pad_index } => {
                self.playback_modes.remove(&pad_index);
                self.release_pad(pad_index);
                true
            }
            _ => false,
        }
    }

    /// Consume events until every sender is gone.
    pub async fn run(&mut self, mut events: mpsc::Receiver<MidiPadEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        debug!("[MIDI] Event stream closed");
    }

    fn release_pad(&mut self, pad_index: usize) {
        self.cancel_timer(pad_index);
        self.board
            .send_if_modified(|board| board.release(pad_index));
    }

    fn cancel_timer(&mut self, pad_index: usize) {
        if let Some(timer) = self.timers.remove(&pad_index) {
            timer.abort();
        }
    }

    fn schedule_expiry(&mut self, ticket: HighlightTicket, duration: Duration) {
        self.timers.retain(|_, timer| !timer.is_finished());

        let Ok(runtime) = Handle::try_current() else {
            warn!(
                "[MIDI] No tokio runtime, pad {} stays lit until cleared",
                ticket.pad_index
            );
            return;
        };

        let board = Arc::clone(&self.board);
        let deadline = Instant::now() + duration;
        let timer = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            board.send_if_modified(|board| board.expire(ticket));
        });
        self.timers.insert(ticket.pad_index, timer);
    }
}

impl Default for MidiPadHighlighter {
    fn default() -> Self {
        Self::new(HighlighterConfig::default())
    }
}

impl Drop for MidiPadHighlighter {
    fn drop(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(pad_index: usize, midi_note: u8) -> PadTrigger {
        PadTrigger {
            pad_index,
            midi_note,
            midi_channel: 9,
            velocity: 110,
            timestamp_ms: 0,
        }
    }

    async fn advance(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
        // Let woken timer tasks run.
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_highlight_lasts_150ms() {
        let mut highlighter = MidiPadHighlighter::default();
        highlighter.on_trigger(trigger(4, 36));
        assert!(highlighter.is_highlighted(4));

        advance(149).await;
        assert!(highlighter.is_highlighted(4));

        advance(2).await;
        assert!(!highlighter.is_highlighted(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_duration_drives_one_shot_expiry() {
        let mut highlighter = MidiPadHighlighter::new(HighlighterConfig {
            highlight_duration: Duration::from_millis(300),
        });
        highlighter.on_trigger(trigger(11, 36));

        advance(299).await;
        assert!(highlighter.is_highlighted(11));

        advance(2).await;
        assert!(!highlighter.is_highlighted(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fired_timers_are_pruned() {
        let mut highlighter = MidiPadHighlighter::default();
        for pad in 0..8 {
            highlighter.on_trigger(trigger(pad, 36));
        }
        advance(200).await;
        assert!(highlighter.highlighted_pads().is_empty());

        highlighter.on_trigger(trigger(20, 36));
        assert_eq!(highlighter.timers.len(), 1);
    }

    #[test]
    fn test_trigger_outside_runtime_does_not_panic() {
        let mut highlighter = MidiPadHighlighter::default();
        highlighter.on_trigger(trigger(2, 36));
        highlighter.highlight_pad(3, Duration::from_millis(50));

        assert!(highlighter.is_highlighted(2));
        assert!(highlighter.is_highlighted(3));
        assert!(highlighter.timers.is_empty());

        highlighter.clear_all_highlights();
        assert!(highlighter.highlighted_pads().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_restarts_the_window() {
        let mut highlighter = MidiPadHighlighter::default();
        highlighter.on_trigger(trigger(0, 36));
        advance(100).await;
        highlighter.on_trigger(trigger(0, 36));

        advance(100).await;
        assert!(highlighter.is_highlighted(0));

        advance(60).await;
        assert!(!highlighter.is_highlighted(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_note_on_off_holds_until_matching_stop() {
        let mut highlighter = MidiPadHighlighter::default();
        highlighter.set_playback_mode(2, PlaybackMode::NoteOnOff);
        highlighter.on_trigger(trigger(2, 38));

        advance(1_000).await;
        assert!(highlighter.is_highlighted(2));

        highlighter.on_stop(PadStop {
            pad_index: 2,
            midi_note: 40,
        });
        assert!(highlighter.is_highlighted(2));
        assert_eq!(highlighter.sustained_notes().len(), 1);

        highlighter.on_stop(PadStop {
            pad_index: 2,
            midi_note: 38,
        });
        assert!(!highlighter.is_highlighted(2));
        assert!(highlighter.sustained_notes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_spares_sustained_retrigger() {
        let mut highlighter = MidiPadHighlighter::default();
        highlighter.on_trigger(trigger(1, 36));
        highlighter.set_playback_mode(1, PlaybackMode::NoteOnOff);
        highlighter.on_trigger(trigger(1, 36));

        advance(500).await;
        assert!(highlighter.is_highlighted(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_highlight_duration() {
        let mut highlighter = MidiPadHighlighter::default();
        highlighter.highlight_pad(7, Duration::from_millis(400));

        advance(399).await;
        assert!(highlighter.is_highlighted(7));
        advance(2).await;
        assert!(!highlighter.is_highlighted(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all_cancels_everything() {
        let mut highlighter = MidiPadHighlighter::default();
        highlighter.set_playback_mode(3, PlaybackMode::NoteOnOff);
        highlighter.on_trigger(trigger(3, 50));
        highlighter.on_trigger(trigger(5, 36));

        highlighter.clear_all_highlights();
        assert!(highlighter.highlighted_pads().is_empty());
        assert!(highlighter.sustained_notes().is_empty());

        highlighter.highlight_pad(5, Duration::from_millis(1_000));
        advance(200).await;
        assert!(highlighter.is_highlighted(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_actions() {
        let mut highlighter = MidiPadHighlighter::default();
        let set_mode = PadContextAction::SetPlaybackMode {
            pad_index: 6,
            mode: PlaybackMode::NoteOnOff,
        };
        assert!(highlighter.apply_context_action(&set_mode));
        assert_eq!(highlighter.playback_mode(6), PlaybackMode::NoteOnOff);

        highlighter.on_trigger(trigger(6, 42));
        assert!(highlighter.apply_context_action(&PadContextAction::ClearPad { pad_index: 6 }));
        assert!(!highlighter.is_highlighted(6));
        assert_eq!(highlighter.playback_mode(6), PlaybackMode::OneShot);

        assert!(!highlighter.apply_context_action(&PadContextAction::CopyPad { pad_index: 6 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_note_on_off_releases_held_note() {
        let mut highlighter = MidiPadHighlighter::default();
        highlighter.set_playback_mode(0, PlaybackMode::NoteOnOff);
        highlighter.on_trigger(trigger(0, 36));
        highlighter.set_playback_mode(0, PlaybackMode::OneShot);
        assert!(!highlighter.is_highlighted(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_consumes_channel() {
        let (tx, rx) = mpsc::channel(8);
        let mut highlighter = MidiPadHighlighter::default();
        let mut board = highlighter.subscribe();

        tx.send(MidiPadEvent::Trigger(trigger(9, 36))).await.unwrap();
        drop(tx);
        highlighter.run(rx).await;

        assert!(board.has_changed().unwrap());
        assert!(board.borrow_and_update().is_highlighted(9));
    }
}
