//! Fan-in of the preference streams
//!
//! Combines the five independent store streams into one snapshot that is
//! recomputed whenever any input changes. Every input is a `watch` channel,
//! so each always has a current value and the combined snapshot is never
//! uninitialized.

use tokio::sync::watch;

use crate::layout::types::{FeatureVisibilityPreferences, LayoutCustomization, PanelPositions};
use crate::presets::preset::LayoutPreset;
use crate::presets::store::PreferenceStore;

/// Latest value of every store stream.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceInputs {
    pub layout_customization: LayoutCustomization,
    pub feature_visibility: FeatureVisibilityPreferences,
    pub presets: Vec<LayoutPreset>,
    pub active_preset_id: Option<String>,
    pub panel_positions: PanelPositions,
}

/// Combine-latest over the five preference streams.
pub struct PreferenceFanIn {
    customization: watch::Receiver<LayoutCustomization>,
    visibility: watch::Receiver<FeatureVisibilityPreferences>,
    presets: watch::Receiver<Vec<LayoutPreset>>,
    active_preset: watch::Receiver<Option<String>>,
    positions: watch::Receiver<PanelPositions>,
}

impl PreferenceFanIn {
    pub fn new<S: PreferenceStore>(store: &S) -> Self {
        Self {
            customization: store.layout_customization(),
            visibility: store.feature_visibility(),
            presets: store.presets(),
            active_preset: store.active_preset_id(),
            positions: store.panel_positions(),
        }
    }

    /// Current combined value without marking anything seen.
    pub fn peek(&self) -> PreferenceInputs {
        PreferenceInputs {
            layout_customization: self.customization.borrow().clone(),
            feature_visibility: *self.visibility.borrow(),
            presets: self.presets.borrow().clone(),
            active_preset_id: self.active_preset.borrow().clone(),
            panel_positions: self.positions.borrow().clone(),
        }
    }

    /// Current combined value, marking every input seen.
    pub fn latest(&mut self) -> PreferenceInputs {
        PreferenceInputs {
            layout_customization: self.customization.borrow_and_update().clone(),
            feature_visibility: *self.visibility.borrow_and_update(),
            presets: self.presets.borrow_and_update().clone(),
            active_preset_id: self.active_preset.borrow_and_update().clone(),
            panel_positions: self.positions.borrow_and_update().clone(),
        }
    }

    /// Wait until any input changes and return the recombined snapshot.
    ///
    /// Several changes landing before the wait resumes coalesce into one
    /// snapshot. Returns `None` once the store has been dropped.
    pub async fn next(&mut self) -> Option<PreferenceInputs> {
        let changed = tokio::select! {
            result = self.customization.changed() => result,
            result = self.visibility.changed() => result,
            result = self.presets.changed() => result,
            result = self.active_preset.changed() => result,
            result = self.positions.changed() => result,
        };
        changed.ok()?;
        Some(self.latest())
    }
}
