//! Layout Preset Manager
//!
//! Derives the UI-facing [`PresetUiState`] from the preference store and
//! runs preset commands against it. No command returns an error: failures
//! are logged and land in `error_message`, successes in `message`, and the
//! state stays renderable either way.

use chrono::Utc;
use log::{info, warn};
use tokio::sync::watch;

use crate::error::{PadboardError, Result};
use crate::layout::types::{
    CustomizationPreferences, FeatureVisibilityPreferences, LayoutCustomization, PanelPositions,
};
use crate::presets::fan_in::{PreferenceFanIn, PreferenceInputs};
use crate::presets::preset::{export_preset, parse_exported, LayoutPreset};
use crate::presets::store::PreferenceStore;

/// Label used when a preset id is not in the local list.
pub const UNKNOWN_PRESET_NAME: &str = "Unknown";

/// Everything the preset screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetUiState {
    pub layout_customization: LayoutCustomization,
    pub feature_visibility: FeatureVisibilityPreferences,
    pub presets: Vec<LayoutPreset>,
    pub active_preset_id: Option<String>,
    pub panel_positions: PanelPositions,

    /// An operation is in flight
    pub is_loading: bool,
    /// Confirmation of the last operation, if it succeeded
    pub message: Option<String>,
    /// Failure of the last operation, if it failed
    pub error_message: Option<String>,
}

impl PresetUiState {
    fn from_inputs(inputs: PreferenceInputs) -> Self {
        Self {
            layout_customization: inputs.layout_customization,
            feature_visibility: inputs.feature_visibility,
            presets: inputs.presets,
            active_preset_id: inputs.active_preset_id,
            panel_positions: inputs.panel_positions,
            is_loading: false,
            message: None,
            error_message: None,
        }
    }

    /// Replace the store-derived fields, keeping the transient ones.
    fn apply_inputs(&mut self, inputs: PreferenceInputs) {
        self.layout_customization = inputs.layout_customization;
        self.feature_visibility = inputs.feature_visibility;
        self.presets = inputs.presets;
        self.active_preset_id = inputs.active_preset_id;
        self.panel_positions = inputs.panel_positions;
    }

    pub fn preset(&self, id: &str) -> Option<&LayoutPreset> {
        self.presets.iter().find(|preset| preset.id == id)
    }

    pub fn active_preset(&self) -> Option<&LayoutPreset> {
        self.active_preset_id
            .as_deref()
            .and_then(|id| self.preset(id))
    }

    /// The customization currently in effect.
    pub fn customization(&self) -> CustomizationPreferences {
        CustomizationPreferences {
            layout: self.layout_customization.clone(),
            visibility: self.feature_visibility,
            panel_positions: self.panel_positions.clone(),
        }
    }
}

/// Preset commands with status reporting over a [`PreferenceStore`].
pub struct LayoutPresetManager<S: PreferenceStore> {
    store: S,
    inputs: PreferenceFanIn,
    state: watch::Sender<PresetUiState>,
}

impl<S: PreferenceStore> LayoutPresetManager<S> {
    pub fn new(store: S) -> Self {
        let mut inputs = PreferenceFanIn::new(&store);
        let initial = PresetUiState::from_inputs(inputs.latest());
        Self {
            store,
            inputs,
            state: watch::Sender::new(initial),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot of the current UI state.
    pub fn ui_state(&self) -> PresetUiState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PresetUiState> {
        self.state.subscribe()
    }

    /// Re-derive the store fields once.
    pub fn refresh(&self) {
        self.apply_store_inputs(self.inputs.peek());
    }

    /// Keep the UI state in step with the store until the store closes.
    ///
    /// The manager owns the store, so in practice this runs until the
    /// future is dropped; pair it with `tokio::select!` or a task.
    pub async fn follow_store(&self) {
        let mut fan_in = PreferenceFanIn::new(&self.store);
        let mut next = Some(fan_in.latest());
        while let Some(inputs) = next {
            self.apply_store_inputs(inputs);
            next = fan_in.next().await;
        }
    }

    /// Publish new store values only if they differ from what is shown.
    fn apply_store_inputs(&self, inputs: PreferenceInputs) {
        self.state.send_if_modified(|state| {
            let before = state.clone();
            state.apply_inputs(inputs);
            *state != before
        });
    }

    pub fn clear_message(&self) {
        self.state.send_if_modified(|state| state.message.take().is_some());
    }

    pub fn clear_error(&self) {
        self.state
            .send_if_modified(|state| state.error_message.take().is_some());
    }

    // ========================================================================
    // Preset commands
    // ========================================================================

    /// Snapshot the current preferences into a new stored preset.
    pub async fn create_preset(&self, name: &str) {
        self.begin();
        match self.try_create(name).await {
            Ok(preset) => self.succeed(format!("Preset '{}' created", preset.name)),
            Err(e) => self.fail("Failed to create preset", e),
        }
    }

    /// Apply a stored preset. The store is asked even if the id is unknown
    /// locally; the local lookup only names the preset in the message.
    pub async fn apply_preset(&self, id: &str) {
        self.begin();
        let name = self.preset_name(id);
        match self.store.apply_preset(id).await {
            Ok(_) => self.succeed(format!("Applied preset '{}'", name)),
            Err(e) => self.fail("Failed to apply preset", e),
        }
    }

    pub async fn delete_preset(&self, id: &str) {
        self.begin();
        let name = self.preset_name(id);
        match self.store.delete_preset(id).await {
            Ok(()) => self.succeed(format!("Preset '{}' deleted", name)),
            Err(e) => self.fail("Failed to delete preset", e),
        }
    }

    pub async fn duplicate_preset(&self, id: &str, new_name: &str) {
        self.begin();
        match self.try_duplicate(id, new_name).await {
            Ok((source, copy)) => self.succeed(format!(
                "Preset '{}' duplicated as '{}'",
                source.name, copy.name
            )),
            Err(e) => self.fail("Failed to duplicate preset", e),
        }
    }

    /// Serialize a preset for sharing. `None` if it is missing or cannot be
    /// serialized.
    pub fn export_preset(&self, id: &str) -> Option<String> {
        let exported = self
            .find_preset(id)
            .and_then(|preset| {
                let text = export_preset(&preset)?;
                Ok((text, preset))
            });
        match exported {
            Ok((text, preset)) => {
                self.succeed(format!("Preset '{}' exported", preset.name));
                Some(text)
            }
            Err(e) => {
                self.fail("Failed to export preset", e);
                None
            }
        }
    }

    /// Import exported text as a new preset with a fresh identity.
    pub async fn import_preset(&self, text: &str, new_name: Option<&str>) -> Option<LayoutPreset> {
        self.begin();
        match self.try_import(text, new_name).await {
            Ok(preset) => {
                self.succeed(format!("Imported preset '{}'", preset.name));
                Some(preset)
            }
            Err(e) => {
                self.fail("Failed to import preset", e);
                None
            }
        }
    }

    // ========================================================================
    // Preference commands
    // ========================================================================

    pub async fn save_layout_customization(&self, customization: LayoutCustomization) {
        self.begin();
        match self.store.save_layout_customization(customization).await {
            Ok(()) => self.succeed("Layout saved".to_string()),
            Err(e) => self.fail("Failed to save layout", e),
        }
    }

    pub async fn save_feature_visibility(&self, visibility: FeatureVisibilityPreferences) {
        self.begin();
        match self.store.save_feature_visibility(visibility).await {
            Ok(()) => self.succeed("Feature visibility saved".to_string()),
            Err(e) => self.fail("Failed to save feature visibility", e),
        }
    }

    pub async fn save_panel_positions(&self, positions: PanelPositions) {
        self.begin();
        match self.store.save_panel_positions(positions).await {
            Ok(()) => self.succeed("Panel positions saved".to_string()),
            Err(e) => self.fail("Failed to save panel positions", e),
        }
    }

    pub async fn reset_to_defaults(&self) {
        self.begin();
        match self.store.reset_to_defaults().await {
            Ok(()) => self.succeed("Preferences reset to defaults".to_string()),
            Err(e) => self.fail("Failed to reset preferences", e),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn try_create(&self, name: &str) -> Result<LayoutPreset> {
        let customization = self.ui_state().customization();
        let preset = LayoutPreset::new(name, &customization)?;
        self.store.create_preset(preset.clone()).await?;
        Ok(preset)
    }

    async fn try_duplicate(&self, id: &str, new_name: &str) -> Result<(LayoutPreset, LayoutPreset)> {
        let source = self.find_preset(id)?;
        let copy = source.duplicate(new_name)?;

        let mut presets = self.inputs.peek().presets;
        presets.push(copy.clone());
        self.store.save_layout_presets(presets).await?;
        Ok((source, copy))
    }

    async fn try_import(&self, text: &str, new_name: Option<&str>) -> Result<LayoutPreset> {
        let mut presets = self.inputs.peek().presets;
        let imported = parse_exported(text)?.into_imported(new_name, &presets, Utc::now())?;

        presets.push(imported.clone());
        self.store.save_layout_presets(presets).await?;
        Ok(imported)
    }

    fn find_preset(&self, id: &str) -> Result<LayoutPreset> {
        self.inputs
            .peek()
            .presets
            .into_iter()
            .find(|preset| preset.id == id)
            .ok_or_else(|| PadboardError::PresetNotFound { id: id.to_string() })
    }

    /// Name from the list the UI is showing, not the live store.
    fn preset_name(&self, id: &str) -> String {
        self.state
            .borrow()
            .preset(id)
            .map(|preset| preset.name.clone())
            .unwrap_or_else(|| UNKNOWN_PRESET_NAME.to_string())
    }

    fn begin(&self) {
        self.state.send_modify(|state| state.is_loading = true);
    }

    fn succeed(&self, message: String) {
        info!("[PRESETS] {}", message);
        let inputs = self.inputs.peek();
        self.state.send_modify(|state| {
            state.apply_inputs(inputs);
            state.is_loading = false;
            state.message = Some(message);
            state.error_message = None;
        });
    }

    fn fail(&self, context: &str, error: PadboardError) {
        warn!("[PRESETS] {}: {} ({})", context, error, error.error_code());
        let inputs = self.inputs.peek();
        self.state.send_modify(|state| {
            state.apply_inputs(inputs);
            state.is_loading = false;
            state.message = None;
            state.error_message = Some(format!("{}: {}", context, error));
        });
    }
}
