//! Preference Store
//!
//! The store is the persistence seam for layout preferences and presets.
//! Each preference is observable as a `watch` stream that always holds a
//! value, and every command is async so a platform store can suspend.
//!
//! [`JsonPreferenceStore`] keeps everything in a directory:
//!
//! ```text
//! <root>/
//! ├── preferences.json      customization, visibility, positions, active id
//! └── presets/
//!     └── <preset id>.json  one file per preset
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use walkdir::WalkDir;

use crate::error::{PadboardError, Result};
use crate::layout::types::{
    default_panel_positions, FeatureVisibilityPreferences, LayoutCustomization, PanelPositions,
};
use crate::presets::preset::LayoutPreset;

/// File holding the non-preset preferences.
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Directory holding one JSON file per preset.
pub const PRESETS_DIR: &str = "presets";

const PRESET_EXTENSION: &str = ".json";

/// Async key-value store for layout preferences.
///
/// Commands validate and persist before publishing, so a failed command
/// leaves every stream unchanged.
#[allow(async_fn_in_trait)]
pub trait PreferenceStore {
    fn layout_customization(&self) -> watch::Receiver<LayoutCustomization>;
    fn feature_visibility(&self) -> watch::Receiver<FeatureVisibilityPreferences>;
    fn presets(&self) -> watch::Receiver<Vec<LayoutPreset>>;
    fn active_preset_id(&self) -> watch::Receiver<Option<String>>;
    fn panel_positions(&self) -> watch::Receiver<PanelPositions>;

    async fn save_layout_customization(&self, customization: LayoutCustomization) -> Result<()>;
    async fn save_feature_visibility(&self, visibility: FeatureVisibilityPreferences)
        -> Result<()>;
    async fn save_panel_positions(&self, positions: PanelPositions) -> Result<()>;

    /// Append a new preset to the stored list.
    async fn create_preset(&self, preset: LayoutPreset) -> Result<()>;

    /// Restore a stored preset and mark it active. Returns the applied preset.
    async fn apply_preset(&self, id: &str) -> Result<LayoutPreset>;

    async fn delete_preset(&self, id: &str) -> Result<()>;

    /// Replace the whole preset list.
    async fn save_layout_presets(&self, presets: Vec<LayoutPreset>) -> Result<()>;

    /// Restore default preferences. Stored presets are kept.
    async fn reset_to_defaults(&self) -> Result<()>;
}

/// On-disk shape of `preferences.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct StoredPreferences {
    layout_customization: LayoutCustomization,
    feature_visibility: FeatureVisibilityPreferences,
    panel_positions: PanelPositions,
    active_preset_id: Option<String>,
}

impl Default for StoredPreferences {
    fn default() -> Self {
        Self {
            layout_customization: LayoutCustomization::default(),
            feature_visibility: FeatureVisibilityPreferences::default(),
            panel_positions: default_panel_positions(),
            active_preset_id: None,
        }
    }
}

/// JSON-file preference store. Without a root directory it only lives in memory.
pub struct JsonPreferenceStore {
    /// Directory the store persists into, if any.
    root: Option<PathBuf>,
    customization: watch::Sender<LayoutCustomization>,
    visibility: watch::Sender<FeatureVisibilityPreferences>,
    presets: watch::Sender<Vec<LayoutPreset>>,
    active_preset: watch::Sender<Option<String>>,
    positions: watch::Sender<PanelPositions>,
}

impl JsonPreferenceStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::from_parts(None, StoredPreferences::default(), Vec::new())
    }

    /// Open (or start) a store rooted at `root`.
    ///
    /// Missing files read as defaults. Unreadable preset files are skipped
    /// with a warning so one bad file does not hide the others.
    pub fn open(root: &Path) -> Result<Self> {
        let preferences_path = root.join(PREFERENCES_FILE);
        let preferences = if preferences_path.exists() {
            let content = fs::read_to_string(&preferences_path).map_err(|e| {
                PadboardError::FileReadError {
                    path: preferences_path.clone(),
                    source: e,
                }
            })?;
            serde_json::from_str(&content)?
        } else {
            StoredPreferences::default()
        };

        let presets = load_presets(&root.join(PRESETS_DIR));
        info!(
            "[STORE] Opened {} ({} presets)",
            root.display(),
            presets.len()
        );
        Ok(Self::from_parts(Some(root.to_path_buf()), preferences, presets))
    }

    fn from_parts(
        root: Option<PathBuf>,
        preferences: StoredPreferences,
        presets: Vec<LayoutPreset>,
    ) -> Self {
        Self {
            root,
            customization: watch::Sender::new(preferences.layout_customization),
            visibility: watch::Sender::new(preferences.feature_visibility),
            presets: watch::Sender::new(presets),
            active_preset: watch::Sender::new(preferences.active_preset_id),
            positions: watch::Sender::new(preferences.panel_positions),
        }
    }

    /// Directory the store persists into, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn current_preferences(&self) -> StoredPreferences {
        StoredPreferences {
            layout_customization: self.customization.borrow().clone(),
            feature_visibility: *self.visibility.borrow(),
            panel_positions: self.positions.borrow().clone(),
            active_preset_id: self.active_preset.borrow().clone(),
        }
    }

    fn current_presets(&self) -> Vec<LayoutPreset> {
        self.presets.borrow().clone()
    }

    /// Persist then publish the non-preset preferences.
    fn commit_preferences(&self, preferences: StoredPreferences) -> Result<()> {
        if let Some(root) = &self.root {
            ensure_dir(root)?;
            let path = root.join(PREFERENCES_FILE);
            let content = serde_json::to_string_pretty(&preferences)?;
            fs::write(&path, content)
                .map_err(|e| PadboardError::FileWriteError { path, source: e })?;
        }

        self.customization
            .send_if_modified(|current| replace_if_changed(current, preferences.layout_customization));
        self.visibility
            .send_if_modified(|current| replace_if_changed(current, preferences.feature_visibility));
        self.positions
            .send_if_modified(|current| replace_if_changed(current, preferences.panel_positions));
        self.active_preset
            .send_if_modified(|current| replace_if_changed(current, preferences.active_preset_id));
        Ok(())
    }

    /// Persist then publish the preset list, removing files of dropped presets.
    fn commit_presets(&self, presets: Vec<LayoutPreset>) -> Result<()> {
        if let Some(root) = &self.root {
            let dir = root.join(PRESETS_DIR);
            ensure_dir(&dir)?;

            let previous = self.current_presets();
            for preset in &presets {
                let unchanged = previous.iter().any(|p| p == preset);
                if !unchanged || !preset_path(&dir, &preset.id).exists() {
                    write_preset(&dir, preset)?;
                }
            }
            for stale in previous
                .iter()
                .filter(|old| !presets.iter().any(|p| p.id == old.id))
            {
                let path = preset_path(&dir, &stale.id);
                if path.exists() {
                    fs::remove_file(&path)
                        .map_err(|e| PadboardError::FileWriteError { path, source: e })?;
                }
            }
        }

        self.presets.send_replace(presets);
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn layout_customization(&self) -> watch::Receiver<LayoutCustomization> {
        self.customization.subscribe()
    }

    fn feature_visibility(&self) -> watch::Receiver<FeatureVisibilityPreferences> {
        self.visibility.subscribe()
    }

    fn presets(&self) -> watch::Receiver<Vec<LayoutPreset>> {
        self.presets.subscribe()
    }

    fn active_preset_id(&self) -> watch::Receiver<Option<String>> {
        self.active_preset.subscribe()
    }

    fn panel_positions(&self) -> watch::Receiver<PanelPositions> {
        self.positions.subscribe()
    }

    async fn save_layout_customization(&self, customization: LayoutCustomization) -> Result<()> {
        customization.validate()?;
        debug!("[STORE] Saving layout customization");
        self.commit_preferences(StoredPreferences {
            layout_customization: customization,
            ..self.current_preferences()
        })
    }

    async fn save_feature_visibility(
        &self,
        visibility: FeatureVisibilityPreferences,
    ) -> Result<()> {
        debug!("[STORE] Saving feature visibility");
        self.commit_preferences(StoredPreferences {
            feature_visibility: visibility,
            ..self.current_preferences()
        })
    }

    async fn save_panel_positions(&self, positions: PanelPositions) -> Result<()> {
        debug!("[STORE] Saving {} panel positions", positions.len());
        self.commit_preferences(StoredPreferences {
            panel_positions: positions,
            ..self.current_preferences()
        })
    }

    async fn create_preset(&self, preset: LayoutPreset) -> Result<()> {
        preset.validate()?;
        let mut presets = self.current_presets();
        if presets.iter().any(|p| p.id == preset.id) {
            return Err(PadboardError::DuplicatePresetId { id: preset.id });
        }

        info!("[STORE] Creating preset '{}' ({})", preset.name, preset.id);
        presets.push(preset);
        self.commit_presets(presets)
    }

    async fn apply_preset(&self, id: &str) -> Result<LayoutPreset> {
        let preset = self
            .current_presets()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PadboardError::PresetNotFound { id: id.to_string() })?;
        preset.validate()?;

        info!("[STORE] Applying preset '{}' ({})", preset.name, preset.id);
        self.commit_preferences(StoredPreferences {
            layout_customization: preset.layout_customization.clone(),
            feature_visibility: preset.feature_visibility,
            panel_positions: preset.panel_positions.clone(),
            active_preset_id: Some(preset.id.clone()),
        })?;
        Ok(preset)
    }

    async fn delete_preset(&self, id: &str) -> Result<()> {
        let presets = self.current_presets();
        if !presets.iter().any(|p| p.id == id) {
            return Err(PadboardError::PresetNotFound { id: id.to_string() });
        }

        info!("[STORE] Deleting preset {}", id);
        let remaining = presets.into_iter().filter(|p| p.id != id).collect();
        self.commit_presets(remaining)?;

        let preferences = self.current_preferences();
        if preferences.active_preset_id.as_deref() == Some(id) {
            self.commit_preferences(StoredPreferences {
                active_preset_id: None,
                ..preferences
            })?;
        }
        Ok(())
    }

    async fn save_layout_presets(&self, presets: Vec<LayoutPreset>) -> Result<()> {
        for (index, preset) in presets.iter().enumerate() {
            preset.validate()?;
            if presets[..index].iter().any(|p| p.id == preset.id) {
                return Err(PadboardError::DuplicatePresetId {
                    id: preset.id.clone(),
                });
            }
        }

        debug!("[STORE] Saving {} presets", presets.len());
        self.commit_presets(presets)
    }

    async fn reset_to_defaults(&self) -> Result<()> {
        info!("[STORE] Resetting preferences to defaults");
        self.commit_preferences(StoredPreferences::default())
    }
}

fn replace_if_changed<T: PartialEq>(current: &mut T, next: T) -> bool {
    if *current == next {
        return false;
    }
    *current = next;
    true
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| PadboardError::DirectoryCreateError {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Preset ids are generated locally, but files from elsewhere may carry any id.
fn preset_file_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn preset_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}{}", preset_file_stem(id), PRESET_EXTENSION))
}

fn write_preset(dir: &Path, preset: &LayoutPreset) -> Result<()> {
    let path = preset_path(dir, &preset.id);
    let content = serde_json::to_string_pretty(preset)?;
    fs::write(&path, content).map_err(|e| PadboardError::FileWriteError { path, source: e })
}

/// Load every preset file, oldest first.
///
/// Files are expected at `<id>.json`. A file found under another name is
/// moved there so later writes and deletes hit the same file, and any
/// further file carrying an id already loaded is removed. Each id is
/// therefore loaded at most once.
fn load_presets(dir: &Path) -> Vec<LayoutPreset> {
    if !dir.exists() {
        return Vec::new();
    }

    let mut found: Vec<(PathBuf, LayoutPreset)> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .ends_with(PRESET_EXTENSION)
        })
        .filter_map(|entry| {
            let path = entry.path();
            let parsed = fs::read_to_string(path)
                .map_err(PadboardError::from)
                .and_then(|content| {
                    serde_json::from_str::<LayoutPreset>(&content).map_err(PadboardError::from)
                });
            match parsed {
                Ok(preset) => Some((path.to_path_buf(), preset)),
                Err(e) => {
                    warn!("[STORE] Skipping unreadable preset {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect();

    // Files already at their own path win over misnamed copies.
    found.sort_by_key(|(path, preset)| (*path != preset_path(dir, &preset.id), path.clone()));

    let mut seen = HashSet::new();
    let mut presets = Vec::with_capacity(found.len());
    for (path, preset) in found {
        let canonical = preset_path(dir, &preset.id);
        if !seen.insert(preset.id.clone()) {
            warn!(
                "[STORE] Dropping {}: preset {} is already loaded",
                path.display(),
                preset.id
            );
            if path != canonical {
                if let Err(e) = fs::remove_file(&path) {
                    warn!("[STORE] Failed to remove {}: {}", path.display(), e);
                }
            }
            continue;
        }

        if path != canonical {
            match fs::rename(&path, &canonical) {
                Ok(()) => debug!(
                    "[STORE] Moved preset {} to {}",
                    preset.id,
                    canonical.display()
                ),
                Err(e) => warn!(
                    "[STORE] Failed to move {} to {}: {}",
                    path.display(),
                    canonical.display(),
                    e
                ),
            }
        }
        presets.push(preset);
    }

    presets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    presets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::{CustomizationPreferences, PanelPosition, PanelType};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_store_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn preset_named(name: &str) -> LayoutPreset {
        LayoutPreset::new(name, &CustomizationPreferences::default()).unwrap()
    }

    #[tokio::test]
    async fn test_open_empty_dir_gives_defaults() {
        let dir = create_store_dir();
        let store = JsonPreferenceStore::open(dir.path()).unwrap();

        assert_eq!(*store.layout_customization().borrow(), LayoutCustomization::default());
        assert!(store.presets().borrow().is_empty());
        assert!(store.active_preset_id().borrow().is_none());
        assert_eq!(*store.panel_positions().borrow(), default_panel_positions());
    }

    #[tokio::test]
    async fn test_preferences_survive_reopen() {
        let dir = create_store_dir();
        let store = JsonPreferenceStore::open(dir.path()).unwrap();

        let mut custom = LayoutCustomization::default();
        custom.pad_count = 24;
        store.save_layout_customization(custom.clone()).await.unwrap();

        let mut positions = default_panel_positions();
        positions.insert(PanelType::Mixer, PanelPosition::Floating { x: 4.0, y: 8.0 });
        store.save_panel_positions(positions.clone()).await.unwrap();

        let reopened = JsonPreferenceStore::open(dir.path()).unwrap();
        assert_eq!(*reopened.layout_customization().borrow(), custom);
        assert_eq!(*reopened.panel_positions().borrow(), positions);
    }

    #[tokio::test]
    async fn test_presets_survive_reopen_in_creation_order() {
        let dir = create_store_dir();
        let store = JsonPreferenceStore::open(dir.path()).unwrap();
        let first = preset_named("First");
        let second = preset_named("Second");
        store.create_preset(first.clone()).await.unwrap();
        store.create_preset(second.clone()).await.unwrap();

        let reopened = JsonPreferenceStore::open(dir.path()).unwrap();
        let names: Vec<String> = reopened
            .presets()
            .borrow()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(names, vec!["First".to_string(), "Second".to_string()]);
    }

    #[tokio::test]
    async fn test_apply_sets_active_and_values() {
        let store = JsonPreferenceStore::in_memory();
        let mut customization = CustomizationPreferences::default();
        customization.layout.show_pad_labels = false;
        customization.visibility.show_velocity_meter = true;
        let preset = LayoutPreset::new("Minimal", &customization).unwrap();
        store.create_preset(preset.clone()).await.unwrap();

        let applied = store.apply_preset(&preset.id).await.unwrap();
        assert_eq!(applied.id, preset.id);
        assert_eq!(store.active_preset_id().borrow().as_deref(), Some(preset.id.as_str()));
        assert!(!store.layout_customization().borrow().show_pad_labels);
        assert!(store.feature_visibility().borrow().show_velocity_meter);
    }

    #[tokio::test]
    async fn test_apply_unknown_fails_without_changes() {
        let store = JsonPreferenceStore::in_memory();
        let mut rx = store.layout_customization();
        rx.borrow_and_update();

        let err = store.apply_preset("missing").await.unwrap_err();
        assert_eq!(err.error_code(), "PRESET_NOT_FOUND");
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_clears_active() {
        let dir = create_store_dir();
        let store = JsonPreferenceStore::open(dir.path()).unwrap();
        let preset = preset_named("Gone Soon");
        store.create_preset(preset.clone()).await.unwrap();
        store.apply_preset(&preset.id).await.unwrap();

        let file = preset_path(&dir.path().join(PRESETS_DIR), &preset.id);
        assert!(file.exists());

        store.delete_preset(&preset.id).await.unwrap();
        assert!(!file.exists());
        assert!(store.presets().borrow().is_empty());
        assert!(store.active_preset_id().borrow().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let store = JsonPreferenceStore::in_memory();
        let preset = preset_named("Twice");
        store.create_preset(preset.clone()).await.unwrap();

        let err = store.create_preset(preset.clone()).await.unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_PRESET_ID");

        let err = store
            .save_layout_presets(vec![preset.clone(), preset])
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_PRESET_ID");
        assert_eq!(store.presets().borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_keeps_presets() {
        let store = JsonPreferenceStore::in_memory();
        let preset = preset_named("Keeper");
        store.create_preset(preset.clone()).await.unwrap();
        store.apply_preset(&preset.id).await.unwrap();

        let mut custom = LayoutCustomization::default();
        custom.compact_controls = true;
        store.save_layout_customization(custom).await.unwrap();

        store.reset_to_defaults().await.unwrap();
        assert_eq!(*store.layout_customization().borrow(), LayoutCustomization::default());
        assert!(store.active_preset_id().borrow().is_none());
        assert_eq!(store.presets().borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_customization_not_saved() {
        let store = JsonPreferenceStore::in_memory();
        let mut custom = LayoutCustomization::default();
        custom.pad_count = 200;
        assert!(store.save_layout_customization(custom).await.is_err());
        assert_eq!(store.layout_customization().borrow().pad_count, 16);
    }

    #[test]
    fn test_bad_preset_file_is_skipped() {
        let dir = create_store_dir();
        let presets_dir = dir.path().join(PRESETS_DIR);
        fs::create_dir_all(&presets_dir).unwrap();
        fs::write(presets_dir.join("broken.json"), "{ nope").unwrap();
        fs::write(presets_dir.join("notes.txt"), "ignored").unwrap();

        let store = JsonPreferenceStore::open(dir.path()).unwrap();
        assert!(store.presets().borrow().is_empty());
    }

    #[tokio::test]
    async fn test_misnamed_preset_file_keeps_one_identity() {
        let dir = create_store_dir();
        let presets_dir = dir.path().join(PRESETS_DIR);
        fs::create_dir_all(&presets_dir).unwrap();
        let shared = preset_named("Shared");
        fs::write(
            presets_dir.join("shared.json"),
            serde_json::to_string_pretty(&shared).unwrap(),
        )
        .unwrap();

        {
            let store = JsonPreferenceStore::open(dir.path()).unwrap();
            assert!(!presets_dir.join("shared.json").exists());
            assert!(preset_path(&presets_dir, &shared.id).exists());
            store.create_preset(preset_named("Other")).await.unwrap();
        }

        let store = JsonPreferenceStore::open(dir.path()).unwrap();
        let ids: Vec<String> = store.presets().borrow().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.iter().filter(|id| **id == shared.id).count(), 1);

        store.create_preset(preset_named("Third")).await.unwrap();
        store.delete_preset(&shared.id).await.unwrap();
        drop(store);

        let store = JsonPreferenceStore::open(dir.path()).unwrap();
        assert!(store.presets().borrow().iter().all(|p| p.id != shared.id));
        assert_eq!(store.presets().borrow().len(), 2);
    }

    #[test]
    fn test_duplicate_id_files_load_once() {
        let dir = create_store_dir();
        let presets_dir = dir.path().join(PRESETS_DIR);
        fs::create_dir_all(&presets_dir).unwrap();
        let preset = preset_named("Twice");
        let content = serde_json::to_string_pretty(&preset).unwrap();
        fs::write(preset_path(&presets_dir, &preset.id), &content).unwrap();
        fs::write(presets_dir.join("copy.json"), &content).unwrap();

        let store = JsonPreferenceStore::open(dir.path()).unwrap();
        assert_eq!(*store.presets().borrow(), vec![preset.clone()]);
        assert!(!presets_dir.join("copy.json").exists());
        assert!(preset_path(&presets_dir, &preset.id).exists());
    }

    #[test]
    fn test_preset_file_stem_sanitizes() {
        assert_eq!(preset_file_stem("preset_abc-123"), "preset_abc-123");
        assert_eq!(preset_file_stem("../evil id"), "___evil_id");
    }
}
