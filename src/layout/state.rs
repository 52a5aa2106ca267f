//! Layout State Manager
//!
//! Owns the canonical [`LayoutState`] and [`CustomizationPreferences`] for a
//! UI session and publishes every change on a `watch` stream. Readers only
//! ever see whole snapshots; the manager is the single writer.
//!
//! There is no global instance. Create one per session and hand consumers an
//! [`AttachedLayout`] view from [`LayoutStateManager::attach`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, info};
use tokio::sync::watch;

use crate::error::Result;
use crate::layout::types::{
    CustomizationPreferences, LayoutMode, LayoutState, PanelType, ScreenConfiguration,
    ScreenMetrics, SectionType,
};
use crate::presets::LayoutPreset;

/// Called with `(previous, current)` whenever the layout mode changes.
pub type ModeChangeCallback = Box<dyn Fn(LayoutMode, LayoutMode) + Send + Sync>;

/// Single-writer owner of the session's layout state.
pub struct LayoutStateManager {
    /// Canonical layout state
    layout: watch::Sender<LayoutState>,

    /// Customization that presets snapshot and restore
    customization: watch::Sender<CustomizationPreferences>,

    /// Listeners fired after a mode change has been published
    mode_listeners: Vec<ModeChangeCallback>,

    /// Number of live [`AttachedLayout`] views
    attached: Arc<AtomicUsize>,
}

impl Default for LayoutStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutStateManager {
    /// Create a manager holding the built-in defaults.
    pub fn new() -> Self {
        Self::with_state(LayoutState::default(), CustomizationPreferences::default())
    }

    /// Create a manager from previously restored state.
    pub fn with_state(layout: LayoutState, customization: CustomizationPreferences) -> Self {
        let (layout, _) = watch::channel(layout);
        let (customization, _) = watch::channel(customization);
        Self {
            layout,
            customization,
            mode_listeners: Vec::new(),
            attached: Arc::new(AtomicUsize::new(0)),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Attach a consumer. The returned view detaches when dropped.
    pub fn attach(&self) -> AttachedLayout {
        let count = self.attached.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("[LAYOUT] Consumer attached ({} live)", count);
        AttachedLayout {
            layout: self.layout.subscribe(),
            customization: self.customization.subscribe(),
            attached: Arc::clone(&self.attached),
        }
    }

    /// Number of consumers currently attached.
    pub fn attached_count(&self) -> usize {
        self.attached.load(Ordering::SeqCst)
    }

    /// Register a listener for layout mode changes.
    pub fn on_mode_change<F>(&mut self, callback: F)
    where
        F: Fn(LayoutMode, LayoutMode) + Send + Sync + 'static,
    {
        self.mode_listeners.push(Box::new(callback));
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Snapshot of the current layout state.
    pub fn layout_state(&self) -> LayoutState {
        self.layout.borrow().clone()
    }

    /// Snapshot of the current customization.
    pub fn customization(&self) -> CustomizationPreferences {
        self.customization.borrow().clone()
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout.borrow().configuration.layout_mode
    }

    pub fn subscribe_layout(&self) -> watch::Receiver<LayoutState> {
        self.layout.subscribe()
    }

    pub fn subscribe_customization(&self) -> watch::Receiver<CustomizationPreferences> {
        self.customization.subscribe()
    }

    // ========================================================================
    // Screen configuration
    // ========================================================================

    /// Replace the screen configuration.
    ///
    /// Mode and size classes are re-derived from `configuration.metrics`, so
    /// a hand-built configuration cannot publish a mode its metrics disagree
    /// with. Returns true if the layout mode changed. The new state is
    /// published before any mode-change listener runs.
    pub fn update_screen_configuration(&self, configuration: ScreenConfiguration) -> bool {
        let configuration = ScreenConfiguration::from_metrics(configuration.metrics);
        let previous = self.layout_mode();
        self.layout.send_if_modified(|state| {
            if state.configuration == configuration {
                return false;
            }
            state.configuration = configuration;
            true
        });

        let current = configuration.layout_mode;
        if previous == current {
            return false;
        }

        info!("[LAYOUT] Mode changed: {} -> {}", previous, current);
        for listener in &self.mode_listeners {
            listener(previous, current);
        }
        true
    }

    /// Classify a raw reading and apply it.
    pub fn update_screen_metrics(&self, metrics: ScreenMetrics) -> bool {
        self.update_screen_configuration(ScreenConfiguration::from_metrics(metrics))
    }

    // ========================================================================
    // Panels and sections
    // ========================================================================

    pub fn toggle_panel_visibility(&self, panel: PanelType) {
        let visible = self.layout.borrow().is_panel_visible(panel);
        self.set_panel_visibility(panel, !visible);
    }

    /// Set one panel's visibility. Setting the current value publishes nothing.
    pub fn set_panel_visibility(&self, panel: PanelType, visible: bool) {
        let changed = self.layout.send_if_modified(|state| {
            if state.is_panel_visible(panel) == visible
                && state.panel_visibility.contains_key(&panel)
            {
                return false;
            }
            state.panel_visibility.insert(panel, visible);
            true
        });
        if changed {
            debug!("[LAYOUT] Panel {} visible={}", panel, visible);
        }
    }

    pub fn toggle_section_collapse(&self, section: SectionType) {
        let collapsed = self.layout.borrow().is_section_collapsed(section);
        self.set_section_collapsed(section, !collapsed);
    }

    /// Collapse or expand a section. Setting the current value publishes nothing.
    pub fn set_section_collapsed(&self, section: SectionType, collapsed: bool) {
        self.layout.send_if_modified(|state| {
            if collapsed {
                state.collapsed_sections.insert(section)
            } else {
                state.collapsed_sections.remove(&section)
            }
        });
    }

    // ========================================================================
    // Customization and presets
    // ========================================================================

    /// Replace the customization after validating it.
    pub fn update_customization(&self, customization: CustomizationPreferences) -> Result<()> {
        customization.layout.validate()?;
        self.customization.send_if_modified(|current| {
            if *current == customization {
                return false;
            }
            *current = customization;
            true
        });
        Ok(())
    }

    /// Apply every customization field of a preset, or nothing on failure.
    pub fn apply_layout_preset(&self, preset: &LayoutPreset) -> Result<()> {
        preset.validate()?;
        self.customization.send_replace(preset.customization());
        info!("[LAYOUT] Applied preset '{}' ({})", preset.name, preset.id);
        Ok(())
    }

    /// Snapshot the current customization into a new preset.
    pub fn save_layout_preset(&self, name: &str) -> Result<LayoutPreset> {
        let preset = LayoutPreset::new(name, &self.customization.borrow())?;
        info!("[LAYOUT] Saved preset '{}' ({})", preset.name, preset.id);
        Ok(preset)
    }

    /// Restore built-in defaults, keeping the current screen configuration.
    pub fn reset_to_defaults(&self) {
        let configuration = self.layout.borrow().configuration;
        self.layout.send_replace(LayoutState {
            configuration,
            ..LayoutState::default()
        });
        self.customization
            .send_replace(CustomizationPreferences::default());
        info!("[LAYOUT] Reset to defaults");
    }
}

/// A consumer's read-only view of the layout streams.
pub struct AttachedLayout {
    layout: watch::Receiver<LayoutState>,
    customization: watch::Receiver<CustomizationPreferences>,
    attached: Arc<AtomicUsize>,
}

impl AttachedLayout {
    /// Latest layout snapshot, marking it seen.
    pub fn layout(&mut self) -> LayoutState {
        self.layout.borrow_and_update().clone()
    }

    /// Latest customization snapshot, marking it seen.
    pub fn customization(&mut self) -> CustomizationPreferences {
        self.customization.borrow_and_update().clone()
    }

    /// Whether the layout changed since it was last read.
    pub fn has_layout_changed(&self) -> bool {
        self.layout.has_changed().unwrap_or(false)
    }

    /// Wait for the next layout change. Returns false once the manager is gone.
    pub async fn layout_changed(&mut self) -> bool {
        self.layout.changed().await.is_ok()
    }

    /// Wait for the next customization change. Returns false once the manager is gone.
    pub async fn customization_changed(&mut self) -> bool {
        self.customization.changed().await.is_ok()
    }
}

impl Drop for AttachedLayout {
    fn drop(&mut self) {
        let remaining = self.attached.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!("[LAYOUT] Consumer detached ({} live)", remaining);
    }
}
