//! Layout Data Model
//!
//! Screen configuration, panel/section identifiers and the customization
//! records that presets snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PadboardError, Result};

/// Discrete screen-size/orientation bucket driving panel arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Small phone held upright
    #[default]
    CompactPortrait,
    /// Regular phone held upright
    StandardPortrait,
    /// Phone turned sideways
    Landscape,
    /// Smallest side of at least 600dp, either orientation
    Tablet,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutMode::CompactPortrait => write!(f, "Compact Portrait"),
            LayoutMode::StandardPortrait => write!(f, "Standard Portrait"),
            LayoutMode::Landscape => write!(f, "Landscape"),
            LayoutMode::Tablet => write!(f, "Tablet"),
        }
    }
}

/// Device orientation as reported by the hosting surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Per-axis window size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    #[default]
    Compact,
    Medium,
    Expanded,
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeClass::Compact => write!(f, "compact"),
            SizeClass::Medium => write!(f, "medium"),
            SizeClass::Expanded => write!(f, "expanded"),
        }
    }
}

/// A size/orientation reading from the hosting surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenMetrics {
    pub width_dp: f32,
    pub height_dp: f32,
    pub orientation: Orientation,
}

impl ScreenMetrics {
    pub fn new(width_dp: f32, height_dp: f32, orientation: Orientation) -> Self {
        Self {
            width_dp,
            height_dp,
            orientation,
        }
    }
}

/// Classified screen configuration.
///
/// Build with [`ScreenConfiguration::from_metrics`]. `LayoutStateManager`
/// re-derives every classified field from `metrics` on update, so the
/// published `layout_mode` is always a pure function of the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenConfiguration {
    pub layout_mode: LayoutMode,
    pub width_class: SizeClass,
    pub height_class: SizeClass,
    pub metrics: ScreenMetrics,
}

/// Independently toggle-able UI region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelType {
    #[default]
    Sampling,
    Midi,
    Mixer,
    Effects,
    Sequencer,
    Settings,
}

impl PanelType {
    pub const ALL: [PanelType; 6] = [
        PanelType::Sampling,
        PanelType::Midi,
        PanelType::Mixer,
        PanelType::Effects,
        PanelType::Sequencer,
        PanelType::Settings,
    ];
}

impl fmt::Display for PanelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelType::Sampling => write!(f, "Sampling"),
            PanelType::Midi => write!(f, "MIDI"),
            PanelType::Mixer => write!(f, "Mixer"),
            PanelType::Effects => write!(f, "Effects"),
            PanelType::Sequencer => write!(f, "Sequencer"),
            PanelType::Settings => write!(f, "Settings"),
        }
    }
}

/// Collapsible section of the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    PadGrid,
    Transport,
    Waveform,
    Sequencer,
    Mixer,
    Effects,
}

/// Where a panel docks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dock", rename_all = "snake_case")]
pub enum PanelPosition {
    Left,
    Right,
    Top,
    Bottom,
    /// Free-floating, offset in dp from the top-left corner
    Floating { x: f32, y: f32 },
}

pub type PanelPositions = BTreeMap<PanelType, PanelPosition>;

/// Default docking for every panel type.
pub fn default_panel_positions() -> PanelPositions {
    PanelType::ALL
        .iter()
        .map(|&panel| {
            let position = match panel {
                PanelType::Sampling | PanelType::Midi => PanelPosition::Left,
                PanelType::Mixer | PanelType::Effects => PanelPosition::Right,
                PanelType::Sequencer => PanelPosition::Bottom,
                PanelType::Settings => PanelPosition::Top,
            };
            (panel, position)
        })
        .collect()
}

/// Canonical layout state owned by the layout manager.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutState {
    pub configuration: ScreenConfiguration,
    pub panel_visibility: BTreeMap<PanelType, bool>,
    pub collapsed_sections: BTreeSet<SectionType>,
}

impl LayoutState {
    /// Visibility of a panel; panels never set read as hidden.
    pub fn is_panel_visible(&self, panel: PanelType) -> bool {
        self.panel_visibility.get(&panel).copied().unwrap_or(false)
    }

    pub fn is_section_collapsed(&self, section: SectionType) -> bool {
        self.collapsed_sections.contains(&section)
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.configuration.layout_mode
    }
}

pub const MIN_PAD_COUNT: u8 = 1;
pub const MAX_PAD_COUNT: u8 = 64;
pub const MIN_UI_SCALE: f32 = 0.5;
pub const MAX_UI_SCALE: f32 = 2.0;
pub const MAX_PAD_SPACING_DP: f32 = 32.0;

/// User-adjustable layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutCustomization {
    /// Number of pads in the grid
    pub pad_count: u8,
    /// Extra spacing between pads, in dp
    pub pad_spacing_dp: f32,
    /// Global scale factor applied to controls
    pub ui_scale: f32,
    pub show_pad_labels: bool,
    pub compact_controls: bool,
    /// `#RRGGBB`
    pub accent_color: String,
}

impl Default for LayoutCustomization {
    fn default() -> Self {
        Self {
            pad_count: 16,
            pad_spacing_dp: 8.0,
            ui_scale: 1.0,
            show_pad_labels: true,
            compact_controls: false,
            accent_color: "#7C4DFF".to_string(),
        }
    }
}

impl LayoutCustomization {
    /// Check ranges before the customization is applied anywhere.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PAD_COUNT..=MAX_PAD_COUNT).contains(&self.pad_count) {
            return Err(PadboardError::InvalidCustomization {
                reason: format!(
                    "pad_count {} outside {}..={}",
                    self.pad_count, MIN_PAD_COUNT, MAX_PAD_COUNT
                ),
            });
        }
        if !(MIN_UI_SCALE..=MAX_UI_SCALE).contains(&self.ui_scale) {
            return Err(PadboardError::InvalidCustomization {
                reason: format!(
                    "ui_scale {} outside {}..={}",
                    self.ui_scale, MIN_UI_SCALE, MAX_UI_SCALE
                ),
            });
        }
        if !(0.0..=MAX_PAD_SPACING_DP).contains(&self.pad_spacing_dp) {
            return Err(PadboardError::InvalidCustomization {
                reason: format!(
                    "pad_spacing_dp {} outside 0..={}",
                    self.pad_spacing_dp, MAX_PAD_SPACING_DP
                ),
            });
        }
        if !is_hex_color(&self.accent_color) {
            return Err(PadboardError::InvalidCustomization {
                reason: format!("accent_color {:?} is not #RRGGBB", self.accent_color),
            });
        }
        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Which optional features are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureVisibilityPreferences {
    pub show_waveform: bool,
    pub show_velocity_meter: bool,
    pub show_midi_indicator: bool,
    pub show_quick_access: bool,
    pub show_sequencer: bool,
}

impl Default for FeatureVisibilityPreferences {
    fn default() -> Self {
        Self {
            show_waveform: true,
            show_velocity_meter: false,
            show_midi_indicator: true,
            show_quick_access: true,
            show_sequencer: false,
        }
    }
}

/// Everything a preset snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomizationPreferences {
    pub layout: LayoutCustomization,
    pub visibility: FeatureVisibilityPreferences,
    pub panel_positions: PanelPositions,
}

impl Default for CustomizationPreferences {
    fn default() -> Self {
        Self {
            layout: LayoutCustomization::default(),
            visibility: FeatureVisibilityPreferences::default(),
            panel_positions: default_panel_positions(),
        }
    }
}
