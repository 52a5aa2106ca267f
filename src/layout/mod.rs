//! Layout Module
//!
//! Screen classification, pad grid sizing, the session's layout state and
//! the quick-access panel.

pub mod panel;
pub mod responsive;
pub mod state;
pub mod types;

pub use panel::{PanelState, QuickAccessPanelController};
pub use responsive::{classify, grid_dimensions, GridDimensions};
pub use state::{AttachedLayout, LayoutStateManager, ModeChangeCallback};
pub use types::{
    default_panel_positions, CustomizationPreferences, FeatureVisibilityPreferences,
    LayoutCustomization, LayoutMode, LayoutState, Orientation, PanelPosition, PanelPositions,
    PanelType, ScreenConfiguration, ScreenMetrics, SectionType, SizeClass,
};
