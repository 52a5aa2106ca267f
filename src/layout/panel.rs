//! Quick-access slide-over panel.

use serde::{Deserialize, Serialize};

use crate::layout::types::PanelType;

/// Visibility, expansion and content of the quick-access panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PanelState {
    pub is_visible: bool,
    pub is_expanded: bool,
    pub content_type: PanelType,
}

/// Pure state holder for the quick-access panel. Lives for the session.
#[derive(Debug, Clone, Default)]
pub struct QuickAccessPanelController {
    state: PanelState,
}

impl QuickAccessPanelController {
    pub fn new(content_type: PanelType) -> Self {
        Self {
            state: PanelState {
                content_type,
                ..PanelState::default()
            },
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible
    }

    pub fn is_expanded(&self) -> bool {
        self.state.is_expanded
    }

    pub fn content_type(&self) -> PanelType {
        self.state.content_type
    }

    /// Show the panel with the given content.
    pub fn show_panel(&mut self, content_type: PanelType) {
        self.state.is_visible = true;
        self.state.content_type = content_type;
    }

    /// Hide the panel. Expansion is kept for the next show.
    pub fn hide_panel(&mut self) {
        self.state.is_visible = false;
    }

    pub fn toggle_panel(&mut self) {
        self.state.is_visible = !self.state.is_visible;
    }

    pub fn expand_panel(&mut self) {
        self.state.is_expanded = true;
    }

    pub fn collapse_panel(&mut self) {
        self.state.is_expanded = false;
    }

    pub fn toggle_expansion(&mut self) {
        self.state.is_expanded = !self.state.is_expanded;
    }

    /// Change content without touching visibility.
    pub fn switch_panel_type(&mut self, content_type: PanelType) {
        self.state.content_type = content_type;
    }
}
