//! Responsive Layout Engine
//!
//! Maps a screen reading to a [`LayoutMode`] and sizes the pad grid for it.
//! Everything here is a pure function of its inputs and safe to call on
//! every layout pass.
//!
//! # Thresholds (dp)
//!
//! | Rule                                   | Result             |
//! |----------------------------------------|--------------------|
//! | `min(width, height) >= 600`            | `Tablet`           |
//! | landscape orientation                  | `Landscape`        |
//! | portrait, `width < 360` or `height < 840` | `CompactPortrait` |
//! | otherwise                              | `StandardPortrait` |

use serde::{Deserialize, Serialize};

use crate::layout::types::{
    LayoutMode, Orientation, ScreenConfiguration, ScreenMetrics, SizeClass, MAX_PAD_COUNT,
};

/// Smallest side at which a device is treated as a tablet.
pub const TABLET_MIN_SMALLEST_SIDE_DP: f32 = 600.0;

/// Portrait screens narrower than this are compact.
pub const STANDARD_PORTRAIT_MIN_WIDTH_DP: f32 = 360.0;

/// Portrait screens shorter than this are compact.
pub const STANDARD_PORTRAIT_MIN_HEIGHT_DP: f32 = 840.0;

/// Width class boundaries.
pub const MEDIUM_WIDTH_DP: f32 = 600.0;
pub const EXPANDED_WIDTH_DP: f32 = 840.0;

/// Height class boundaries.
pub const MEDIUM_HEIGHT_DP: f32 = 480.0;
pub const EXPANDED_HEIGHT_DP: f32 = 900.0;

/// Minimum comfortable touch target for a pad.
pub const MIN_TOUCH_TARGET_DP: f32 = 48.0;

/// Portrait layouts never use more than this many columns.
pub const MAX_PORTRAIT_COLUMNS: u32 = 4;

/// Classify a screen reading into a layout mode.
pub fn classify(width_dp: f32, height_dp: f32, orientation: Orientation) -> LayoutMode {
    if width_dp.min(height_dp) >= TABLET_MIN_SMALLEST_SIDE_DP {
        return LayoutMode::Tablet;
    }

    match orientation {
        Orientation::Landscape => LayoutMode::Landscape,
        Orientation::Portrait => {
            if width_dp < STANDARD_PORTRAIT_MIN_WIDTH_DP
                || height_dp < STANDARD_PORTRAIT_MIN_HEIGHT_DP
            {
                LayoutMode::CompactPortrait
            } else {
                LayoutMode::StandardPortrait
            }
        }
    }
}

pub fn width_class(width_dp: f32) -> SizeClass {
    if width_dp < MEDIUM_WIDTH_DP {
        SizeClass::Compact
    } else if width_dp < EXPANDED_WIDTH_DP {
        SizeClass::Medium
    } else {
        SizeClass::Expanded
    }
}

pub fn height_class(height_dp: f32) -> SizeClass {
    if height_dp < MEDIUM_HEIGHT_DP {
        SizeClass::Compact
    } else if height_dp < EXPANDED_HEIGHT_DP {
        SizeClass::Medium
    } else {
        SizeClass::Expanded
    }
}

impl ScreenConfiguration {
    /// Classify a reading into a full configuration.
    pub fn from_metrics(metrics: ScreenMetrics) -> Self {
        Self {
            layout_mode: classify(metrics.width_dp, metrics.height_dp, metrics.orientation),
            width_class: width_class(metrics.width_dp),
            height_class: height_class(metrics.height_dp),
            metrics,
        }
    }
}

/// Spacing between pads for a layout mode, in dp.
pub fn spacing_for(mode: LayoutMode) -> f32 {
    match mode {
        LayoutMode::CompactPortrait => 4.0,
        LayoutMode::StandardPortrait => 8.0,
        LayoutMode::Landscape => 6.0,
        LayoutMode::Tablet => 12.0,
    }
}

/// Pad grid arrangement chosen for an available area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub rows: u32,
    pub columns: u32,
    /// Side length of a square pad, in dp
    pub pad_size: f32,
    pub spacing: f32,
    /// Whether `pad_size` reaches [`MIN_TOUCH_TARGET_DP`]
    pub meets_touch_target: bool,
}

/// Choose the row/column split that gives the largest square pads.
///
/// Splits reaching the minimum touch target always beat those that do not.
/// Among equals the split with fewer columns wins. `pad_count` is clamped to
/// `1..=MAX_PAD_COUNT`.
pub fn grid_dimensions(
    mode: LayoutMode,
    pad_count: u32,
    width_dp: f32,
    height_dp: f32,
) -> GridDimensions {
    let pad_count = pad_count.clamp(1, u32::from(MAX_PAD_COUNT));
    let spacing = spacing_for(mode);
    let max_columns = match mode {
        LayoutMode::CompactPortrait | LayoutMode::StandardPortrait => {
            pad_count.min(MAX_PORTRAIT_COLUMNS)
        }
        LayoutMode::Landscape | LayoutMode::Tablet => pad_count,
    };

    let mut best: Option<GridDimensions> = None;
    for columns in 1..=max_columns {
        let rows = pad_count.div_ceil(columns);
        let candidate = GridDimensions {
            rows,
            columns,
            pad_size: pad_size_for(rows, columns, spacing, width_dp, height_dp),
            spacing,
            meets_touch_target: false,
        };
        let candidate = GridDimensions {
            meets_touch_target: candidate.pad_size >= MIN_TOUCH_TARGET_DP,
            ..candidate
        };

        best = match best {
            Some(current) if !is_better(&candidate, &current) => Some(current),
            _ => Some(candidate),
        };
    }

    // max_columns >= 1, so the loop ran at least once
    best.unwrap_or(GridDimensions {
        rows: pad_count,
        columns: 1,
        pad_size: 0.0,
        spacing,
        meets_touch_target: false,
    })
}

fn pad_size_for(rows: u32, columns: u32, spacing: f32, width_dp: f32, height_dp: f32) -> f32 {
    let usable_width = width_dp - spacing * (columns - 1) as f32;
    let usable_height = height_dp - spacing * (rows - 1) as f32;
    (usable_width / columns as f32)
        .min(usable_height / rows as f32)
        .max(0.0)
}

fn is_better(candidate: &GridDimensions, current: &GridDimensions) -> bool {
    match (candidate.meets_touch_target, current.meets_touch_target) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.pad_size > current.pad_size,
    }
}
