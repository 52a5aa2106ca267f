//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use log::info;

use crate::cli::PresetAction;
use crate::layout::{
    grid_dimensions, GridDimensions, LayoutMode, Orientation, ScreenConfiguration, ScreenMetrics,
};
use crate::presets::{JsonPreferenceStore, LayoutPresetManager, PresetUiState};

const DEFAULT_PAD_COUNT: u32 = 16;

fn orientation(landscape: bool) -> Orientation {
    if landscape {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

fn print_grid(grid: &GridDimensions) {
    println!(
        "Grid: {} x {} pads, {:.1}dp each, {:.0}dp spacing",
        grid.rows, grid.columns, grid.pad_size, grid.spacing
    );
    if !grid.meets_touch_target {
        println!("Warning: pads are below the minimum touch target");
    }
}

/// Classify a screen and print its mode, size classes and default grid.
pub fn classify(width: f32, height: f32, landscape: bool) -> anyhow::Result<()> {
    let metrics = ScreenMetrics::new(width, height, orientation(landscape));
    let configuration = ScreenConfiguration::from_metrics(metrics);

    println!("Layout mode: {}", configuration.layout_mode);
    println!("Width class: {}", configuration.width_class);
    println!("Height class: {}", configuration.height_class);
    print_grid(&grid_dimensions(
        configuration.layout_mode,
        DEFAULT_PAD_COUNT,
        width,
        height,
    ));

    Ok(())
}

/// Print the grid for `pads` pads in the given area.
pub fn grid(width: f32, height: f32, pads: u32, landscape: bool) -> anyhow::Result<()> {
    let mode: LayoutMode = ScreenConfiguration::from_metrics(ScreenMetrics::new(
        width,
        height,
        orientation(landscape),
    ))
    .layout_mode;

    println!("Layout mode: {}", mode);
    print_grid(&grid_dimensions(mode, pads, width, height));
    Ok(())
}

/// Run one preset command against the store in `store_dir`.
pub async fn presets(store_dir: &Path, action: PresetAction) -> anyhow::Result<()> {
    info!("Opening preference store: {}", store_dir.display());
    let store = JsonPreferenceStore::open(store_dir)
        .with_context(|| format!("Failed to open store at {}", store_dir.display()))?;
    let manager = LayoutPresetManager::new(store);

    match action {
        PresetAction::List => {
            list_presets(&manager.ui_state());
            return Ok(());
        }
        PresetAction::Create { name } => manager.create_preset(&name).await,
        PresetAction::Apply { id } => manager.apply_preset(&id).await,
        PresetAction::Delete { id } => manager.delete_preset(&id).await,
        PresetAction::Duplicate { id, name } => manager.duplicate_preset(&id, &name).await,
        PresetAction::Export { id, out } => {
            if let Some(json) = manager.export_preset(&id) {
                match out {
                    Some(path) => fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?,
                    None => println!("{}", json),
                }
            }
        }
        PresetAction::Import { file, name } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            manager.import_preset(&text, name.as_deref()).await;
        }
        PresetAction::Reset => manager.reset_to_defaults().await,
    }

    report(&manager.ui_state())
}

fn list_presets(state: &PresetUiState) {
    if state.presets.is_empty() {
        println!("No presets saved");
        return;
    }

    println!("Presets ({}):", state.presets.len());
    for preset in &state.presets {
        let marker = if state.active_preset_id.as_deref() == Some(preset.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {}  {}  ({} pads, created {})",
            marker,
            preset.id,
            preset.name,
            preset.layout_customization.pad_count,
            preset.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn report(state: &PresetUiState) -> anyhow::Result<()> {
    if let Some(error) = &state.error_message {
        bail!("{}", error);
    }
    if let Some(message) = &state.message {
        // Export to stdout already printed the payload.
        eprintln!("{}", message);
    }
    Ok(())
}
