//! CLI Module
//!
//! Command-line interface for inspecting layouts and managing presets.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Padboard - drum sampler layout and preset tool
#[derive(Parser, Debug)]
#[command(name = "padboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a screen and show its default pad grid
    #[command(name = "classify")]
    Classify {
        /// Width in dp
        #[arg(long)]
        width: f32,

        /// Height in dp
        #[arg(long)]
        height: f32,

        /// Treat the screen as landscape
        #[arg(long)]
        landscape: bool,
    },

    /// Compute a pad grid for an available area
    #[command(name = "grid")]
    Grid {
        /// Width in dp
        #[arg(long)]
        width: f32,

        /// Height in dp
        #[arg(long)]
        height: f32,

        /// Number of pads
        #[arg(short, long, default_value_t = 16)]
        pads: u32,

        /// Treat the screen as landscape
        #[arg(long)]
        landscape: bool,
    },

    /// Manage layout presets in a preference directory
    #[command(name = "presets")]
    Presets {
        /// Preference directory
        #[arg(short, long)]
        store: PathBuf,

        #[command(subcommand)]
        action: PresetAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum PresetAction {
    /// List saved presets
    List,

    /// Save the current layout as a new preset
    Create {
        /// Preset name
        name: String,
    },

    /// Apply a preset
    Apply {
        /// Preset id
        id: String,
    },

    /// Delete a preset
    Delete {
        /// Preset id
        id: String,
    },

    /// Copy a preset under a new name
    Duplicate {
        /// Preset id
        id: String,

        /// Name of the copy
        name: String,
    },

    /// Export a preset as JSON
    Export {
        /// Preset id
        id: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Import a preset from an exported JSON file
    Import {
        /// Exported preset file
        file: PathBuf,

        /// Name for the imported preset
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Reset layout preferences to defaults (presets are kept)
    Reset,
}
