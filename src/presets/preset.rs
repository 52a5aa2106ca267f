//! Layout Presets and their export format
//!
//! A preset is a named snapshot of [`CustomizationPreferences`]. Exported
//! presets are pretty-printed JSON wrapped in a small envelope:
//!
//! ```json
//! {
//!   "format": "padboard-preset",
//!   "version": 1,
//!   "checksum": "<sha256 of the compact preset JSON>",
//!   "preset": { "id": "...", "name": "...", ... }
//! }
//! ```
//!
//! Import also accepts a bare preset object without the envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{PadboardError, Result};
use crate::layout::types::{
    CustomizationPreferences, FeatureVisibilityPreferences, LayoutCustomization, PanelPositions,
};

/// Envelope format tag for exported presets.
pub const EXPORT_FORMAT: &str = "padboard-preset";

/// Newest envelope version this build reads and writes.
pub const EXPORT_VERSION: u32 = 1;

/// Prefix for ids of locally created presets.
const PRESET_ID_PREFIX: &str = "preset_";

/// Prefix for ids of imported presets.
const IMPORTED_ID_PREFIX: &str = "imported_";

/// A named, persisted snapshot of layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPreset {
    /// Unique identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Layout settings captured by the preset.
    pub layout_customization: LayoutCustomization,

    /// Feature visibility captured by the preset.
    pub feature_visibility: FeatureVisibilityPreferences,

    /// Panel docking captured by the preset.
    #[serde(default)]
    pub panel_positions: PanelPositions,

    /// When the preset was created (or imported).
    pub created_at: DateTime<Utc>,

    /// Built-in presets cannot be told apart by content, so they carry a flag.
    #[serde(default)]
    pub is_default: bool,
}

impl LayoutPreset {
    /// Snapshot customization into a new preset with a fresh id.
    pub fn new(name: &str, customization: &CustomizationPreferences) -> Result<Self> {
        let preset = Self {
            id: format!("{}{}", PRESET_ID_PREFIX, Uuid::new_v4()),
            name: validated_name(name)?,
            layout_customization: customization.layout.clone(),
            feature_visibility: customization.visibility,
            panel_positions: customization.panel_positions.clone(),
            created_at: Utc::now(),
            is_default: false,
        };
        preset.validate()?;
        Ok(preset)
    }

    /// The customization this preset restores.
    pub fn customization(&self) -> CustomizationPreferences {
        CustomizationPreferences {
            layout: self.layout_customization.clone(),
            visibility: self.feature_visibility,
            panel_positions: self.panel_positions.clone(),
        }
    }

    /// Check the name and customization ranges.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PadboardError::InvalidPresetName {
                name: self.name.clone(),
            });
        }
        self.layout_customization.validate()
    }

    /// True if both presets restore the same settings.
    pub fn same_content(&self, other: &LayoutPreset) -> bool {
        self.layout_customization == other.layout_customization
            && self.feature_visibility == other.feature_visibility
            && self.panel_positions == other.panel_positions
    }

    /// Same identity, new content. The caller re-saves the preset list.
    pub fn updated_from(&self, customization: &CustomizationPreferences) -> Result<Self> {
        let updated = Self {
            layout_customization: customization.layout.clone(),
            feature_visibility: customization.visibility,
            panel_positions: customization.panel_positions.clone(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    /// Copy under a new name and id.
    pub fn duplicate(&self, new_name: &str) -> Result<Self> {
        Ok(Self {
            id: format!("{}{}", PRESET_ID_PREFIX, Uuid::new_v4()),
            name: validated_name(new_name)?,
            created_at: Utc::now(),
            is_default: false,
            ..self.clone()
        })
    }

    /// Give a parsed preset a new local identity.
    ///
    /// `existing` is consulted so the `imported_<millis>` id stays unique
    /// when several imports land in the same millisecond.
    pub fn into_imported(
        self,
        new_name: Option<&str>,
        existing: &[LayoutPreset],
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let name = match new_name {
            Some(name) => validated_name(name)?,
            None => format!("{} (Imported)", self.name),
        };

        let base = format!("{}{}", IMPORTED_ID_PREFIX, now.timestamp_millis());
        let mut id = base.clone();
        let mut suffix = 1;
        while existing.iter().any(|preset| preset.id == id) {
            id = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        let imported = Self {
            id,
            name,
            created_at: now,
            is_default: false,
            ..self
        };
        imported.validate()?;
        Ok(imported)
    }
}

fn validated_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PadboardError::InvalidPresetName {
            name: name.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Exported preset envelope.
#[derive(Debug, Serialize, Deserialize)]
struct PresetExport {
    format: String,
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
    preset: LayoutPreset,
}

/// SHA-256 of the compact JSON form of a preset, hex encoded.
pub fn preset_checksum(preset: &LayoutPreset) -> Result<String> {
    let content = serde_json::to_vec(preset)?;
    Ok(format!("{:x}", Sha256::digest(&content)))
}

/// Serialize a preset to its transportable text form.
pub fn export_preset(preset: &LayoutPreset) -> Result<String> {
    let envelope = PresetExport {
        format: EXPORT_FORMAT.to_string(),
        version: EXPORT_VERSION,
        checksum: Some(preset_checksum(preset)?),
        preset: preset.clone(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse exported text back into a preset, verifying the envelope.
///
/// The returned preset still carries its original identity; see
/// [`LayoutPreset::into_imported`].
pub fn parse_exported(text: &str) -> Result<LayoutPreset> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let is_envelope = value
        .as_object()
        .map(|object| object.contains_key("preset"))
        .unwrap_or(false);
    if !is_envelope {
        let preset: LayoutPreset = serde_json::from_value(value)?;
        return Ok(preset);
    }

    let envelope: PresetExport = serde_json::from_value(value)?;
    if envelope.format != EXPORT_FORMAT || envelope.version > EXPORT_VERSION {
        return Err(PadboardError::UnsupportedPresetFormat {
            format: envelope.format,
            version: envelope.version,
        });
    }

    if let Some(expected) = envelope.checksum {
        let actual = preset_checksum(&envelope.preset)?;
        if actual != expected {
            return Err(PadboardError::ChecksumMismatch { expected, actual });
        }
    }

    Ok(envelope.preset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::{PanelPosition, PanelType};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_preset() -> LayoutPreset {
        let mut customization = CustomizationPreferences::default();
        customization.layout.pad_count = 12;
        customization.layout.ui_scale = 1.25;
        customization.visibility.show_sequencer = true;
        customization
            .panel_positions
            .insert(PanelType::Midi, PanelPosition::Floating { x: 32.5, y: 64.0 });
        LayoutPreset::new("Studio", &customization).unwrap()
    }

    #[test]
    fn test_new_preset_identity() {
        let first = sample_preset();
        let second = sample_preset();
        assert!(first.id.starts_with("preset_"));
        assert_ne!(first.id, second.id);
        assert!(!first.is_default);
    }

    #[test]
    fn test_name_is_trimmed() {
        let preset = LayoutPreset::new("  Gig  ", &CustomizationPreferences::default()).unwrap();
        assert_eq!(preset.name, "Gig");
    }

    #[test]
    fn test_export_then_parse_keeps_everything() {
        let preset = sample_preset();
        let text = export_preset(&preset).unwrap();
        assert!(text.contains("\"format\": \"padboard-preset\""));

        let parsed = parse_exported(&text).unwrap();
        assert_eq!(parsed, preset);
    }

    #[test]
    fn test_parse_accepts_bare_preset() {
        let preset = sample_preset();
        let bare = serde_json::to_string(&preset).unwrap();
        assert_eq!(parse_exported(&bare).unwrap(), preset);
    }

    #[test]
    fn test_tampered_export_is_rejected() {
        let text = export_preset(&sample_preset()).unwrap();
        let tampered = text.replace("\"pad_count\": 12", "\"pad_count\": 13");
        assert_ne!(text, tampered);

        let err = parse_exported(&tampered).unwrap_err();
        assert_eq!(err.error_code(), "CHECKSUM_MISMATCH");
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let text = export_preset(&sample_preset()).unwrap();
        let newer = text.replace("\"version\": 1", "\"version\": 2");
        let err = parse_exported(&newer).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_PRESET_FORMAT");
    }

    #[test]
    fn test_garbage_is_a_serialization_error() {
        let err = parse_exported("definitely not json").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_into_imported_regenerates_identity() {
        let mut original = sample_preset();
        original.is_default = true;
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let imported = original.clone().into_imported(None, &[], now).unwrap();
        assert_eq!(imported.id, format!("imported_{}", now.timestamp_millis()));
        assert_eq!(imported.name, "Studio (Imported)");
        assert_eq!(imported.created_at, now);
        assert!(!imported.is_default);
        assert!(imported.same_content(&original));
    }

    #[test]
    fn test_into_imported_avoids_id_collision() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let first = sample_preset().into_imported(None, &[], now).unwrap();
        let second = sample_preset()
            .into_imported(Some("Copy"), std::slice::from_ref(&first), now)
            .unwrap();

        assert_eq!(second.id, format!("{}_1", first.id));
        assert_eq!(second.name, "Copy");
    }

    #[test]
    fn test_duplicate_and_update() {
        let preset = sample_preset();
        let copy = preset.duplicate("Studio B").unwrap();
        assert_ne!(copy.id, preset.id);
        assert!(copy.same_content(&preset));

        let updated = preset
            .updated_from(&CustomizationPreferences::default())
            .unwrap();
        assert_eq!(updated.id, preset.id);
        assert_eq!(updated.created_at, preset.created_at);
        assert!(!updated.same_content(&preset));
    }
}
