//! Engine Configuration
//!
//! Every tunable of the recovery pipeline lives here, stored in TOML
//! format. Defaults match the thresholds the models were calibrated
//! against; override per deployment.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Plate-region selection from detector output
    pub locate: LocateConfig,
    /// Character region extraction
    pub extraction: ExtractionConfig,
    /// Row clustering
    pub rows: RowClusterConfig,
    /// Image variant generation
    pub variants: VariantConfig,
    /// Per-character recognition fusion
    pub fusion: FusionConfig,
    /// Whole-region OCR fallback strategy
    pub whole_plate: WholePlateConfig,
    /// Text assembly and noise suppression
    pub assembly: AssemblyConfig,
    /// Gate-open decision policy
    pub gate: GateConfig,
}

/// Plate-region selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocateConfig {
    /// Padding around the winning detection, as a fraction of the longer
    /// box side. Helps OCR pick up characters touching the box edge.
    pub pad_ratio: f32,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self { pad_ratio: 0.05 }
    }
}

/// Character region extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Minimum detection confidence for a region to be considered.
    /// Detections exactly at the threshold are kept.
    pub min_confidence: f32,
    /// Padding as a fraction of the box side, per axis.
    pub padding_ratio: f32,
    /// Padding floor in pixels.
    pub padding_min_px: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            padding_ratio: 0.10,
            padding_min_px: 3,
        }
    }
}

/// Row clustering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowClusterConfig {
    /// Row threshold as a fraction of the average region height.
    /// Absorbs per-character baseline jitter while keeping the serial
    /// line and the province line apart.
    pub height_factor: f32,
    /// Row threshold floor in pixels.
    pub min_threshold_px: f32,
}

impl Default for RowClusterConfig {
    fn default() -> Self {
        Self {
            height_factor: 0.5,
            min_threshold_px: 20.0,
        }
    }
}

/// Image variant generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantConfig {
    /// Target height for the upscaled rendering of a character crop.
    pub target_height: u32,
    /// Minimum upscale factor even for already-large crops.
    pub min_scale: f32,
    /// Block radius for the windowed adaptive threshold (window is
    /// `2 * radius + 1` pixels).
    pub adaptive_block_radius: u32,
    /// Constant subtracted from the local mean before thresholding.
    pub adaptive_offset: i16,
    /// Tile grid size per axis for local contrast equalization.
    pub equalize_tiles: u32,
    /// Histogram clip limit for local contrast equalization.
    pub equalize_clip_limit: f32,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            target_height: 120,
            min_scale: 2.0,
            adaptive_block_radius: 15,
            adaptive_offset: 11,
            equalize_tiles: 8,
            equalize_clip_limit: 2.0,
        }
    }
}

/// Per-character fusion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Classifier results at or below this confidence are discarded.
    pub classifier_min_confidence: f32,
    /// Minimum hint confidence for the hint fallback stage.
    pub hint_min_confidence: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            classifier_min_confidence: 0.3,
            hint_min_confidence: 0.5,
        }
    }
}

/// Whole-region OCR settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WholePlateConfig {
    /// Target height for the upscaled plate crop.
    pub target_height: u32,
    /// Minimum upscale factor.
    pub min_scale: f32,
}

impl Default for WholePlateConfig {
    fn default() -> Self {
        Self {
            target_height: 400,
            min_scale: 3.0,
        }
    }
}

/// Assembly and noise suppression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// If the allowed-set-only form of the assembled string keeps fewer
    /// than this fraction of its characters, the filtered form is
    /// preferred as the final text. Empirically tuned.
    pub noise_keep_ratio: f32,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self { noise_keep_ratio: 0.7 }
    }
}

/// Gate-open trigger mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateTrigger {
    /// Open on every recorded read.
    #[default]
    EveryRecord,
    /// Open at most once per plate within the cooldown window.
    PerPlateCooldown,
}

/// Gate decision policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Open regardless of the read. Maintenance override.
    pub force_open: bool,
    /// Trigger mode.
    pub trigger: GateTrigger,
    /// Cooldown window in seconds for `PerPlateCooldown`.
    pub cooldown_secs: u64,
    /// Normalized plate prefixes allowed through when `strict` is set.
    pub allowed_prefixes: Vec<String>,
    /// Enforce the prefix allowlist.
    pub strict: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            force_open: false,
            trigger: GateTrigger::EveryRecord,
            cooldown_secs: 10,
            allowed_prefixes: Vec::new(),
            strict: false,
        }
    }
}

/// Load configuration from file.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file.
pub fn save_config(config: &EngineConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_engine_config() {
        let config = EngineConfig::default();

        assert!((config.locate.pad_ratio - 0.05).abs() < 1e-6);
        assert!((config.extraction.min_confidence - 0.3).abs() < 1e-6);
        assert_eq!(config.extraction.padding_min_px, 3);
        assert!((config.rows.height_factor - 0.5).abs() < 1e-6);
        assert!((config.rows.min_threshold_px - 20.0).abs() < 1e-6);
        assert_eq!(config.variants.target_height, 120);
        assert!((config.fusion.hint_min_confidence - 0.5).abs() < 1e-6);
        assert_eq!(config.whole_plate.target_height, 400);
        assert!((config.assembly.noise_keep_ratio - 0.7).abs() < 1e-6);
        assert_eq!(config.gate.trigger, GateTrigger::EveryRecord);
        assert!(!config.gate.force_open);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = EngineConfig::default();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.variants.target_height, config.variants.target_height);
        assert_eq!(parsed.gate.cooldown_secs, config.gate.cooldown_secs);
        assert!((parsed.assembly.noise_keep_ratio - config.assembly.noise_keep_ratio).abs() < 1e-6);
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = EngineConfig::default();
        config.extraction.min_confidence = 0.4;
        config.rows.height_factor = 0.35;
        config.gate.trigger = GateTrigger::PerPlateCooldown;
        config.gate.allowed_prefixes = vec!["กร".to_string(), "กต".to_string()];

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml_str).unwrap();

        assert!((parsed.extraction.min_confidence - 0.4).abs() < 1e-6);
        assert!((parsed.rows.height_factor - 0.35).abs() < 1e-6);
        assert_eq!(parsed.gate.trigger, GateTrigger::PerPlateCooldown);
        assert_eq!(parsed.gate.allowed_prefixes.len(), 2);
    }

    #[test]
    fn test_save_and_load_config() {
        let config = EngineConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(loaded.variants.target_height, config.variants.target_height);
        assert_eq!(loaded.extraction.padding_min_px, config.extraction.padding_min_px);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
