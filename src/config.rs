// src/config.rs - Controller thresholds and driver settings
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // Biometric gate
    pub scan_step: u8,
    pub scan_decay: u8,
    pub scan_sound_modulo: u64,

    // Drawing / analysis
    pub victory_cooldown_ms: f64,
    pub fist_hold_ms: f64,
    pub fist_refractory_ms: f64,
    pub min_stroke_move: f64,
    pub analysis_delay_ms: f64,

    // Skeleton instrument
    pub tone_move_threshold: f64,

    // Classifiers
    pub pinch_ratio: f64,
    pub brow_threshold: f64,
    pub smile_threshold: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            scan_step: 2,
            scan_decay: 5,
            scan_sound_modulo: 10,
            victory_cooldown_ms: 5000.0,
            fist_hold_ms: 1500.0,
            fist_refractory_ms: 2000.0,
            min_stroke_move: 0.005,
            analysis_delay_ms: 1500.0,
            tone_move_threshold: 0.05,
            pinch_ratio: 0.25,
            brow_threshold: 0.3,
            smile_threshold: 0.5,
        }
    }
}

impl ControllerConfig {
    /// Load from a JSON file; omitted keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controller can't run with.
    pub fn validate(&self) -> Result<()> {
        if self.scan_step == 0 {
            anyhow::bail!("scan_step must be positive");
        }
        if self.scan_sound_modulo == 0 {
            anyhow::bail!("scan_sound_modulo must be positive");
        }
        let durations = [
            ("victory_cooldown_ms", self.victory_cooldown_ms),
            ("fist_hold_ms", self.fist_hold_ms),
            ("fist_refractory_ms", self.fist_refractory_ms),
            ("analysis_delay_ms", self.analysis_delay_ms),
        ];
        for (name, value) in durations {
            if !(value.is_finite() && value >= 0.0) {
                anyhow::bail!("{} must be a non-negative number of milliseconds", name);
            }
        }
        let thresholds = [
            ("min_stroke_move", self.min_stroke_move),
            ("tone_move_threshold", self.tone_move_threshold),
            ("pinch_ratio", self.pinch_ratio),
            ("brow_threshold", self.brow_threshold),
            ("smile_threshold", self.smile_threshold),
        ];
        for (name, value) in thresholds {
            if !(value.is_finite() && value >= 0.0) {
                anyhow::bail!("{} must be a non-negative number", name);
            }
        }
        Ok(())
    }
}

/// Settings for the replay binary.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub input: PathBuf,
    pub config_path: Option<PathBuf>,
    pub export_directory: Option<PathBuf>,
    pub realtime: bool,
}

impl AppSettings {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            config_path: None,
            export_directory: None,
            realtime: false,
        }
    }

    pub fn default_export_directory() -> PathBuf {
        directories::UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(|p| p.join("HoloHud")))
            .unwrap_or_else(|| PathBuf::from("./output"))
    }

    pub fn controller_config(&self) -> Result<ControllerConfig> {
        match &self.config_path {
            Some(path) => ControllerConfig::load(path),
            None => Ok(ControllerConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ControllerConfig::from_json(r#"{"victory_cooldown_ms": 2500, "scan_step": 4}"#).unwrap();
        assert_eq!(config.victory_cooldown_ms, 2500.0);
        assert_eq!(config.scan_step, 4);
        assert_eq!(config.fist_hold_ms, 1500.0);
        assert_eq!(config.pinch_ratio, 0.25);
    }

    #[test]
    fn test_rejects_zero_scan_step() {
        let err = ControllerConfig::from_json(r#"{"scan_step": 0}"#).unwrap_err();
        assert!(err.to_string().contains("scan_step"));
    }

    #[test]
    fn test_rejects_negative_duration() {
        assert!(ControllerConfig::from_json(r#"{"fist_hold_ms": -1}"#).is_err());
    }

    #[test]
    fn test_rejects_nan_threshold() {
        let config = ControllerConfig {
            pinch_ratio: f64::NAN,
            ..ControllerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pinch_ratio"));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = ControllerConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_settings_without_config_use_defaults() {
        let settings = AppSettings::new("session.jsonl");
        assert_eq!(settings.controller_config().unwrap(), ControllerConfig::default());
    }
}
