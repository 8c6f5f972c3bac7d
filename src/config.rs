//! Simulation configuration
//!
//! Every tunable number of the bar lives here. Loaded from TOML, each section
//! optional; missing values fall back to the tuned defaults in
//! [`crate::constants`].

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::process::StartMode;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config: {field} = {value} ({reason})")]
    Invalid {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Docking and auto-capture parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockingConfig {
    pub capture_radius: f32,
    pub snap_search_radius: f32,
    pub auto_capture_on_release: bool,
}

impl Default for DockingConfig {
    fn default() -> Self {
        Self {
            capture_radius: constants::docking::CAPTURE_RADIUS,
            snap_search_radius: constants::docking::SNAP_SEARCH_RADIUS,
            auto_capture_on_release: true,
        }
    }
}

/// Ownership enforcement timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub reconcile_interval: f32,
    pub release_check_delay: f32,
    pub max_frame_delta: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: constants::timing::RECONCILE_INTERVAL,
            release_check_delay: constants::timing::RELEASE_CHECK_DELAY,
            max_frame_delta: constants::timing::MAX_FRAME_DELTA,
        }
    }
}

/// A docked stage: how long it runs and whether it pins its inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockedStageConfig {
    pub duration: f32,
    #[serde(default = "default_true")]
    pub lock_inputs: bool,
    #[serde(default)]
    pub start_mode: StartMode,
}

fn default_true() -> bool {
    true
}

impl DockedStageConfig {
    fn timed(duration: f32, lock_inputs: bool) -> Self {
        Self {
            duration,
            lock_inputs,
            start_mode: StartMode::OnCapture,
        }
    }
}

/// Steam knob and texturizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteamConfig {
    pub duration: f32,
    pub minimum_intensity: f32,
    pub min_rotation: f32,
    pub max_rotation: f32,
    pub rotation_speed: f32,
    pub on_threshold: f32,
    pub max_emission: f32,
    pub max_volume: f32,
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            duration: constants::stages::TEXTURIZING_TIME,
            minimum_intensity: constants::steam::MINIMUM_INTENSITY,
            min_rotation: constants::steam::MIN_ROTATION,
            max_rotation: constants::steam::MAX_ROTATION,
            rotation_speed: constants::steam::ROTATION_SPEED,
            on_threshold: constants::steam::STEAM_ON_THRESHOLD,
            max_emission: constants::steam::MAX_EMISSION,
            max_volume: constants::steam::MAX_VOLUME,
        }
    }
}

/// Pitcher into cup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PourConfig {
    pub pour_angle: f32,
    pub duration: f32,
    pub max_distance: f32,
}

impl Default for PourConfig {
    fn default() -> Self {
        Self {
            pour_angle: constants::pouring::POUR_ANGLE,
            duration: constants::stages::POUR_TIME_TO_COMPLETE,
            max_distance: constants::pouring::MAX_POUR_DISTANCE,
        }
    }
}

/// Carton into pitcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    pub min_angle: f32,
    pub max_angle: f32,
    pub duration: f32,
    pub fill_radius: f32,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            min_angle: constants::pouring::CARTON_MIN_POUR_ANGLE,
            max_angle: constants::pouring::CARTON_MAX_POUR_ANGLE,
            duration: constants::stages::TIME_TO_FILL,
            fill_radius: constants::pouring::FILL_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub max_outbox: usize,
    pub max_input_queue: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            max_outbox: constants::events::MAX_OUTBOX,
            max_input_queue: constants::events::MAX_INPUT_QUEUE,
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub docking: DockingConfig,
    pub timing: TimingConfig,
    pub grinder: DockedStageConfig,
    pub tamper: DockedStageConfig,
    pub extraction: DockedStageConfig,
    pub steam: SteamConfig,
    pub pour: PourConfig,
    pub fill: FillConfig,
    pub events: EventConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            docking: DockingConfig::default(),
            timing: TimingConfig::default(),
            grinder: DockedStageConfig::timed(constants::stages::GRIND_DURATION, true),
            tamper: DockedStageConfig::timed(constants::stages::PRESS_TIME, true),
            extraction: DockedStageConfig::timed(constants::stages::EXTRACTION_DURATION, false),
            steam: SteamConfig::default(),
            pour: PourConfig::default(),
            fill: FillConfig::default(),
            events: EventConfig::default(),
        }
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, value, "must be a positive number"));
    }
    Ok(())
}

impl SimulationConfig {
    /// Parse a TOML document. Missing sections keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading simulation config {}", path.display()))?;
        let config = Self::from_toml_str(&source)
            .with_context(|| format!("loading simulation config {}", path.display()))?;
        log::info!(
            "[SimulationConfig::load_from_file] Loaded configuration from {}",
            path.display()
        );
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("docking.capture_radius", self.docking.capture_radius)?;
        require_positive("docking.snap_search_radius", self.docking.snap_search_radius)?;

        require_positive("timing.reconcile_interval", self.timing.reconcile_interval)?;
        if !self.timing.release_check_delay.is_finite() || self.timing.release_check_delay < 0.0 {
            return Err(invalid(
                "timing.release_check_delay",
                self.timing.release_check_delay,
                "must be zero or positive",
            ));
        }
        require_positive("timing.max_frame_delta", self.timing.max_frame_delta)?;

        require_positive("grinder.duration", self.grinder.duration)?;
        require_positive("tamper.duration", self.tamper.duration)?;
        require_positive("extraction.duration", self.extraction.duration)?;

        require_positive("steam.duration", self.steam.duration)?;
        if self.steam.max_rotation <= self.steam.min_rotation {
            return Err(invalid(
                "steam.max_rotation",
                self.steam.max_rotation,
                "must be greater than steam.min_rotation",
            ));
        }
        if !(0.0..=1.0).contains(&self.steam.minimum_intensity) {
            return Err(invalid(
                "steam.minimum_intensity",
                self.steam.minimum_intensity,
                "must lie in [0, 1]",
            ));
        }
        require_positive("steam.rotation_speed", self.steam.rotation_speed)?;

        require_positive("pour.duration", self.pour.duration)?;
        require_positive("pour.max_distance", self.pour.max_distance)?;
        if !(0.0..180.0).contains(&self.pour.pour_angle) {
            return Err(invalid(
                "pour.pour_angle",
                self.pour.pour_angle,
                "must lie in [0, 180) degrees",
            ));
        }

        require_positive("fill.duration", self.fill.duration)?;
        require_positive("fill.fill_radius", self.fill.fill_radius)?;
        if self.fill.max_angle <= self.fill.min_angle {
            return Err(invalid(
                "fill.max_angle",
                self.fill.max_angle,
                "must be greater than fill.min_angle",
            ));
        }

        if self.events.max_outbox == 0 {
            return Err(invalid("events.max_outbox", 0, "outbox needs room for at least one event"));
        }
        if self.events.max_input_queue == 0 {
            return Err(invalid(
                "events.max_input_queue",
                0,
                "input queue needs room for at least one event",
            ));
        }

        log::info!("[SimulationConfig] Configuration validated successfully");
        Ok(())
    }

    /// Human-readable hints for fixing a rejected configuration
    pub fn suggest_defaults(&self) -> String {
        let defaults = SimulationConfig::default();
        let mut suggestions = Vec::new();

        if self.docking.capture_radius > self.docking.snap_search_radius {
            suggestions.push(format!(
                "docking.capture_radius ({}) exceeds docking.snap_search_radius ({}); props will find slots they cannot dock into",
                self.docking.capture_radius, self.docking.snap_search_radius
            ));
        }

        suggestions.push("Tuned defaults:".to_string());
        suggestions.push(format!(
            "  - capture_radius={}, snap_search_radius={}",
            defaults.docking.capture_radius, defaults.docking.snap_search_radius
        ));
        suggestions.push(format!(
            "  - reconcile_interval={}s, release_check_delay={}s",
            defaults.timing.reconcile_interval, defaults.timing.release_check_delay
        ));
        suggestions.push(format!(
            "  - grind={}s, tamp={}s, extract={}s, steam={}s, pour={}s, fill={}s",
            defaults.grinder.duration,
            defaults.tamper.duration,
            defaults.extraction.duration,
            defaults.steam.duration,
            defaults.pour.duration,
            defaults.fill.duration
        ));

        suggestions.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grinder.duration, 10.0);
        assert!(config.grinder.lock_inputs);
        assert!(!config.extraction.lock_inputs);
        assert_eq!(config.extraction.start_mode, StartMode::OnCapture);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [grinder]
            duration = 4.0

            [steam]
            minimum_intensity = 0.5
            "#,
        )
        .expect("partial config parses");

        assert_eq!(config.grinder.duration, 4.0);
        assert!(config.grinder.lock_inputs);
        assert_eq!(config.steam.minimum_intensity, 0.5);
        assert_eq!(config.steam.duration, 20.0);
        assert_eq!(config.pour, PourConfig::default());
    }

    #[test]
    fn test_manual_extraction_mode() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [extraction]
            duration = 15.0
            lock_inputs = false
            start_mode = "Manual"
            "#,
        )
        .expect("manual mode parses");
        assert_eq!(config.extraction.start_mode, StartMode::Manual);
    }

    #[test]
    fn test_rejects_inverted_knob_range() {
        let mut config = SimulationConfig::default();
        config.steam.max_rotation = -10.0;
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "steam.max_rotation"),
            other => panic!("expected invalid knob range, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_zero_durations() {
        let mut config = SimulationConfig::default();
        config.tamper.duration = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[pour]\nmax_distance = 0.5").expect("write config");

        let config = SimulationConfig::load_from_file(file.path()).expect("load config");
        assert_eq!(config.pour.max_distance, 0.5);
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = SimulationConfig::load_from_file(dir.path().join("missing.toml"))
            .expect_err("missing file must fail");
        assert!(err.to_string().contains("reading simulation config"));
    }

    #[test]
    fn test_suggestions_mention_defaults() {
        let mut config = SimulationConfig::default();
        config.docking.capture_radius = 0.5;
        let hints = config.suggest_defaults();
        assert!(hints.contains("exceeds docking.snap_search_radius"));
        assert!(hints.contains("grind=10s"));
    }
}
