//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Grab, pinch, dolly and magnification settings.
    pub interaction: InteractionConfig,
    /// Controller button mapping presets.
    pub input: InputConfig,
    /// Tracking/render loop settings.
    pub session: SessionConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Settings consumed by the interaction core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InteractionConfig {
    /// Allow single-controller grabbing of scene objects.
    pub grab_enabled: bool,
    /// Initial world magnification (world units per physical meter divided
    /// by `world_units_per_meter`).
    pub magnification: f64,
    /// World units corresponding to one physical meter at magnification 1.
    pub world_units_per_meter: f64,
    /// Dolly flight speed in physical meters per second. Defaults to
    /// walking speed.
    pub dolly_speed_m_s: f64,
    /// Combined-pose degeneracy threshold on `|dot(x, y')|`.
    pub parallel_axis_threshold: f64,
}

/// What the trigger button does.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TriggerFunction {
    /// Trigger grabs objects (and the world, together with the other hand).
    #[default]
    GrabObjectsAndWorld,
    /// Trigger is unbound.
    None,
}

/// Which button(s) feed the two-handed gesture recognizer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GestureButton {
    /// Trigger only.
    Trigger,
    /// Grip only.
    #[default]
    Grip,
    /// Trigger and grip both count as gesture buttons.
    TriggerAndGrip,
    /// Two-handed gestures are disabled.
    None,
}

/// Input configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Trigger button function preset.
    pub trigger_function: TriggerFunction,
    /// Gesture button preset.
    pub gesture_button: GestureButton,
    /// Optional RON file with a full binding table; overrides the presets.
    pub bindings_file: Option<PathBuf>,
}

/// Fixed-rate tracking loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Tracking/render ticks per second.
    pub tick_rate_hz: u32,
    /// Frame time clamp in seconds.
    pub max_frame_time_s: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Directory for JSON log files in debug builds.
    pub log_dir: Option<PathBuf>,
}

// --- Default implementations ---

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            grab_enabled: true,
            magnification: 1.0,
            world_units_per_meter: 1000.0,
            dolly_speed_m_s: 1.6666,
            parallel_axis_threshold: 0.99,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 90,
            max_frame_time_s: 0.25,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl SessionConfig {
    /// Duration of one tick in seconds.
    pub fn tick_dt(&self) -> f64 {
        1.0 / f64::from(self.tick_rate_hz.max(1))
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Platform config directory (`<config_dir>/grasp`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("grasp"))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Reject values the interaction core cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let i = &self.interaction;
        if !(i.magnification.is_finite() && i.magnification > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "interaction.magnification",
                reason: format!("must be a positive number, got {}", i.magnification),
            });
        }
        if !(i.world_units_per_meter.is_finite() && i.world_units_per_meter > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "interaction.world_units_per_meter",
                reason: format!("must be a positive number, got {}", i.world_units_per_meter),
            });
        }
        if !(i.dolly_speed_m_s.is_finite() && i.dolly_speed_m_s >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "interaction.dolly_speed_m_s",
                reason: format!("must be a non-negative number, got {}", i.dolly_speed_m_s),
            });
        }
        if !(i.parallel_axis_threshold > 0.0 && i.parallel_axis_threshold < 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "interaction.parallel_axis_threshold",
                reason: format!("must be within (0, 1), got {}", i.parallel_axis_threshold),
            });
        }
        if self.session.tick_rate_hz == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.tick_rate_hz",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}
