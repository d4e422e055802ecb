//! Configuration system
//!
//! [`SceneConfig`] holds the scene manager tunables. Any config type can be
//! loaded from or saved to TOML / RON through the [`Config`] trait.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file, picking the format from the extension
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its allowed range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Scene manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Fraction of the viewport (0..=1) a node's projected bound must cover
    /// to be rendered. Zero disables small-object culling.
    pub small_object_threshold: f32,

    /// Minimum seconds between two background update ticks. Zero runs one
    /// tick per frame.
    pub update_elapse: f32,

    /// Run node background callbacks on a dedicated thread. When false the
    /// manager behaves as if permanently suspended.
    pub background_thread: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            small_object_threshold: 0.0,
            update_elapse: 1.0 / 60.0,
            background_thread: true,
        }
    }
}

impl SceneConfig {
    /// Set the small-object threshold
    pub fn with_small_object_threshold(mut self, area: f32) -> Self {
        self.small_object_threshold = area;
        self
    }

    /// Set the background update cadence
    pub fn with_update_elapse(mut self, elapse: f32) -> Self {
        self.update_elapse = elapse;
        self
    }

    /// Enable or disable the background update thread
    pub fn with_background_thread(mut self, enabled: bool) -> Self {
        self.background_thread = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.small_object_threshold) {
            return Err(ConfigError::Invalid {
                field: "small_object_threshold",
                reason: format!("{} is outside 0..=1", self.small_object_threshold),
            });
        }

        if !self.update_elapse.is_finite() || self.update_elapse < 0.0 {
            return Err(ConfigError::Invalid {
                field: "update_elapse",
                reason: format!("{} must be a finite, non-negative number of seconds", self.update_elapse),
            });
        }

        Ok(())
    }
}

impl Config for SceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let config = SceneConfig::default().with_small_object_threshold(1.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "small_object_threshold", .. })
        ));
    }

    #[test]
    fn test_rejects_negative_elapse() {
        let config = SceneConfig::default().with_update_elapse(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("scene_config_{}.toml", std::process::id()));
        let path = path.to_string_lossy().into_owned();

        let config = SceneConfig::default()
            .with_small_object_threshold(0.01)
            .with_background_thread(false);
        config.save_to_file(&path).unwrap();
        let loaded = SceneConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: SceneConfig = ron::from_str("(background_thread: false)").unwrap();
        assert!(!config.background_thread);
        assert_eq!(config.update_elapse, SceneConfig::default().update_elapse);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            SceneConfig::default().save_to_file("scene.json"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
