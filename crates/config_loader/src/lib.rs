//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `TrackerBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Jump limit: {} m", blueprint.filter.max_jump_m);
//! ```

mod parser;
mod validator;

pub use contracts::TrackerBlueprint;
pub use parser::ConfigFormat;

use contracts::TrackerError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<TrackerBlueprint, TrackerError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<TrackerBlueprint, TrackerError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already-built blueprint (e.g. after CLI overrides)
    pub fn validate(blueprint: &TrackerBlueprint) -> Result<(), TrackerError> {
        validator::validate(blueprint)
    }

    /// Serialize TrackerBlueprint to TOML string
    pub fn to_toml(blueprint: &TrackerBlueprint) -> Result<String, TrackerError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| TrackerError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize TrackerBlueprint to JSON string
    pub fn to_json(blueprint: &TrackerBlueprint) -> Result<String, TrackerError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| TrackerError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, TrackerError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            TrackerError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            TrackerError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, TrackerError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<TrackerBlueprint, TrackerError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
[filter]
max_accuracy_m = 40.0

[relay]
path = "state/relay.queue"
capacity = 200

[pending]
path = "state/pending.queue"
format = "bincode"

[store]
name = "log_store"
store_type = "log"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.filter.max_accuracy_m, 40.0);
        assert_eq!(bp.relay.capacity, 200);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.filter, bp2.filter);
        assert_eq!(bp.relay, bp2.relay);
        assert_eq!(bp.pending, bp2.pending);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.store, bp2.store);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[relay]
path = "same.queue"

[pending]
path = "same.queue"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot share"));
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let err = ConfigLoader::load_from_path(Path::new("tracker.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
