//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{TrackerBlueprint, TrackerError};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<TrackerBlueprint, TrackerError> {
    toml::from_str(content).map_err(|e| TrackerError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<TrackerBlueprint, TrackerError> {
    serde_json::from_str(content).map_err(|e| TrackerError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<TrackerBlueprint, TrackerError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AccuracyTier, RecordFormat, StoreType};

    #[test]
    fn test_parse_toml_sections() {
        let content = r#"
[filter]
max_accuracy_m = 30.0
max_jump_m = 500.0

[route]
max_points = 400
recent_points = 50

[location]
accuracy = "best_for_navigation"
fix_timeout_ms = 5000

[relay]
path = "/tmp/relay.q"
format = "bincode"

[store]
name = "archive"
store_type = "file"
[store.params]
base_path = "/tmp/sessions"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.filter.max_accuracy_m, 30.0);
        assert_eq!(bp.filter.min_movement_m, 1.0);
        assert_eq!(bp.route.max_points, 400);
        assert_eq!(bp.location.accuracy, AccuracyTier::BestForNavigation);
        assert_eq!(bp.relay.format, RecordFormat::Bincode);
        assert_eq!(bp.relay.capacity, 500);
        assert_eq!(bp.pending.path, "data/pending.queue");
        assert_eq!(bp.store.store_type, StoreType::File);
        assert_eq!(bp.store.params["base_path"], "/tmp/sessions");
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "filter": { "max_plausible_speed_kmh": 120.0 },
            "controller": { "stale_after_s": 30 }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.filter.max_plausible_speed_kmh, 120.0);
        assert_eq!(bp.controller.stale_after_s, 30);
        assert_eq!(bp.controller.tick_interval_ms, 1000);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, TrackerError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_unknown_store_type() {
        let content = r#"
[store]
name = "x"
store_type = "carrier_pigeon"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
