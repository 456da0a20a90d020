use anyhow::Result;
use std::env;

/// Engine configuration, loaded from environment variables.
pub struct EngineConfig {
    /// Upper bound on candidates queried per turn.
    pub max_predictions: usize,
    /// Semantic-score threshold below which candidates are dropped.
    pub score_threshold: f64,
    /// Enables L1 -> L2 expansion for lone troubleshooting keys.
    pub second_level_expansion: bool,
    /// Wall-clock budget for one whole turn.
    pub turn_timeout_ms: u64,
    pub preference_db: String,
    pub registry_path: Option<String>,
    pub intent_map_path: Option<String>,
    pub key_hierarchy_path: Option<String>,
    pub log_file: String,
}

impl EngineConfig {
    /// Loads configuration from environment variables, with defaults for
    /// everything but the data-file paths.
    pub fn load() -> Result<Self> {
        let max_predictions = env::var("QA_MAX_PREDICTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);
        let score_threshold = env::var("QA_SCORE_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(20.0);
        let second_level_expansion = env::var("QA_SECOND_LEVEL_EXPANSION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);
        let turn_timeout_ms = env::var("QA_TURN_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(20_000);
        let preference_db =
            env::var("QA_PREFERENCE_DB").unwrap_or_else(|_| "file:./preference.db".to_string());
        let registry_path = env::var("QA_REGISTRY_PATH").ok();
        let intent_map_path = env::var("QA_INTENT_MAP_PATH").ok();
        let key_hierarchy_path = env::var("QA_KEY_HIERARCHY_PATH").ok();
        let log_file = "logs/qa-engine.log".to_string();

        Ok(Self {
            max_predictions,
            score_threshold,
            second_level_expansion,
            turn_timeout_ms,
            preference_db,
            registry_path,
            intent_map_path,
            key_hierarchy_path,
            log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var("QA_MAX_PREDICTIONS");
        env::remove_var("QA_SCORE_THRESHOLD");
        env::remove_var("QA_SECOND_LEVEL_EXPANSION");
        env::remove_var("QA_TURN_TIMEOUT_MS");
        env::remove_var("QA_PREFERENCE_DB");
        env::remove_var("QA_REGISTRY_PATH");
        env::remove_var("QA_INTENT_MAP_PATH");
        env::remove_var("QA_KEY_HIERARCHY_PATH");
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        clear_env();

        let config = EngineConfig::load().unwrap();

        assert_eq!(config.max_predictions, 3);
        assert_eq!(config.score_threshold, 20.0);
        assert!(config.second_level_expansion);
        assert_eq!(config.turn_timeout_ms, 20_000);
        assert_eq!(config.preference_db, "file:./preference.db");
        assert!(config.registry_path.is_none());
        assert_eq!(config.log_file, "logs/qa-engine.log");
    }

    #[test]
    #[serial]
    fn test_load_config_with_custom_values() {
        clear_env();
        env::set_var("QA_MAX_PREDICTIONS", "5");
        env::set_var("QA_SCORE_THRESHOLD", "35.5");
        env::set_var("QA_SECOND_LEVEL_EXPANSION", "false");
        env::set_var("QA_TURN_TIMEOUT_MS", "5000");
        env::set_var("QA_PREFERENCE_DB", "sqlite::memory:");
        env::set_var("QA_REGISTRY_PATH", "/data/registry.json");

        let config = EngineConfig::load().unwrap();

        assert_eq!(config.max_predictions, 5);
        assert_eq!(config.score_threshold, 35.5);
        assert!(!config.second_level_expansion);
        assert_eq!(config.turn_timeout_ms, 5000);
        assert_eq!(config.preference_db, "sqlite::memory:");
        assert_eq!(config.registry_path.as_deref(), Some("/data/registry.json"));

        clear_env();
    }
}
