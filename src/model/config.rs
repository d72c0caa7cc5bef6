use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::block::BlockType;
use super::time::ClockTime;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Extra or overriding quick-command letters (`w = { type = "personal", label = "Workout" }`)
    #[serde(default)]
    pub quick_commands: IndexMap<String, QuickCommandConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Default: see DEFAULT_CONFIG_TEMPLATE
    #[serde(default = "default_day_start")]
    pub day_start: ClockTime,
    #[serde(default = "default_block_minutes")]
    pub default_block_minutes: u32,
    #[serde(default = "default_task_minutes")]
    pub default_task_minutes: u32,
    #[serde(default = "default_time_step")]
    pub time_step_minutes: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            day_start: default_day_start(),
            default_block_minutes: default_block_minutes(),
            default_task_minutes: default_task_minutes(),
            time_step_minutes: default_time_step(),
        }
    }
}

fn default_day_start() -> ClockTime {
    ClockTime::new(9, 0).unwrap_or_default()
}

fn default_block_minutes() -> u32 {
    60
}

fn default_task_minutes() -> u32 {
    15
}

fn default_time_step() -> u32 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the planner API; absent means local only
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Signed-in user; absent means sync is not ready yet
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            endpoint: None,
            user_id: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Theme overrides, `name = "#RRGGBB"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
    /// Per block type colors, keyed by wire name (`deep-work = "#4488FF"`)
    #[serde(default)]
    pub type_colors: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickCommandConfig {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub label: Option<String>,
}

impl SyncConfig {
    /// Endpoint and user are both configured
    pub fn is_ready(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|e| !e.trim().is_empty())
            && self.user_id.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.schedule.default_block_minutes, 60);
        assert_eq!(config.schedule.time_step_minutes, 15);
        assert_eq!(config.schedule.day_start.to_string(), "09:00");
        assert_eq!(config.sync.max_attempts, 5);
        assert!(config.sync.endpoint.is_none());
        assert_eq!(config.log.level, "info");
        assert!(config.quick_commands.is_empty());
    }

    #[test]
    fn parses_full_config() {
        let text = r##"
[schedule]
day_start = "07:30"
default_task_minutes = 25

[sync]
endpoint = "http://localhost:3000"
user_id = "user_1"

[ui.type_colors]
deep-work = "#112233"

[quick_commands]
w = { type = "personal", label = "Workout" }
s = { type = "admin" }
"##;
        let config: AppConfig = toml::from_str(text).unwrap();
        assert_eq!(config.schedule.day_start.to_string(), "07:30");
        assert_eq!(config.schedule.default_task_minutes, 25);
        assert!(config.sync.is_ready());
        assert_eq!(config.ui.type_colors["deep-work"], "#112233");
        let keys: Vec<&str> = config.quick_commands.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["w", "s"]);
        assert_eq!(config.quick_commands["w"].label.as_deref(), Some("Workout"));
        assert_eq!(config.quick_commands["s"].block_type, BlockType::Admin);
    }

    #[test]
    fn sync_not_ready_without_user() {
        let sync = SyncConfig {
            endpoint: Some("http://x".into()),
            ..Default::default()
        };
        assert!(!sync.is_ready());
    }
}
