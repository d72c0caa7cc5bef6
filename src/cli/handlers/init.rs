use crate::cli::commands::InitArgs;
use crate::io::DataPaths;
use crate::io::day_io::atomic_write;

/// Written by `dp init`. Every value shown is the built-in default.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r##"# dayplan configuration
# Edit by hand or with: dp config set <section.key> <value>

[schedule]
# Start of the first block when the day is empty
day_start = "09:00"
default_block_minutes = 60
# Used when a typed task has no 30m / 1h suffix
default_task_minutes = 15
# Up/Down step in the time editor
time_step_minutes = 15

[sync]
# Planner API base URL; leave unset to stay local
# endpoint = "http://localhost:3000"
# Sent as x-user-id; nothing is sent until this is set
# user_id = ""
timeout_secs = 10
max_attempts = 5
base_delay_ms = 500
max_delay_ms = 30000

[log]
# off | error | warn | info | debug | trace
level = "info"

# --- UI Customization ---
# [ui.colors]
# background = "#101018"
# text = "#C8C8D0"
# highlight = "#FB4196"
#
# [ui.type_colors]
# deep-work = "#4488FF"
# meeting = "#FFD700"

# --- Quick commands ---
# A letter plus 1-4 digits adds a block: d930, m14, w0630.
# Built in: d deep-work, a admin, b break, m meeting, p personal,
#           w personal "Workout", e event, r routine
#
# [quick_commands]
# s = { type = "admin", label = "Standup" }
"##;

pub fn cmd_init(paths: &DataPaths, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    paths.ensure()?;
    let config_path = paths.config_file();
    if config_path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }
    atomic_write(&config_path, DEFAULT_CONFIG_TEMPLATE.as_bytes())?;
    println!("wrote {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppConfig;

    #[test]
    fn template_matches_defaults() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.schedule.day_start, defaults.schedule.day_start);
        assert_eq!(
            config.schedule.default_task_minutes,
            defaults.schedule.default_task_minutes
        );
        assert_eq!(config.sync.max_attempts, defaults.sync.max_attempts);
        assert_eq!(config.sync.max_delay_ms, defaults.sync.max_delay_ms);
        assert!(!config.sync.is_ready());
        assert!(config.quick_commands.is_empty());
    }
}
