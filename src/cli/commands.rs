use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dp", about = concat!("dayplan v", env!("CARGO_PKG_VERSION"), " - plan the day in blocks"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory (default: the platform data dir)
    #[arg(long = "data-dir", env = "DAYPLAN_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Day to work on, YYYY-MM-DD (default: today)
    #[arg(long, global = true)]
    pub date: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a commented default config.toml
    Init(InitArgs),
    /// Print the day's blocks and tasks
    Show,
    /// Add a block from a quick command such as d930 or m14
    Add(AddArgs),
    /// Add a task to a block
    Task(TaskArgs),
    /// Delete a block
    Rm(RmArgs),
    /// Show how a quick command would be read
    Parse(ParseArgs),
    /// Send queued changes to the server
    Sync(SyncArgs),
    /// List projects, backlog, routines and events
    Inventory,
    /// Show or edit config.toml
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Quick command: type letter plus 1-4 digit time
    pub token: String,
    /// Block length in minutes
    #[arg(long)]
    pub minutes: Option<u32>,
    /// Label shown instead of the type name
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Args)]
pub struct TaskArgs {
    /// Block number (1-based, as printed by show) or its start time HH:MM
    pub block: String,
    /// Task title; a trailing 30m / 1h / 1h30m sets the duration
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,
}

#[derive(Args)]
pub struct RmArgs {
    /// Block number (1-based) or start time HH:MM
    pub block: String,
    /// Delete even when the block still has tasks
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ParseArgs {
    pub token: String,
}

#[derive(Args)]
pub struct SyncArgs {
    /// List the queue instead of sending it
    #[arg(long)]
    pub status: bool,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Set a value, e.g. `dp config set sync.user_id user_123`
    Set { key: String, value: String },
}
