#![cfg(feature = "server")]
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::shared::freshness::DEFAULT_STALE_MINUTES;
use crate::shared::poller::{FeedConfig, DEFAULT_POLL_INTERVAL_SECS};

/// Dashboard server for an ESP32 telemetry service, plus a few headless
/// commands. Without a subcommand the dashboard is served.
#[derive(Debug, Parser)]
#[command(name = "esp-dash", version)]
pub struct Cli {
    #[command(flatten)]
    pub service: ServiceArgs,

    #[command(flatten)]
    pub feed: FeedArgs,

    /// Directory holding the CLI's stored access key.
    #[arg(long, env = "ESP_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Access key; overrides the stored one.
    #[arg(long, env = "ESP_ACCESS_KEY", global = true, hide_env_values = true)]
    pub key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Args)]
pub struct ServiceArgs {
    /// Base URL of `esp_service`.
    #[arg(
        long,
        env = "ESP_SERVICE_URL",
        default_value = "http://localhost:8005",
        global = true
    )]
    pub service_url: String,

    #[arg(long, env = "ESP_CONNECT_TIMEOUT_SECS", default_value_t = 2, global = true)]
    pub connect_timeout_secs: u64,

    #[arg(long, env = "ESP_REQUEST_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Args)]
pub struct FeedArgs {
    #[arg(long, env = "ESP_POLL_INTERVAL_SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS, global = true)]
    pub poll_interval_secs: u64,

    /// Samples older than this are shown as stale.
    #[arg(long, env = "ESP_STALE_MINUTES", default_value_t = DEFAULT_STALE_MINUTES, global = true)]
    pub stale_minutes: i64,
}

impl FeedArgs {
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            interval_secs: self.poll_interval_secs,
            stale_minutes: self.stale_minutes,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll telemetry and log every update until interrupted.
    Watch {
        /// Stop after the first poll.
        #[arg(long)]
        once: bool,
    },
    /// Store an access key for later commands.
    Login {
        #[arg(value_name = "KEY")]
        access_key: String,
    },
    /// Forget the stored access key.
    Logout,
    /// Read or replace the board settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Print temperature history for a range preset (6h, 12h, 24h, 48h, 7d).
    History {
        #[arg(long, default_value = "24h")]
        range: String,
    },
    /// Print min/avg/max statistics.
    Stats {
        #[arg(long, default_value_t = 24)]
        hours: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    Show,
    /// POST the settings from a JSON file (whole object, replaces the current one).
    Apply { file: PathBuf },
}
