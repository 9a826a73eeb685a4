use std::{fmt::Display, str::FromStr, time::Duration};

use chain_sync::SyncConfig;
use clap::Parser as ClapParser;
use tracing::Level;

#[derive(ClapParser, Debug, Clone)]
#[command(name = "node", author, version, about = "Block-sync engine demo node")]
pub struct Options {
    #[arg(
        long = "log.level",
        default_value_t = Level::INFO,
        value_name = "LOG_LEVEL",
        env = "CHAIN_LOG_LEVEL",
        help = "The verbosity level used for logs.",
        long_help = "Possible values: info, debug, trace, warn, error",
        help_heading = "Node options"
    )]
    pub log_level: Level,
    #[arg(
        long = "log.color",
        default_value_t = LogColor::Auto,
        help = "Output logs with ANSI color codes.",
        long_help = "Possible values: auto, always, never",
        help_heading = "Node options",
        env = "CHAIN_LOG_COLOR"
    )]
    pub log_color: LogColor,
    #[arg(
        long = "sync.headers-per-request",
        default_value_t = 192,
        help_heading = "Sync options",
        env = "CHAIN_SYNC_HEADERS_PER_REQUEST"
    )]
    pub block_headers_per_request: u64,
    #[arg(
        long = "sync.bodies-per-request",
        default_value_t = 128,
        help_heading = "Sync options",
        env = "CHAIN_SYNC_BODIES_PER_REQUEST"
    )]
    pub block_bodies_per_request: u64,
    #[arg(
        long = "sync.resolve-depth",
        default_value_t = 64,
        help = "How far back the fork-resolving backward walk is allowed to go before giving up on the peer.",
        help_heading = "Sync options",
        env = "CHAIN_SYNC_RESOLVE_DEPTH"
    )]
    pub block_resolve_depth: u64,
    #[arg(
        long = "sync.request-timeout-ms",
        default_value_t = 8_000,
        help_heading = "Sync options",
        env = "CHAIN_SYNC_REQUEST_TIMEOUT_MS"
    )]
    pub sync_request_timeout_ms: u64,
    #[arg(
        long = "sync.poll-interval-ms",
        default_value_t = 10_000,
        help = "How often to check for a new tip once WorkingHeaders is empty.",
        help_heading = "Sync options",
        env = "CHAIN_SYNC_POLL_INTERVAL_MS"
    )]
    pub check_for_new_block_interval_ms: u64,
}

impl Options {
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            block_headers_per_request: self.block_headers_per_request,
            block_bodies_per_request: self.block_bodies_per_request,
            block_resolve_depth: self.block_resolve_depth,
            sync_request_timeout: Duration::from_millis(self.sync_request_timeout_ms),
            check_for_new_block_interval: Duration::from_millis(self.check_for_new_block_interval_ms),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum LogColor {
    #[default]
    Auto,
    Always,
    Never,
}

impl Display for LogColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogColor::Auto => write!(f, "auto"),
            LogColor::Always => write!(f, "always"),
            LogColor::Never => write!(f, "never"),
        }
    }
}

impl FromStr for LogColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(LogColor::Auto),
            "always" => Ok(LogColor::Always),
            "never" => Ok(LogColor::Never),
            other => Err(format!("invalid log color `{other}`, expected auto|always|never")),
        }
    }
}
