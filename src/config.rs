//! Configuration and CLI argument handling

use std::path::PathBuf;
use clap::Parser;

/// Server CLI arguments, each with an environment variable fallback
#[derive(Debug, Parser)]
#[command(name = "timer-sync")]
#[command(about = "An authoritative countdown timer server with real-time WebSocket sync")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Directory of static presentation assets to serve for unknown routes
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        log_level(self.verbose)
    }
}

/// Terminal client CLI arguments
#[derive(Debug, Parser)]
#[command(name = "timer-watch")]
#[command(about = "Watch and control the timers of a timer-sync server")]
#[command(version)]
pub struct WatchConfig {
    /// WebSocket endpoint of the timer-sync server
    #[arg(long, env = "TIMER_SYNC_ORIGIN", default_value = "ws://127.0.0.1:3001/ws")]
    pub origin: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl WatchConfig {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn log_level(&self) -> &'static str {
        log_level(self.verbose)
    }
}

fn log_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_flags_override_defaults() {
        let config = Config::try_parse_from([
            "timer-sync",
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--static-dir",
            "build",
            "-v",
        ])
        .unwrap();

        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.static_dir, Some(PathBuf::from("build")));
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn watch_origin_flag() {
        let config =
            WatchConfig::try_parse_from(["timer-watch", "--origin", "ws://timers.lan:9000/ws"])
                .unwrap();
        assert_eq!(config.origin, "ws://timers.lan:9000/ws");
        assert_eq!(config.log_level(), "info");
    }
}
