//! Command-line argument definitions (clap).

use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/bmc-inventory/config.json";

#[derive(Parser, Debug)]
#[command(name = "bmc-inventoryd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "BMC FRU/sensor inventory daemon with hot-plug propagation", long_about = None)]
pub struct Args {
    /// Path to the daemon configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL). Overrides LOG_LEVEL and the config file
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Log peer calls instead of sending them
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    // === Config & Debug ===
    /// Load config and inventory, print the FRU list, then exit
    #[arg(long, help_heading = "Config & Debug")]
    pub check: bool,

    /// Print the effective configuration as JSON, then exit
    #[arg(long = "show-config", help_heading = "Config & Debug")]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["bmc-inventoryd"]).unwrap();
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(args.log_level.is_none());
        assert!(!args.dry_run && !args.check && !args.show_config);
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "bmc-inventoryd",
            "--config",
            "/tmp/c.json",
            "--log-level",
            "debug",
            "--dry-run",
            "--check",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("/tmp/c.json"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.dry_run && args.check);
    }
}
