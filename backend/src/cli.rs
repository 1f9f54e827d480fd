//! Command-line arguments for the `warden` binary.

use clap::Parser;
use std::path::PathBuf;

/// Role-based access control backend
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(about = "Accounts, roles, permissions and token sessions over Postgres", long_about = None)]
pub struct ServeCli {
    /// Path to config file (YAML)
    #[arg(short, long, default_value = "config.yml")]
    pub config: PathBuf,

    /// Skip applying embedded migrations at startup
    #[arg(long)]
    pub skip_migrations: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = ServeCli::parse_from(["warden"]);
        assert_eq!(cli.config, PathBuf::from("config.yml"));
        assert!(!cli.skip_migrations);
    }

    #[test]
    fn test_short_config_flag() {
        let cli = ServeCli::parse_from(["warden", "-c", "/etc/warden.yml", "--skip-migrations"]);
        assert_eq!(cli.config, PathBuf::from("/etc/warden.yml"));
        assert!(cli.skip_migrations);
    }
}
