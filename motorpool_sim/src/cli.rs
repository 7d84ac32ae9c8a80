use bevy::prelude::Resource;
use clap::Parser;
use std::path::PathBuf;

/// Motorpool: vehicle spawning with per-actor entitlements.
///
/// Command-line arguments shared by any binary that hosts the
/// `MotorpoolPlugin`.
#[derive(Parser, Debug, Resource, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the motorpool TOML configuration file.
    #[arg(short, long, default_value = "assets/config/motorpool.toml")]
    pub config: PathBuf,

    /// Override the ledger data file named in the configuration.
    #[arg(short, long)]
    pub ledger: Option<PathBuf>,

    /// Run without a graphical window.
    #[arg(long, default_value_t = false)]
    pub headless: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_bundled_config() {
        let cli = Cli::parse_from(["motorpool"]);
        assert_eq!(cli.config, PathBuf::from("assets/config/motorpool.toml"));
        assert!(cli.ledger.is_none());
        assert!(!cli.headless);
    }

    #[test]
    fn ledger_override_and_headless() {
        let cli = Cli::parse_from(["motorpool", "--ledger", "/tmp/l.json", "--headless"]);
        assert_eq!(cli.ledger, Some(PathBuf::from("/tmp/l.json")));
        assert!(cli.headless);
    }
}
