// motorpool_sim/src/simulation/config/mod.rs

//! Loading of the motorpool configuration: a TOML file merged with
//! `MOTORPOOL_`-prefixed environment variables (nested keys split on `__`,
//! e.g. `MOTORPOOL_LEDGER__PATH`).

pub mod structs;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

pub use structs::{LedgerSettings, MotorpoolConfig, PlacementSettings, VehiclePrefab, VehiclesConfig};

impl MotorpoolConfig {
    /// The provider stack for `path`. A missing file yields the defaults.
    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("MOTORPOOL_").split("__"))
    }

    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// Applies a command-line ledger path, which beats file and environment.
    pub fn with_ledger_override(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.ledger.path = path;
        }
        self
    }
}
