use std::path::Path;

use clap::Parser;
use color_eyre::eyre::{self, eyre};
use tracing::{info, warn};

use crate::{config::Config, file::save_config};

#[derive(Parser, Debug, Clone, Default, PartialEq)]
pub struct InitCmd {
    /// Overwrite an existing configuration file
    #[clap(long)]
    pub overwrite: bool,
}

impl InitCmd {
    pub fn run(&self, config_file: &Path) -> eyre::Result<()> {
        if config_file.exists() && !self.overwrite {
            warn!(file = %config_file.display(), "Configuration file exists, use --overwrite to replace it");
            return Ok(());
        }

        save_config(config_file, &Config::default())
            .map_err(|error| eyre!("Failed to write configuration file: {error}"))?;

        info!(file = %config_file.display(), "Wrote default configuration");
        Ok(())
    }
}
