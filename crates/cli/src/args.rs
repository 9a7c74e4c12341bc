//! Command-line interface arguments.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::{
    cmd::{init::InitCmd, start::StartCmd},
    logging::{LogFormat, LogLevel},
};

const DEFAULT_CONFIG_FILE: &str = "blobcast.toml";

#[derive(Parser, Clone, Debug, Default)]
#[command(name = "blobcast", version, about = "EIP-4844 blob submission service signing through AWS KMS")]
pub struct Args {
    /// Configuration file. Defaults to `blobcast.toml` in the working directory when present.
    #[arg(long, global = true, env = "BLOBCAST_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configuration file.
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Log format, overrides the configuration file.
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Commands {
    /// Serve the blob submission API
    Start(StartCmd),

    /// Write a configuration file with default values
    Init(InitCmd),
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Start(StartCmd::default())
    }
}

impl Args {
    pub fn new() -> Self {
        Args::parse()
    }

    /// The configuration file to read, if any. An explicit `--config` is
    /// returned as-is so that a missing file is reported; the default file is
    /// only used when it exists.
    pub fn config_file(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        }
    }

    /// Where `init` writes the configuration.
    pub fn config_output(&self) -> &Path {
        self.config.as_deref().unwrap_or(Path::new(DEFAULT_CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    #[test]
    fn parses_start_with_overrides() {
        let args = Args::parse_from([
            "blobcast",
            "--log-level",
            "debug",
            "start",
            "--listen-addr",
            "127.0.0.1:8080",
            "--config",
            "/etc/blobcast.toml",
        ]);

        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.config.as_deref(), Some(Path::new("/etc/blobcast.toml")));
        let Commands::Start(cmd) = args.command else { panic!("expected start") };
        assert_eq!(cmd.listen_addr, Some("127.0.0.1:8080".parse::<SocketAddr>().unwrap()));
    }

    #[test]
    fn init_overwrite_flag() {
        let args = Args::parse_from(["blobcast", "init", "--overwrite"]);
        assert_eq!(args.command, Commands::Init(InitCmd { overwrite: true }));
        assert_eq!(args.config_output(), Path::new(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Args::try_parse_from(["blobcast", "--log-format", "xml", "start"]).is_err());
    }
}
