//! Blob submission service entry point.

use blobcast_cli::{
    args::{Args, Commands},
    cmd::{init::InitCmd, start::StartCmd},
    config::Config,
    load_config, logging, runtime,
};
use color_eyre::eyre::{Result, eyre};
use tracing::{info, trace};

/// Main entry point for the application
///
/// This function:
/// - Parses command-line arguments
/// - Loads the configuration file and environment overrides
/// - Initializes logging system
/// - Dispatches the selected command
fn main() -> Result<()> {
    color_eyre::install()?;

    // Also forward panics to tracing so they show up alongside service logs.
    install_tracing_panic_hook();

    let args = Args::new();

    let config_file = args.config_file();
    let mut config = match &config_file {
        Some(path) => load_config(path)
            .map_err(|error| eyre!("Failed to load configuration file: {error}"))?,
        None => Config::default(),
    };
    config.apply_env_overrides();

    // Command-line flags win over the file and the environment.
    if let Some(log_level) = args.log_level {
        config.logging.log_level = log_level;
    }
    if let Some(log_format) = args.log_format {
        config.logging.log_format = log_format;
    }

    // This is a drop guard responsible for flushing any remaining logs when the program terminates.
    // It must be assigned to a binding that is not _, as _ will result in the guard being dropped
    // immediately.
    let _guard = logging::init(config.logging.log_level, config.logging.log_format);

    trace!("Command-line parameters: {args:?}");

    match &args.command {
        Commands::Start(cmd) => start(&args, cmd, config),
        Commands::Init(cmd) => init(&args, cmd),
    }
}

fn install_tracing_panic_hook() {
    use std::panic;

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let msg: &str = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.as_str()
        } else {
            "panic"
        };

        let bt = std::backtrace::Backtrace::force_capture();
        tracing::error!(target = "panic", %location, message = %msg, backtrace = %format!("{bt}"), "panic occurred");

        default_hook(info);
    }));
}

fn start(args: &Args, cmd: &StartCmd, mut config: Config) -> Result<()> {
    cmd.apply(&mut config);

    // Refuse to start before touching the network.
    config.validate().map_err(|error| eyre!("Invalid configuration: {error}"))?;

    let rt = runtime::build_runtime(config.runtime)?;

    match args.config_file() {
        Some(file) => info!(file = %file.display(), "Loaded configuration"),
        None => info!("No configuration file, using defaults and environment"),
    }
    trace!(?config, "Configuration");

    rt.block_on(cmd.run(config))
}

fn init(args: &Args, cmd: &InitCmd) -> Result<()> {
    cmd.run(args.config_output())
}
