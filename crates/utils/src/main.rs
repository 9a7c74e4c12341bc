use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Commands;

#[derive(Parser)]
#[command(author, version, about = "Operator tools for the blobcast service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Reports go to stdout, logs to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Track(cmd) => cmd.run().await,
        Commands::Address(cmd) => cmd.run().await,
        Commands::Encode(cmd) => cmd.run(),
    }
}
