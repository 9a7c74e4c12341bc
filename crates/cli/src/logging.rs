use core::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{FmtSubscriber, filter::EnvFilter, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plaintext,
    Json,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

/// Initialize logging.
///
/// Returns a drop guard responsible for flushing any remaining logs when the program terminates.
/// The guard must be assigned to a binding that is not _, as _ will result in the guard being
/// dropped immediately.
pub fn init(log_level: LogLevel, log_format: LogFormat) -> WorkerGuard {
    let filter = build_tracing_filter(log_level);

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(enable_ansi())
        .with_thread_ids(false);

    match log_format {
        LogFormat::Plaintext => builder.finish().init(),
        LogFormat::Json => builder.json().finish().init(),
    };

    guard
}

/// Check if both stdout and stderr are proper terminal (tty),
/// so that we know whether or not to enable colored output,
/// using ANSI escape codes. If either is not, eg. because
/// stdout is redirected to a file, we don't enable colored output.
pub fn enable_ansi() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

/// Crates whose level follows `--log-level`. Everything else stays at INFO
/// unless `RUST_LOG` says otherwise.
const TARGET_CRATES: &[&str] = &[
    "blobcast",
    "blobcast_blob_engine",
    "blobcast_cli",
    "blobcast_execution",
    "blobcast_node",
    "blobcast_signer",
    "blobcast_utils",
];

/// Build a tracing directive setting the log level for the
/// crates to the given `log_level`.
pub fn default_directive(log_level: LogLevel) -> String {
    use itertools::Itertools;

    TARGET_CRATES.iter().map(|&c| format!("{c}={log_level}")).join(",")
}

/// Builds a tracing filter based on the input `log_level`. `RUST_LOG`
/// directives are appended and win over the defaults.
fn build_tracing_filter(log_level: LogLevel) -> EnvFilter {
    let mut directives = default_directive(log_level);
    if let Ok(env) = std::env::var(EnvFilter::DEFAULT_ENV) &&
        !env.trim().is_empty()
    {
        directives.push(',');
        directives.push_str(&env);
    }

    EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).parse_lossy(directives)
}
