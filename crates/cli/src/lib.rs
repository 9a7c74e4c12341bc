//! Command-line plumbing for the blobcast service: arguments, configuration
//! loading, logging and the Tokio runtime.

pub mod args;
pub mod cmd;
pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod runtime;

pub use file::{load_config, save_config};
