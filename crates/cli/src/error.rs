#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

/// Config file I/O.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open file {}", .0.display())]
    OpenFile(PathBuf),

    #[error("cannot write file {}", .0.display())]
    WriteFile(PathBuf),

    #[error("cannot create directory {}", .0.display())]
    ParentDir(PathBuf),

    #[error("cannot parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("cannot serialize configuration: {0}")]
    Serialize(String),
}

/// A configuration that cannot run the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
