//! Blob submission service: the signing and funding pipeline, its HTTP API
//! and metrics.

pub mod error;
pub mod links;
pub mod metrics;
pub mod pipeline;
pub mod server;

pub use error::PipelineError;
pub use links::ExplorerLinks;
pub use metrics::SubmissionMetrics;
pub use pipeline::{BlobSubmitter, DynEthRpc, DynKeyBackend, SubmitterConfig};
pub use server::{AppState, router, serve};
