//! Shared helpers used by blobcast's integration and unit tests.
//!
//! Both doubles behave like the real services at the byte level: the key
//! backend returns genuine DER encodings and the RPC mock decodes every raw
//! transaction it is handed.

pub mod eth_rpc;
pub mod key_backend;

pub use eth_rpc::{MockEthRpc, ReceiptBehavior, SentTx};
pub use key_backend::LocalKeyBackend;
