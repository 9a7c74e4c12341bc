//! Protocol and service constants shared across blobcast crates.

/// Gas limit of a plain value transfer, used for both the funding transfer and
/// the blob transaction (which carries no calldata).
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Blob gas consumed by one blob (`GAS_PER_BLOB` in EIP-4844).
pub const BLOB_GAS_PER_BLOB: u64 = 131_072;

/// Maximum serialized request payload accepted by the HTTP layer (128 KiB).
pub const MAX_REQUEST_PAYLOAD_BYTES: usize = 128 * 1024;

/// Default ceiling for `max_fee_per_blob_gas` (10 gwei).
pub const DEFAULT_MAX_FEE_PER_BLOB_GAS: u128 = 10_000_000_000;

/// Priority fee used when the node does not answer `eth_maxPriorityFeePerGas` (1.5 gwei).
pub const DEFAULT_PRIORITY_FEE_PER_GAS: u128 = 1_500_000_000;

/// Pipeline confirmation polling: 30 attempts × 10s.
pub const CONFIRMATION_MAX_ATTEMPTS: u32 = 30;
pub const CONFIRMATION_INTERVAL_MS: u64 = 10_000;

/// Client-side tracker polling: 120 attempts × 5s.
pub const TRACKER_MAX_ATTEMPTS: u32 = 120;
pub const TRACKER_INTERVAL_MS: u64 = 5_000;
