use alloy_primitives::B256;

pub const DEFAULT_EXPLORER_URL: &str = "https://sepolia.etherscan.io";
pub const DEFAULT_BLOB_EXPLORER_URL: &str = "https://sepolia.blobscan.com";

/// Block explorer URL templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerLinks {
    explorer: String,
    blob_explorer: String,
}

impl ExplorerLinks {
    pub fn new(explorer: impl AsRef<str>, blob_explorer: impl AsRef<str>) -> Self {
        Self {
            explorer: explorer.as_ref().trim_end_matches('/').to_owned(),
            blob_explorer: blob_explorer.as_ref().trim_end_matches('/').to_owned(),
        }
    }

    pub fn tx(&self, hash: &B256) -> String {
        format!("{}/tx/{hash}", self.explorer)
    }

    pub fn blob(&self, versioned_hash: &B256) -> String {
        format!("{}/blob/{versioned_hash}", self.blob_explorer)
    }
}

impl Default for ExplorerLinks {
    fn default() -> Self {
        Self::new(DEFAULT_EXPLORER_URL, DEFAULT_BLOB_EXPLORER_URL)
    }
}
