use std::{net::SocketAddr, path::PathBuf, time::Duration};

use blobcast_execution::PollPolicy;
use blobcast_node::{
    ExplorerLinks, SubmitterConfig,
    links::{DEFAULT_BLOB_EXPLORER_URL, DEFAULT_EXPLORER_URL},
};
use blobcast_types::{
    constants::{
        CONFIRMATION_INTERVAL_MS, CONFIRMATION_MAX_ATTEMPTS, DEFAULT_MAX_FEE_PER_BLOB_GAS,
        DEFAULT_PRIORITY_FEE_PER_GAS,
    },
    submission::FundingMode,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::{error::ConfigError, logging::LoggingConfig, runtime::RuntimeConfig};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Service configuration. Every field has a default so partial TOML files load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AWS KMS key id or ARN of the secp256k1 signing key.
    pub kms_key_id: Option<String>,
    pub aws_region: Option<String>,
    /// Ethereum JSON-RPC endpoint.
    pub rpc_url: Option<Url>,
    pub rpc_timeout_ms: u64,
    pub listen_addr: SocketAddr,
    pub funding_mode: FundingMode,
    /// Ceiling on the blob base fee, in wei.
    pub max_fee_per_blob_gas: u64,
    /// Tip used when the node does not answer `eth_maxPriorityFeePerGas`, in wei.
    pub priority_fee: u64,
    pub explorer_url: String,
    pub blob_explorer_url: String,
    /// Custom KZG trusted setup (JSON). The mainnet ceremony output is used otherwise.
    pub trusted_setup: Option<PathBuf>,
    pub confirm_attempts: u32,
    pub confirm_interval_ms: u64,
    pub logging: LoggingConfig,
    pub runtime: RuntimeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kms_key_id: None,
            aws_region: None,
            rpc_url: None,
            rpc_timeout_ms: 30_000,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            funding_mode: FundingMode::default(),
            max_fee_per_blob_gas: DEFAULT_MAX_FEE_PER_BLOB_GAS as u64,
            priority_fee: DEFAULT_PRIORITY_FEE_PER_GAS as u64,
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            blob_explorer_url: DEFAULT_BLOB_EXPLORER_URL.to_string(),
            trusted_setup: None,
            confirm_attempts: CONFIRMATION_MAX_ATTEMPTS,
            confirm_interval_ms: CONFIRMATION_INTERVAL_MS,
            logging: LoggingConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// Settings without which the service cannot start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequiredSettings {
    pub kms_key_id: String,
    pub aws_region: String,
    pub rpc_url: Url,
}

impl Config {
    /// Apply environment variable overrides.
    ///
    /// Each `BLOBCAST_*` variable wins over its unprefixed alias where one exists:
    /// - BLOBCAST_KMS_KEY_ID / KMS_KEY_ID
    /// - BLOBCAST_AWS_REGION / AWS_REGION
    /// - BLOBCAST_RPC_URL / RPC_URL
    /// - BLOBCAST_LISTEN_ADDR
    /// - BLOBCAST_FUNDING_MODE
    /// - BLOBCAST_MAX_FEE_PER_BLOB_GAS
    /// - BLOBCAST_PRIORITY_FEE
    /// - BLOBCAST_EXPLORER_URL
    /// - BLOBCAST_BLOB_EXPLORER_URL
    /// - BLOBCAST_TRUSTED_SETUP
    /// - BLOBCAST_CONFIRM_ATTEMPTS
    /// - BLOBCAST_CONFIRM_INTERVAL_MS
    pub fn apply_env_overrides(&mut self) {
        fn get(key: &str) -> Option<String> {
            std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        fn get_any(keys: &[&str]) -> Option<String> {
            keys.iter().find_map(|key| get(key))
        }

        if let Some(v) = get_any(&["BLOBCAST_KMS_KEY_ID", "KMS_KEY_ID"]) {
            self.kms_key_id = Some(v);
        }
        if let Some(v) = get_any(&["BLOBCAST_AWS_REGION", "AWS_REGION"]) {
            self.aws_region = Some(v);
        }
        if let Some(v) = get_any(&["BLOBCAST_RPC_URL", "RPC_URL"]) {
            match v.parse::<Url>() {
                Ok(url) => self.rpc_url = Some(url),
                Err(_) => warn!(value = %v, "Invalid BLOBCAST_RPC_URL, ignoring"),
            }
        }
        if let Some(v) = get("BLOBCAST_LISTEN_ADDR") {
            match v.parse::<SocketAddr>() {
                Ok(addr) => self.listen_addr = addr,
                Err(_) => warn!(value = %v, "Invalid BLOBCAST_LISTEN_ADDR, ignoring"),
            }
        }
        if let Some(v) = get("BLOBCAST_FUNDING_MODE") {
            match v.parse::<FundingMode>() {
                Ok(mode) => self.funding_mode = mode,
                Err(_) => warn!(value = %v, "Invalid BLOBCAST_FUNDING_MODE, ignoring"),
            }
        }
        if let Some(v) = get("BLOBCAST_MAX_FEE_PER_BLOB_GAS") {
            match v.parse::<u64>() {
                Ok(n) => self.max_fee_per_blob_gas = n.max(1),
                Err(_) => warn!(value = %v, "Invalid BLOBCAST_MAX_FEE_PER_BLOB_GAS, ignoring"),
            }
        }
        if let Some(v) = get("BLOBCAST_PRIORITY_FEE") {
            match v.parse::<u64>() {
                Ok(n) => self.priority_fee = n,
                Err(_) => warn!(value = %v, "Invalid BLOBCAST_PRIORITY_FEE, ignoring"),
            }
        }
        if let Some(v) = get("BLOBCAST_EXPLORER_URL") {
            self.explorer_url = v;
        }
        if let Some(v) = get("BLOBCAST_BLOB_EXPLORER_URL") {
            self.blob_explorer_url = v;
        }
        if let Some(v) = get("BLOBCAST_TRUSTED_SETUP") {
            self.trusted_setup = Some(PathBuf::from(v));
        }
        if let Some(v) = get("BLOBCAST_CONFIRM_ATTEMPTS") {
            match v.parse::<u32>() {
                Ok(n) => self.confirm_attempts = n.max(1),
                Err(_) => warn!(value = %v, "Invalid BLOBCAST_CONFIRM_ATTEMPTS, ignoring"),
            }
        }
        if let Some(v) = get("BLOBCAST_CONFIRM_INTERVAL_MS") {
            match v.parse::<u64>() {
                Ok(n) => self.confirm_interval_ms = n,
                Err(_) => warn!(value = %v, "Invalid BLOBCAST_CONFIRM_INTERVAL_MS, ignoring"),
            }
        }
    }

    /// Check that the service can start with this configuration.
    pub fn validate(&self) -> Result<RequiredSettings, ConfigError> {
        fn required(value: Option<&str>, name: &'static str) -> Result<String, ConfigError> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(ConfigError::Missing(name))
        }

        let kms_key_id = required(self.kms_key_id.as_deref(), "kms_key_id")?;
        let rpc_url = self.rpc_url.clone().ok_or(ConfigError::Missing("rpc_url"))?;
        let aws_region = required(self.aws_region.as_deref(), "aws_region")?;

        if self.confirm_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "confirm_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_fee_per_blob_gas == 0 {
            return Err(ConfigError::Invalid {
                field: "max_fee_per_blob_gas",
                reason: "must be at least 1 wei".to_string(),
            });
        }

        Ok(RequiredSettings { kms_key_id, aws_region, rpc_url })
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn submitter_config(&self) -> SubmitterConfig {
        SubmitterConfig {
            funding_mode: self.funding_mode,
            max_fee_per_blob_gas: u128::from(self.max_fee_per_blob_gas),
            default_priority_fee: u128::from(self.priority_fee),
            confirmation: PollPolicy::new(
                self.confirm_attempts,
                Duration::from_millis(self.confirm_interval_ms),
            ),
            links: ExplorerLinks::new(&self.explorer_url, &self.blob_explorer_url),
        }
    }
}
