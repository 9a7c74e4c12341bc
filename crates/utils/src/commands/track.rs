use std::{path::PathBuf, time::Duration};

use alloy_primitives::TxHash;
use blobcast_execution::{BlobTxTracker, PollPolicy, TrackRequest, TrackStatus};
use clap::Parser;
use color_eyre::eyre::{self, Result, eyre};
use reqwest::Url;

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrackCmd {
    /// Hash of the blob transaction
    #[clap(long, required_unless_present = "request")]
    tx_hash: Option<TxHash>,
    /// URL of the execution client's RPC endpoint
    #[clap(long, env = "RPC_URL", default_value = "http://127.0.0.1:8545")]
    rpc_url: Url,
    /// JSON file holding `{ "transactionHash", "rpcUrl" }`, overrides the flags
    #[clap(long, conflicts_with = "tx_hash")]
    request: Option<PathBuf>,
    /// Probe the receipt once instead of polling
    #[clap(long, default_value = "false")]
    once: bool,
    /// Number of receipt polls before giving up
    #[clap(long, default_value = "120")]
    attempts: u32,
    /// Seconds between receipt polls
    #[clap(long, default_value = "5")]
    interval: u64,
}

impl TrackCmd {
    pub async fn run(&self) -> Result<()> {
        let request = self.request()?;
        let tracker = BlobTxTracker::connect(request.rpc_url.clone())?.with_policy(PollPolicy::new(
            self.attempts.max(1),
            Duration::from_secs(self.interval),
        ));

        let report = if self.once {
            tracker.check_once(request.transaction_hash).await?
        } else {
            tracker.track(request.transaction_hash).await
        };

        println!("{}", serde_json::to_string_pretty(&report)?);

        match report.status {
            TrackStatus::Confirmed | TrackStatus::Pending => Ok(()),
            TrackStatus::Failed => Err(eyre!("transaction {} reverted", report.transaction_hash)),
            TrackStatus::Timeout => Err(eyre!(
                "transaction {} not mined after {} attempts",
                report.transaction_hash,
                report.attempts
            )),
        }
    }

    fn request(&self) -> eyre::Result<TrackRequest> {
        if let Some(path) = &self.request {
            let content = std::fs::read_to_string(path)
                .map_err(|e| eyre!("cannot read {}: {e}", path.display()))?;
            return Ok(serde_json::from_str(&content)?);
        }
        let transaction_hash = self.tx_hash.ok_or_else(|| eyre!("--tx-hash is required"))?;
        Ok(TrackRequest { transaction_hash, rpc_url: self.rpc_url.clone() })
    }
}
