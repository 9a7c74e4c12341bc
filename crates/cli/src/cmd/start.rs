use std::{net::SocketAddr, sync::Arc};

use blobcast_blob_engine::install_trusted_setup;
use blobcast_execution::HttpEthRpc;
use blobcast_node::{AppState, BlobSubmitter, SubmissionMetrics, serve};
use blobcast_signer::AwsKmsBackend;
use blobcast_types::submission::FundingMode;
use clap::Parser;
use color_eyre::eyre::{self, eyre};
use prometheus_client::registry::Registry;
use tracing::{info, warn};

use crate::config::Config;

#[derive(Parser, Debug, Clone, Default, PartialEq)]
pub struct StartCmd {
    /// Override the HTTP listen address, e.g. 127.0.0.1:3000
    #[clap(long)]
    pub listen_addr: Option<SocketAddr>,

    /// Override how the blob transaction is paid for
    #[clap(long, value_parser = parse_funding_mode)]
    pub funding_mode: Option<FundingMode>,
}

fn parse_funding_mode(s: &str) -> Result<FundingMode, String> {
    s.parse()
}

impl StartCmd {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
        }
        if let Some(mode) = self.funding_mode {
            config.funding_mode = mode;
        }
    }

    pub async fn run(&self, config: Config) -> eyre::Result<()> {
        info!("Service is starting...");
        start(config).await?;
        info!("Service has stopped");
        Ok(())
    }
}

/// Wire the KMS signer, the RPC client and the HTTP API, then serve until ctrl-c.
pub async fn start(config: Config) -> eyre::Result<()> {
    let required = config.validate().map_err(|error| eyre!("Invalid configuration: {error}"))?;

    if let Some(path) = &config.trusted_setup {
        install_trusted_setup(path)
            .map_err(|error| eyre!("Failed to load trusted setup {}: {error}", path.display()))?;
    }

    let backend = AwsKmsBackend::connect(required.aws_region.clone(), required.kms_key_id.clone())
        .await;
    let rpc = HttpEthRpc::new(required.rpc_url.clone())?.with_timeout(config.rpc_timeout());

    let mut registry = Registry::default();
    let metrics = SubmissionMetrics::register(&mut registry);

    let submitter = Arc::new(BlobSubmitter::new(
        Arc::new(backend),
        Arc::new(rpc),
        config.submitter_config(),
        metrics,
    ));

    match submitter.signer().resolve_address().await {
        Ok(address) => info!(
            %address,
            kms_key_id = %required.kms_key_id,
            region = %required.aws_region,
            funding_mode = %config.funding_mode,
            "🟢🟢 KMS signer ready"
        ),
        Err(e) => warn!(error = %e, "Could not resolve signer address, /health will report it"),
    }

    serve(config.listen_addr, AppState::new(submitter, Arc::new(registry))).await?;

    Ok(())
}
