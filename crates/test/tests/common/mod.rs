//! Shared helpers for in-process integration tests.
//!
//! Every test builds the real submission pipeline around a local k256 key
//! backend and an in-memory RPC node, with millisecond polling.

use std::{sync::Arc, time::Duration};

use alloy_primitives::{U256, utils::parse_ether};
use blobcast_execution::PollPolicy;
use blobcast_node::{
    AppState, BlobSubmitter, DynEthRpc, DynKeyBackend, SubmissionMetrics, SubmitterConfig,
};
use blobcast_test_support::{LocalKeyBackend, MockEthRpc};
use blobcast_types::{payload::Payload, submission::FundingMode};
use prometheus_client::registry::Registry;

pub(crate) const EXAMPLE_PAYLOAD: &str = r#"{"example":"data"}"#;

/// Pipeline under test plus handles on its doubles.
#[allow(dead_code)]
pub(crate) struct Harness {
    pub(crate) backend: Arc<LocalKeyBackend>,
    pub(crate) rpc: Arc<MockEthRpc>,
    pub(crate) submitter: Arc<BlobSubmitter>,
    pub(crate) registry: Arc<Registry>,
}

#[allow(dead_code)]
impl Harness {
    pub(crate) fn new(backend: LocalKeyBackend, rpc: MockEthRpc, config: SubmitterConfig) -> Self {
        let backend = Arc::new(backend);
        let rpc = Arc::new(rpc);

        let mut registry = Registry::default();
        let metrics = SubmissionMetrics::register(&mut registry);
        let submitter = Arc::new(BlobSubmitter::new(
            backend.clone() as DynKeyBackend,
            rpc.clone() as DynEthRpc,
            config,
            metrics,
        ));

        Self { backend, rpc, submitter, registry: Arc::new(registry) }
    }

    /// Signer holding one ether on a node that confirms everything on the first poll.
    pub(crate) fn funded(mode: FundingMode) -> Self {
        let backend = LocalKeyBackend::from_seed(0x42);
        let rpc = funded_rpc(&backend);
        Self::new(backend, rpc, fast_config(mode))
    }

    pub(crate) fn app_state(&self) -> AppState {
        AppState::new(self.submitter.clone(), self.registry.clone())
    }
}

#[allow(dead_code)]
pub(crate) fn one_ether() -> U256 {
    parse_ether("1").unwrap()
}

#[allow(dead_code)]
pub(crate) fn funded_rpc(backend: &LocalKeyBackend) -> MockEthRpc {
    MockEthRpc::default().with_balance(backend.address(), one_ether())
}

/// Default submitter settings with three 1 ms polls.
#[allow(dead_code)]
pub(crate) fn fast_config(mode: FundingMode) -> SubmitterConfig {
    SubmitterConfig {
        funding_mode: mode,
        confirmation: PollPolicy::new(3, Duration::from_millis(1)),
        ..SubmitterConfig::default()
    }
}

#[allow(dead_code)]
pub(crate) fn example_payload() -> Payload {
    Payload::new(EXAMPLE_PAYLOAD.as_bytes().to_vec()).unwrap()
}

/// `^0x01[0-9a-f]{62}$`
#[allow(dead_code)]
pub(crate) fn is_versioned_hash(s: &str) -> bool {
    s.len() == 66 &&
        s.starts_with("0x01") &&
        s[2..].bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
