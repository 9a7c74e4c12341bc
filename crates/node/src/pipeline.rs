//! Blob submission pipeline.
//!
//! ```text
//! payload ─encode─▶ blob ─commit+verify─▶ bundle
//!                                            │
//!   fees ─▶ balance check ─▶ ephemeral: KMS-signed transfer ─▶ await ─▶ local sign ─┐
//!                        └─▶ direct:    KMS-signed type-3 ───────────────────────────┤
//!                                                                                    ▼
//!                                                        broadcast ─▶ await receipt ─▶ response
//! ```
//!
//! Every request runs the whole sequence on its own. The signer and RPC
//! client are shared; nothing else is.

use std::{sync::Arc, time::Instant};

use alloy_consensus::SignableTransaction;
use alloy_primitives::{Address, B256, U256};
use blobcast_blob_engine::{KzgEngine, encode_payload, field_elements_used};
use blobcast_execution::{
    BroadcastError, EphemeralAccount, EthRpc, FeeBudget, PollPolicy, SignedTx, TrackError,
    await_receipt, poll_receipt,
    tx::{make_blob_tx, make_funding_tx, with_sidecar},
};
use blobcast_signer::{KeyBackend, RemoteSigner};
use blobcast_types::{
    api::SubmitResponse,
    blob::BlobBundle,
    constants::{DEFAULT_MAX_FEE_PER_BLOB_GAS, DEFAULT_PRIORITY_FEE_PER_GAS},
    payload::Payload,
    receipt::ReceiptSummary,
    submission::{FundingMode, SubmissionStage},
};
use tracing::{debug, info, warn};

use crate::{error::PipelineError, links::ExplorerLinks, metrics::SubmissionMetrics};

pub type DynKeyBackend = Arc<dyn KeyBackend>;
pub type DynEthRpc = Arc<dyn EthRpc>;

#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    pub funding_mode: FundingMode,
    pub max_fee_per_blob_gas: u128,
    pub default_priority_fee: u128,
    pub confirmation: PollPolicy,
    pub links: ExplorerLinks,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            funding_mode: FundingMode::default(),
            max_fee_per_blob_gas: DEFAULT_MAX_FEE_PER_BLOB_GAS,
            default_priority_fee: DEFAULT_PRIORITY_FEE_PER_GAS,
            confirmation: PollPolicy::confirmation(),
            links: ExplorerLinks::default(),
        }
    }
}

/// Submits payloads as blob transactions signed through a remote key.
pub struct BlobSubmitter {
    signer: RemoteSigner<DynKeyBackend>,
    rpc: DynEthRpc,
    kzg: KzgEngine,
    config: SubmitterConfig,
    metrics: SubmissionMetrics,
}

/// Chain state read once per submission.
struct Prepared {
    signer_address: Address,
    chain_id: u64,
    fees: FeeBudget,
}

impl BlobSubmitter {
    pub fn new(
        backend: DynKeyBackend,
        rpc: DynEthRpc,
        config: SubmitterConfig,
        metrics: SubmissionMetrics,
    ) -> Self {
        Self { signer: RemoteSigner::new(backend), rpc, kzg: KzgEngine::global(), config, metrics }
    }

    pub fn signer(&self) -> &RemoteSigner<DynKeyBackend> {
        &self.signer
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    pub fn metrics(&self) -> &SubmissionMetrics {
        &self.metrics
    }

    /// Runs one submission end to end.
    #[tracing::instrument(name = "submit", skip_all, fields(size = payload.len(), mode = %self.config.funding_mode))]
    pub async fn submit(&self, payload: Payload) -> Result<SubmitResponse, PipelineError> {
        let started = Instant::now();
        self.metrics.record_started();
        let mut stage = StageTracker::new(&self.metrics);

        let result = self.run(&payload, &mut stage).await;
        match &result {
            Ok(response) => {
                self.metrics.record_succeeded(started.elapsed());
                info!(
                    blob_tx = %response.blob_transaction_hash,
                    blob_hash = %response.blob_hash,
                    stage = %stage.current(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "🟢 Blob submitted"
                );
            }
            Err(e) => {
                stage.fail();
                self.metrics.record_failed(started.elapsed());
                warn!(error = %e, "🔴 Blob submission failed");
            }
        }
        result
    }

    async fn run(
        &self,
        payload: &Payload,
        stage: &mut StageTracker<'_>,
    ) -> Result<SubmitResponse, PipelineError> {
        let bundle = self.commit(payload)?;
        let versioned_hash = bundle.versioned_hash();

        let prepared = self.prepare().await?;
        stage.advance(SubmissionStage::FeeEstimated);
        self.check_balance(&prepared).await?;

        let (transfer_hash, ephemeral) = match self.config.funding_mode {
            FundingMode::Ephemeral => {
                let account = EphemeralAccount::generate();
                let transfer_hash = self.fund(&prepared, &account).await?;
                stage.advance(SubmissionStage::Funded);
                (Some(transfer_hash), Some(account))
            }
            FundingMode::Direct => (None, None),
        };

        let sent = self.send_blob_tx(payload, &prepared, &bundle, ephemeral, stage).await;
        let (blob_tx_hash, receipt) = match transfer_hash {
            Some(hash) => sent.map_err(|e| PipelineError::after_funding(hash, e))?,
            None => sent?,
        };

        Ok(self.response(payload, &prepared, versioned_hash, blob_tx_hash, transfer_hash, receipt))
    }

    /// Signs, broadcasts and follows the blob transaction. An ephemeral
    /// account signs when given, the remote key otherwise.
    async fn send_blob_tx(
        &self,
        payload: &Payload,
        prepared: &Prepared,
        bundle: &BlobBundle,
        ephemeral: Option<EphemeralAccount>,
        stage: &mut StageTracker<'_>,
    ) -> Result<(B256, Option<ReceiptSummary>), PipelineError> {
        let signed = match ephemeral {
            Some(account) => self.sign_with_ephemeral(prepared, account, bundle).await?,
            None => self.sign_direct(prepared, bundle).await?,
        };
        stage.advance(SubmissionStage::Signed);
        debug!(bytes = payload.len(), tx_hash = %signed.hash, "Blob transaction signed");

        let blob_tx_hash = self.broadcast("blob", &signed).await?;
        stage.advance(SubmissionStage::Submitted);

        let receipt = match poll_receipt(self.rpc.as_ref(), blob_tx_hash, self.config.confirmation).await {
            Ok(confirmation) => {
                self.metrics.observe_confirmation_attempts(confirmation.attempts);
                if !confirmation.receipt.success {
                    return Err(PipelineError::Reverted { stage: "blob", tx_hash: blob_tx_hash });
                }
                stage.advance(SubmissionStage::Confirmed);
                Some(confirmation.receipt)
            }
            Err(TrackError::ConfirmationTimeout { attempts, .. }) => {
                warn!(%blob_tx_hash, attempts, "Blob transaction sent but not yet confirmed");
                stage.advance(SubmissionStage::TimedOut);
                None
            }
        };
        Ok((blob_tx_hash, receipt))
    }

    fn commit(&self, payload: &Payload) -> Result<BlobBundle, PipelineError> {
        let blob = encode_payload(payload.as_bytes())?;
        debug!(
            bytes = payload.len(),
            field_elements = field_elements_used(payload.len()),
            "Payload encoded"
        );

        let started = Instant::now();
        let bundle = self.kzg.commit_verified(blob)?;
        self.metrics.observe_commitment_time(started.elapsed());
        info!(versioned_hash = %bundle.versioned_hash(), "Blob committed");
        Ok(bundle)
    }

    async fn prepare(&self) -> Result<Prepared, PipelineError> {
        let signer_address = self.signer.resolve_address().await?;
        let chain_id = self.rpc.chain_id().await?;
        let fees = FeeBudget::estimate(
            self.rpc.as_ref(),
            self.config.default_priority_fee,
            self.config.max_fee_per_blob_gas,
        )
        .await?;
        info!(
            %signer_address,
            chain_id,
            max_fee_per_gas = fees.max_fee_per_gas,
            max_fee_per_blob_gas = fees.max_fee_per_blob_gas,
            blob_tx_cost = %fees.blob_tx_cost(),
            "Fees estimated"
        );
        Ok(Prepared { signer_address, chain_id, fees })
    }

    /// Amount the signer must hold before anything is signed.
    fn required_balance(&self, fees: &FeeBudget) -> U256 {
        match self.config.funding_mode {
            FundingMode::Ephemeral => fees.blob_tx_cost() + fees.transfer_fee(),
            FundingMode::Direct => fees.blob_tx_cost(),
        }
    }

    async fn check_balance(&self, prepared: &Prepared) -> Result<(), PipelineError> {
        let balance = self.rpc.balance(prepared.signer_address).await?;
        let required = self.required_balance(&prepared.fees);
        if balance <= required {
            return Err(PipelineError::InsufficientBalance { balance, required });
        }
        debug!(%balance, %required, "Signer balance sufficient");
        Ok(())
    }

    /// Sends `blob_tx_cost` from the signer to the ephemeral account and
    /// waits for it to land.
    async fn fund(&self, prepared: &Prepared, account: &EphemeralAccount) -> Result<B256, PipelineError> {
        let value = prepared.fees.blob_tx_cost();
        let nonce = self.rpc.pending_nonce(prepared.signer_address).await?;
        let tx = make_funding_tx(prepared.chain_id, nonce, account.address(), value, &prepared.fees);

        let signature = self.signer.sign_prehash(tx.signature_hash()).await?;
        let signed = SignedTx::assemble(tx, signature);
        let tx_hash = self.broadcast("funding", &signed).await?;
        info!(%tx_hash, ephemeral = %account.address(), %value, nonce, "Funding transfer sent");

        let receipt = await_receipt(self.rpc.as_ref(), tx_hash, self.config.confirmation)
            .await
            .map_err(|TrackError::ConfirmationTimeout { tx_hash, attempts }| {
                PipelineError::FundingTimeout { tx_hash, attempts }
            })?;
        if !receipt.success {
            return Err(PipelineError::Reverted { stage: "funding", tx_hash });
        }

        let balance = self.rpc.balance(account.address()).await?;
        if balance < value {
            return Err(PipelineError::after_funding(
                tx_hash,
                PipelineError::FundingShortfall { balance, required: value },
            ));
        }
        info!(%tx_hash, block = receipt.block_number, "Funding transfer confirmed");
        Ok(tx_hash)
    }

    async fn sign_with_ephemeral(
        &self,
        prepared: &Prepared,
        account: EphemeralAccount,
        bundle: &BlobBundle,
    ) -> Result<SignedTx, PipelineError> {
        // A fresh account has never sent anything.
        let tx = make_blob_tx(
            prepared.chain_id,
            0,
            prepared.signer_address,
            bundle.versioned_hash(),
            &prepared.fees,
        );
        Ok(account.sign_blob_tx(with_sidecar(tx, bundle.to_sidecar())).await?)
    }

    async fn sign_direct(&self, prepared: &Prepared, bundle: &BlobBundle) -> Result<SignedTx, PipelineError> {
        let nonce = self.rpc.pending_nonce(prepared.signer_address).await?;
        let tx = with_sidecar(
            make_blob_tx(
                prepared.chain_id,
                nonce,
                prepared.signer_address,
                bundle.versioned_hash(),
                &prepared.fees,
            ),
            bundle.to_sidecar(),
        );
        let signature = self.signer.sign_prehash(tx.signature_hash()).await?;
        Ok(SignedTx::assemble(tx, signature))
    }

    async fn broadcast(&self, stage: &'static str, signed: &SignedTx) -> Result<B256, PipelineError> {
        let reported = self
            .rpc
            .send_raw_transaction(&signed.raw)
            .await
            .map_err(|e| PipelineError::Broadcast { stage, source: BroadcastError::from(e) })?;
        if reported != signed.hash {
            warn!(stage, local = %signed.hash, %reported, "Node reported a different transaction hash");
        }
        Ok(signed.hash)
    }

    fn response(
        &self,
        payload: &Payload,
        prepared: &Prepared,
        versioned_hash: B256,
        blob_tx_hash: B256,
        transfer_hash: Option<B256>,
        receipt: Option<ReceiptSummary>,
    ) -> SubmitResponse {
        let links = &self.config.links;
        SubmitResponse {
            success: true,
            blob_transaction_hash: blob_tx_hash.to_string(),
            eth_transfer_hash: transfer_hash.map(|h| h.to_string()),
            block_number: receipt.map(|r| r.block_number),
            blob_hash: versioned_hash.to_string(),
            gas_used: receipt.map(|r| r.gas_used.to_string()),
            blob_gas_used: receipt.and_then(|r| r.blob_gas_used).map(|g| g.to_string()),
            etherscan_blob_url: links.tx(&blob_tx_hash),
            etherscan_transfer_url: transfer_hash.map(|h| links.tx(&h)),
            blob_url: links.blob(&versioned_hash),
            signer_address: prepared.signer_address.to_string(),
            data_size: payload.len(),
            kms_key_id: self.signer.key_id().to_owned(),
        }
    }
}

/// Enforces legal stage transitions and records each one.
struct StageTracker<'a> {
    current: SubmissionStage,
    metrics: &'a SubmissionMetrics,
}

impl<'a> StageTracker<'a> {
    fn new(metrics: &'a SubmissionMetrics) -> Self {
        metrics.record_stage(SubmissionStage::Drafted);
        Self { current: SubmissionStage::Drafted, metrics }
    }

    fn current(&self) -> SubmissionStage {
        self.current
    }

    fn advance(&mut self, next: SubmissionStage) {
        debug_assert!(self.current.can_advance_to(next), "{} -> {next}", self.current);
        debug!(from = %self.current, to = %next, "Stage transition");
        self.current = next;
        self.metrics.record_stage(next);
    }

    fn fail(&mut self) {
        if !self.current.is_terminal() {
            self.advance(SubmissionStage::Failed);
        }
    }
}
