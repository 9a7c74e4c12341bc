use core::fmt;

use alloy_consensus::TxEip4844Variant;
use alloy_network::TxSigner;
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;

use crate::tx::SignedTx;

/// Single-use account that sends exactly one blob transaction.
///
/// The key is generated in memory, never cloned, logged or persisted, and is
/// dropped by [`sign_blob_tx`](Self::sign_blob_tx).
pub struct EphemeralAccount {
    signer: PrivateKeySigner,
}

impl EphemeralAccount {
    pub fn generate() -> Self {
        Self { signer: PrivateKeySigner::random() }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs the type-3 transaction and consumes the account.
    pub async fn sign_blob_tx(self, mut tx: TxEip4844Variant) -> Result<SignedTx, alloy_signer::Error> {
        let signature = self.signer.sign_transaction(&mut tx).await?;
        Ok(SignedTx::assemble(tx, signature))
    }
}

impl fmt::Debug for EphemeralAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralAccount")
            .field("address", &format_args!("{}", self.address()))
            .finish_non_exhaustive()
    }
}
