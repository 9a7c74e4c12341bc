use blobcast_signer::{AwsKmsBackend, RemoteSigner};
use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct AddressCmd {
    /// KMS key id or ARN
    #[clap(long, env = "KMS_KEY_ID")]
    key_id: String,
    /// AWS region of the key
    #[clap(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,
}

impl AddressCmd {
    pub async fn run(&self) -> Result<()> {
        let backend = AwsKmsBackend::connect(self.region.clone(), self.key_id.clone()).await;
        let signer = RemoteSigner::new(backend);
        let address = signer.resolve_address().await?;

        info!(key_id = %self.key_id, %address, "Resolved signer address");
        println!("{address}");
        Ok(())
    }
}
