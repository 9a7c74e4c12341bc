use std::{
    io::Read,
    path::{Path, PathBuf},
};

use alloy_primitives::hex;
use blobcast_blob_engine::{KzgEngine, encode_payload, field_elements_used};
use blobcast_types::blob::{BLOB_DATA_CAPACITY, BlobBundle};
use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use serde::Serialize;

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct EncodeCmd {
    /// File to encode; stdin when omitted
    input: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodeReport {
    size: usize,
    capacity: usize,
    field_elements: usize,
    versioned_hash: String,
    commitment: String,
    proof: String,
}

impl EncodeReport {
    fn new(size: usize, bundle: &BlobBundle) -> Self {
        Self {
            size,
            capacity: BLOB_DATA_CAPACITY,
            field_elements: field_elements_used(size),
            versioned_hash: bundle.versioned_hash().to_string(),
            commitment: hex::encode_prefixed(bundle.commitment().as_bytes()),
            proof: hex::encode_prefixed(bundle.proof().as_bytes()),
        }
    }
}

impl EncodeCmd {
    pub fn run(&self) -> Result<()> {
        let payload = read_input(self.input.as_deref())?;
        let blob = encode_payload(&payload)?;
        let bundle = KzgEngine::global().commit_verified(blob)?;

        let report = EncodeReport::new(payload.len(), &bundle);
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).map_err(|e| eyre!("cannot read {}: {e}", path.display())),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}
