pub mod address;
pub mod encode;
pub mod track;

use address::AddressCmd;
use clap::Subcommand;
use encode::EncodeCmd;
use track::TrackCmd;

#[derive(Subcommand)]
pub enum Commands {
    /// Follow a broadcast blob transaction until it is mined or times out
    Track(TrackCmd),
    /// Print the Ethereum address of a KMS signing key
    Address(AddressCmd),
    /// Encode a payload into a blob and print its KZG commitment
    Encode(EncodeCmd),
}
