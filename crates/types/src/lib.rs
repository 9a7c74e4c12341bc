#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![allow(missing_docs)]

pub mod aliases;
pub mod api;
pub mod constants;
pub mod payload;
pub mod receipt;
pub mod submission;

// EIP-4844 blob types shared by the blob engine, execution and node crates.
pub mod blob;
