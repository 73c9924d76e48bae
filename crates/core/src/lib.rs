//! The core public types shared by the cross-chain validation crates.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_lossless,
    clippy::arithmetic_side_effects,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]

pub mod ibc;
pub mod key;
pub mod storage;
pub mod time;

use thiserror::Error;

/// Borsh binary encoding (re-exported) from official crate.
pub mod borsh {
    pub use borsh::*;
}

#[allow(missing_docs)]
#[derive(Error, Debug)]
#[error("Borsh decoding error: {0}")]
pub struct DecodeError(pub std::io::Error);

/// Encode a value with borsh
pub fn encode<T>(value: &T) -> Vec<u8>
where
    T: ::borsh::BorshSerialize,
{
    ::borsh::to_vec(value).expect("Encoding into a vector shouldn't fail")
}

/// Decode a value with borsh
pub fn decode<T>(bytes: impl AsRef<[u8]>) -> Result<T, DecodeError>
where
    T: ::borsh::BorshDeserialize,
{
    T::try_from_slice(bytes.as_ref()).map_err(DecodeError)
}
