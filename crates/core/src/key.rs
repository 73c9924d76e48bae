//! Public keys carried in validator updates.
//!
//! Keys are opaque here: the bytes are never interpreted, only tagged with the
//! signature scheme they belong to so that the consumer applying the updates
//! can decode them.

use std::fmt::Display;

use borsh::{BorshDeserialize, BorshSerialize};
use data_encoding::{BASE64, HEXLOWER};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Signature scheme of a [`PublicKey`]
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum KeyAlgorithm {
    /// Ed25519
    Ed25519,
    /// Secp256k1
    Secp256k1,
}

impl KeyAlgorithm {
    /// Length in bytes of a public key of this scheme
    pub const fn key_len(&self) -> usize {
        match self {
            KeyAlgorithm::Ed25519 => 32,
            KeyAlgorithm::Secp256k1 => 33,
        }
    }
}

/// A public key, as opaque bytes tagged with their algorithm.
///
/// Encoded in JSON the same way tendermint encodes consensus keys, i.e.
/// `{"ed25519": "<base64>"}`.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct PublicKey {
    /// The signature scheme
    pub algorithm: KeyAlgorithm,
    /// The raw key bytes
    pub bytes: Vec<u8>,
}

impl PublicKey {
    /// Construct an ed25519 key from its raw bytes
    pub fn ed25519(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: KeyAlgorithm::Ed25519,
            bytes: bytes.into(),
        }
    }

    /// Construct a secp256k1 key from its raw (compressed) bytes
    pub fn secp256k1(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: KeyAlgorithm::Secp256k1,
            bytes: bytes.into(),
        }
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.algorithm {
            KeyAlgorithm::Ed25519 => "ed25519",
            KeyAlgorithm::Secp256k1 => "secp256k1",
        };
        write!(f, "{tag}:{}", HEXLOWER.encode(&self.bytes))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JsonPublicKey {
    Ed25519(String),
    Secp256k1(String),
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = BASE64.encode(&self.bytes);
        let json = match self.algorithm {
            KeyAlgorithm::Ed25519 => JsonPublicKey::Ed25519(encoded),
            KeyAlgorithm::Secp256k1 => JsonPublicKey::Secp256k1(encoded),
        };
        json.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let (algorithm, encoded) = match JsonPublicKey::deserialize(deserializer)?
        {
            JsonPublicKey::Ed25519(s) => (KeyAlgorithm::Ed25519, s),
            JsonPublicKey::Secp256k1(s) => (KeyAlgorithm::Secp256k1, s),
        };
        let bytes = BASE64.decode(encoded.as_bytes()).map_err(D::Error::custom)?;
        Ok(Self { algorithm, bytes })
    }
}

/// Helpers for testing with keys.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use proptest::prelude::*;

    use super::*;

    /// A deterministic ed25519-shaped key derived from a seed byte
    pub fn public_key_1() -> PublicKey {
        PublicKey::ed25519([1u8; 32])
    }

    /// Another deterministic ed25519-shaped key
    pub fn public_key_2() -> PublicKey {
        PublicKey::ed25519([2u8; 32])
    }

    /// Generate an arbitrary [`KeyAlgorithm`]
    pub fn arb_key_algorithm() -> impl Strategy<Value = KeyAlgorithm> {
        prop_oneof![Just(KeyAlgorithm::Ed25519), Just(KeyAlgorithm::Secp256k1)]
    }

    /// Generate an arbitrary [`PublicKey`] of the correct length for its
    /// algorithm
    pub fn arb_public_key() -> impl Strategy<Value = PublicKey> {
        arb_key_algorithm().prop_flat_map(|algorithm| {
            proptest::collection::vec(any::<u8>(), algorithm.key_len())
                .prop_map(move |bytes| PublicKey { algorithm, bytes })
        })
    }
}
