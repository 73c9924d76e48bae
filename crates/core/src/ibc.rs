//! IBC-related data types: channel identifiers, the packet envelope delivered
//! by the transport layer and the acknowledgement committed back to it.

use std::fmt::Display;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use data_encoding::BASE64;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::storage::{Key, KeySeg, KEY_SEGMENT_SEPARATOR};

/// Module namespace of the channel layer's storage
pub const IBC_MODULE: &str = "ibc";

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Acknowledgement JSON error: {0}")]
    AckJson(serde_json::Error),
}

/// IBC data types result
pub type Result<T> = std::result::Result<T, Error>;

fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidIdentifier("empty identifier".to_owned()));
    }
    if id.contains(KEY_SEGMENT_SEPARATOR) || id.starts_with('#') {
        return Err(Error::InvalidIdentifier(id.to_owned()));
    }
    Ok(())
}

macro_rules! impl_identifier {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Clone,
            Debug,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            BorshSerialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl BorshDeserialize for $name {
            fn deserialize_reader<R: std::io::Read>(
                reader: &mut R,
            ) -> std::io::Result<Self> {
                use std::io::{Error, ErrorKind};
                let raw: String = BorshDeserialize::deserialize_reader(reader)?;
                Self::try_from(raw)
                    .map_err(|err| Error::new(ErrorKind::InvalidData, err))
            }
        }

        impl $name {
            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                validate_identifier(s)?;
                Ok(Self(s.to_owned()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(s: String) -> Result<Self> {
                validate_identifier(&s)?;
                Ok(Self(s))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

impl_identifier!(PortId, "Identifier of a port bound by a module");
impl_identifier!(ChannelId, "Identifier of a channel end on this chain");

/// The sequence number of a packet, assigned monotonically per channel by the
/// sending end.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
#[serde(transparent)]
pub struct Sequence(pub u64);

impl Sequence {
    /// The sequence as a `u64`
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Sequence {
    fn from(seq: u64) -> Self {
        Self(seq)
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A block height on the counterparty chain, used for packet timeouts.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Height {
    /// Revision (chain upgrade) number
    pub revision_number: u64,
    /// Block height within the revision
    pub revision_height: u64,
}

impl Height {
    /// Make a new height
    pub fn new(revision_number: u64, revision_height: u64) -> Self {
        Self {
            revision_number,
            revision_height,
        }
    }
}

impl Display for Height {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.revision_number, self.revision_height)
    }
}

/// A packet, exactly as delivered by the channel layer.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Packet {
    /// Sequence number, unique per channel
    pub sequence: Sequence,
    /// Port of the sending end
    pub source_port: PortId,
    /// Channel of the sending end
    pub source_channel: ChannelId,
    /// Port of the receiving end (this chain)
    pub destination_port: PortId,
    /// Channel of the receiving end (this chain)
    pub destination_channel: ChannelId,
    /// The opaque payload
    pub data: Vec<u8>,
    /// Height on this chain after which the packet times out
    pub timeout_height: Height,
    /// Timestamp in Unix nanoseconds after which the packet times out, or 0
    /// for none
    pub timeout_timestamp: u64,
}

/// The acknowledgement of a received packet: either a result or an error
/// message. Encoded as `{"result":"<base64>"}` or `{"error":"<message>"}`.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Acknowledgement {
    /// Successful processing with the given result bytes
    #[serde(with = "base64_bytes")]
    Result(Vec<u8>),
    /// Failed processing with an error message
    Error(String),
}

impl Acknowledgement {
    /// A result acknowledgement
    pub fn result(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Result(bytes.into())
    }

    /// An error acknowledgement
    pub fn error(msg: impl Display) -> Self {
        Self::Error(msg.to_string())
    }

    /// Returns `true` for a result acknowledgement
    pub fn success(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    /// The JSON bytes written to the channel layer
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self)
            .expect("Serializing an acknowledgement shouldn't fail")
    }

    /// Decode an acknowledgement from its JSON bytes
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(Error::AckJson)
    }

    /// The commitment of the acknowledgement stored by the channel layer,
    /// the SHA-256 of its JSON bytes
    pub fn commitment(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.to_json_bytes());
        hasher.finalize().into()
    }
}

mod base64_bytes {
    use data_encoding::BASE64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded.as_bytes()).map_err(D::Error::custom)
    }
}

/// Returns a key of the IBC-related data
pub fn ibc_key(path: impl AsRef<str>) -> crate::storage::Result<Key> {
    let path = Key::parse(path)?;
    Ok(Key::module(IBC_MODULE).join(&path))
}

/// Returns a key for the committed acknowledgement of a packet,
/// `#ibc/acks/ports/<port_id>/channels/<channel_id>/sequences/<sequence>`
pub fn ack_key(
    port_id: &PortId,
    channel_id: &ChannelId,
    sequence: Sequence,
) -> Key {
    let path = format!(
        "acks/ports/{port_id}/channels/{channel_id}/sequences/{}",
        sequence.0.raw()
    );
    ibc_key(path).expect("Creating a key for the ack shouldn't fail")
}

/// Returns the base64 rendering of an acknowledgement commitment, as shown in
/// logs and queries
pub fn commitment_to_string(commitment: &[u8]) -> String {
    BASE64.encode(commitment)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(ChannelId::from_str("channel-0").is_ok());
        assert_matches!(
            ChannelId::from_str(""),
            Err(Error::InvalidIdentifier(_))
        );
        assert_matches!(
            PortId::from_str("child/port"),
            Err(Error::InvalidIdentifier(_))
        );
        assert_matches!(
            serde_json::from_str::<ChannelId>(r##""#ibc""##),
            Err(_)
        );
    }

    #[test]
    fn test_identifier_borsh_decoding_validates() {
        let id = ChannelId::from_str("channel-0").unwrap();
        assert_eq!(crate::decode::<ChannelId>(crate::encode(&id)).unwrap(), id);

        let corrupted = crate::encode(&"channel/0".to_owned());
        assert!(crate::decode::<ChannelId>(&corrupted).is_err());
        let reserved = crate::encode(&"#ibc".to_owned());
        assert!(crate::decode::<PortId>(&reserved).is_err());
    }

    #[test]
    fn test_ack_json_encoding() {
        let ack = Acknowledgement::result(vec![1]);
        assert_eq!(ack.to_json_bytes(), br#"{"result":"AQ=="}"#.to_vec());
        assert!(ack.success());

        let ack = Acknowledgement::error("invalid channel");
        assert_eq!(
            ack.to_json_bytes(),
            br#"{"error":"invalid channel"}"#.to_vec()
        );
        assert!(!ack.success());

        let decoded =
            Acknowledgement::from_json_bytes(br#"{"result":"AQ=="}"#).unwrap();
        assert_eq!(decoded, Acknowledgement::result(vec![1]));
    }

    #[test]
    fn test_ack_commitment_is_sha256_of_json() {
        let ack = Acknowledgement::result(vec![1]);
        let expected: [u8; 32] = Sha256::digest(br#"{"result":"AQ=="}"#).into();
        assert_eq!(ack.commitment(), expected);
        assert_ne!(
            ack.commitment(),
            Acknowledgement::error("oops").commitment()
        );
    }

    #[test]
    fn test_ack_key_layout() {
        let port = PortId::from_str("child").unwrap();
        let channel = ChannelId::from_str("channel-0").unwrap();
        let key = ack_key(&port, &channel, Sequence(1));
        assert_eq!(
            key.to_string(),
            format!(
                "#ibc/acks/ports/child/channels/channel-0/sequences/{}",
                1u64.raw()
            )
        );
    }
}
