//! Types of the cross-chain validation protocol as seen by the child chain.

use borsh::{BorshDeserialize, BorshSerialize};
use ccv_core::ibc::{Acknowledgement, Packet, Sequence};
use ccv_core::key::PublicKey;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Port bound by the child module
pub const CHILD_PORT_ID: &str = "child";
/// Port bound by the parent module on the counterparty chain
pub const PARENT_PORT_ID: &str = "parent";

/// A single change of a validator's voting power. A power of `0` removes the
/// validator from the set.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct ValidatorUpdate {
    /// Consensus key of the validator
    pub pub_key: PublicKey,
    /// New voting power
    pub power: i64,
}

/// The payload of a validator-set change packet sent by the parent chain.
/// The order of the updates is significant.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct ValidatorSetChangePacketData {
    /// The updates, in the order they must be applied
    pub validator_updates: Vec<ValidatorUpdate>,
}

impl ValidatorSetChangePacketData {
    /// Make new packet data from the given updates
    pub fn new(validator_updates: Vec<ValidatorUpdate>) -> Self {
        Self { validator_updates }
    }

    /// Encode the packet data as the bytes carried in [`Packet::data`]
    pub fn serialize_to_vec(&self) -> Vec<u8> {
        serde_json::to_vec(self)
            .expect("Serializing validator updates shouldn't fail")
    }

    /// Decode packet data from the bytes carried in [`Packet::data`]
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).map_err(Error::DecodingPacketData)
    }
}

/// Status of a channel from the child module's point of view
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum ChannelStatus {
    /// Nothing was received on the channel yet
    #[default]
    Uninitialized,
    /// The channel carries the parent chain's validator-set changes
    Validating,
}

/// An entry of the unbonding queue: a received packet whose success
/// acknowledgement is held back until it matures.
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
pub struct UnbondingEntry {
    /// Sequence of the packet
    pub sequence: Sequence,
    /// Block time in Unix nanoseconds at or after which the packet matures
    pub maturity_time_nanos: u64,
    /// The packet, exactly as received
    pub packet: Packet,
}

/// Outcome of receiving a packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecvPacketAck {
    /// The packet was accepted. Its success acknowledgement is written later,
    /// once the entry matures.
    Deferred,
    /// The packet was rejected. The acknowledgement must be written now.
    Immediate(Acknowledgement),
}

impl RecvPacketAck {
    /// The acknowledgement to write synchronously, if any
    pub fn into_option(self) -> Option<Acknowledgement> {
        match self {
            RecvPacketAck::Deferred => None,
            RecvPacketAck::Immediate(ack) => Some(ack),
        }
    }

    /// Returns `true` if the acknowledgement is deferred
    pub fn is_deferred(&self) -> bool {
        matches!(self, RecvPacketAck::Deferred)
    }
}
