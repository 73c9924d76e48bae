//! Child side of cross-chain validation.
//!
//! The parent chain sends validator-set changes to the child chain over an
//! ordered channel. The child records each change as pending and holds back
//! the success acknowledgement of the packet until the unbonding period has
//! elapsed, at which point the acknowledgement tells the parent chain that
//! the stake backing the change may be released.

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

pub mod context;
pub mod genesis;
pub mod keeper;
pub mod logging;
pub mod parameters;
pub mod storage;
#[cfg(test)]
mod tests;
pub mod types;

use ccv_core::ibc::{ChannelId, Packet, Sequence};
use ccv_core::time::DateTimeUtc;
pub use context::{ChildContext, StorageChildContext};
pub use genesis::{export_genesis, init_genesis, ChildGenesisState};
pub use keeper::{BlockResult, ChildKeeper};
pub use parameters::ChildParams;
use thiserror::Error;
pub use types::{
    ChannelStatus, RecvPacketAck, UnbondingEntry, ValidatorSetChangePacketData,
    ValidatorUpdate,
};

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] ccv_storage::Error),
    #[error(
        "The parent channel is already set to {existing}, cannot set it to \
         {requested}"
    )]
    ParentChannelAlreadySet {
        existing: ChannelId,
        requested: ChannelId,
    },
    #[error("No unbonding time found for the packet with sequence {0}")]
    UnbondingTimeNotFound(Sequence),
    #[error("No unbonding packet found for the packet with sequence {0}")]
    UnbondingPacketNotFound(Sequence),
    #[error("The child parameters are not initialized")]
    ParamsNotFound,
    #[error("Invalid child parameters: {0}")]
    InvalidParams(String),
    #[error("Time error: {0}")]
    Time(#[from] ccv_core::time::Error),
    #[error("Failed to decode validator-set change packet data: {0}")]
    DecodingPacketData(serde_json::Error),
    #[error("Unbonding sequence {0} appears more than once")]
    DuplicateUnbondingSequence(Sequence),
    #[error(
        "Unbonding entry {key} holds the packet with sequence {packet}"
    )]
    UnbondingEntrySequenceMismatch { key: Sequence, packet: Sequence },
    #[error(
        "Unbonding entry {sequence} was received on {found}, not on the \
         parent channel {parent}"
    )]
    UnbondingEntryChannelMismatch {
        sequence: Sequence,
        parent: ChannelId,
        found: ChannelId,
    },
    #[error("Configuration error: {0}")]
    Config(String),
}

/// The operations of the child module used by the state machine and its
/// tests. This is the only way the rest of the application reaches the
/// module.
pub trait ChildModule {
    /// Handle a validator-set change packet delivered by the channel layer
    /// at the given block time.
    ///
    /// Returns [`RecvPacketAck::Immediate`] with an error acknowledgement,
    /// without touching the state, if the packet did not arrive on the
    /// parent channel. Otherwise the change becomes pending, the packet
    /// enters the unbonding queue and its acknowledgement is deferred.
    fn on_recv_packet(
        &mut self,
        current_time: DateTimeUtc,
        packet: &Packet,
        data: &ValidatorSetChangePacketData,
    ) -> Result<RecvPacketAck, Error>;

    /// Acknowledge every queued packet whose maturity time is not after the
    /// given block time and remove it from the queue. Returns the matured
    /// sequences in ascending order.
    ///
    /// Entries are processed one at a time in ascending order, each one acked
    /// before it is removed. If committing an acknowledgement fails, the
    /// entries before it stay unbonded and the rest stay queued untouched, so
    /// a later sweep resumes where this one stopped. Rolling back the whole
    /// sweep is left to the block's storage transaction.
    fn unbond_mature_packets(
        &mut self,
        current_time: DateTimeUtc,
    ) -> Result<Vec<Sequence>, Error>;

    /// The registered parent channel, if any
    fn parent_channel(&self) -> Result<Option<ChannelId>, Error>;

    /// The status of the given channel
    fn channel_status(
        &self,
        channel_id: &ChannelId,
    ) -> Result<ChannelStatus, Error>;

    /// The latest received validator-set change, if any
    fn pending_changes(
        &self,
    ) -> Result<Option<ValidatorSetChangePacketData>, Error>;

    /// Maturity time in Unix nanoseconds of the queued packet with the given
    /// sequence
    fn unbonding_time(&self, sequence: Sequence) -> Result<u64, Error>;

    /// The queued packet with the given sequence
    fn unbonding_packet(&self, sequence: Sequence) -> Result<Packet, Error>;
}
