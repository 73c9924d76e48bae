//! Storage keys and accessors of the child module's state.
//!
//! Everything lives under the `#ccv_child` module segment:
//!
//! - `parent_channel`: the registered parent channel
//! - `channel_status/<channel>`: the status of a channel
//! - `pending_changes`: the latest received validator-set change
//! - `unbonding_time/<sequence>`: maturity time (Unix nanos) of a packet
//! - `unbonding_packet/<sequence>`: the packet awaiting maturity
//! - `params`: the module parameters

use ccv_core::ibc::{ChannelId, Packet, Sequence};
use ccv_core::storage::{DbKeySeg, Key, KeySeg};
use ccv_storage::{self as storage_api, OptionExt, StorageRead, StorageWrite};

use crate::parameters::ChildParams;
use crate::types::{ChannelStatus, ValidatorSetChangePacketData};

/// Module namespace of the child's storage
pub const MODULE_NAME: &str = "ccv_child";

const PARENT_CHANNEL_KEY: &str = "parent_channel";
const CHANNEL_STATUS_PREFIX: &str = "channel_status";
const PENDING_CHANGES_KEY: &str = "pending_changes";
const UNBONDING_TIME_PREFIX: &str = "unbonding_time";
const UNBONDING_PACKET_PREFIX: &str = "unbonding_packet";
const PARAMS_KEY: &str = "params";

fn module_key(segment: &str) -> Key {
    Key::module(MODULE_NAME)
        .push(&segment.to_owned())
        .expect("Cannot obtain a storage key")
}

/// Returns `true` if the given key belongs to the child module
pub fn is_ccv_child_key(key: &Key) -> bool {
    matches!(
        key.first(),
        Some(DbKeySeg::ModuleSeg(module)) if module == MODULE_NAME
    )
}

/// Key of the registered parent channel
pub fn parent_channel_key() -> Key {
    module_key(PARENT_CHANNEL_KEY)
}

/// Prefix of the per-channel status keys
pub fn channel_status_prefix() -> Key {
    module_key(CHANNEL_STATUS_PREFIX)
}

/// Key of the status of the given channel
pub fn channel_status_key(channel_id: &ChannelId) -> Key {
    channel_status_prefix()
        .push(&channel_id.to_string())
        .expect("Creating a key for the channel status shouldn't fail")
}

/// Key of the pending validator-set change
pub fn pending_changes_key() -> Key {
    module_key(PENDING_CHANGES_KEY)
}

/// Prefix of the unbonding times, iterated in ascending sequence order
pub fn unbonding_time_prefix() -> Key {
    module_key(UNBONDING_TIME_PREFIX)
}

/// Key of the maturity time of the packet with the given sequence
pub fn unbonding_time_key(sequence: Sequence) -> Key {
    unbonding_time_prefix()
        .push(&sequence.value())
        .expect("Creating a key for the unbonding time shouldn't fail")
}

/// Prefix of the unbonding packets
pub fn unbonding_packet_prefix() -> Key {
    module_key(UNBONDING_PACKET_PREFIX)
}

/// Key of the unbonding packet with the given sequence
pub fn unbonding_packet_key(sequence: Sequence) -> Key {
    unbonding_packet_prefix()
        .push(&sequence.value())
        .expect("Creating a key for the unbonding packet shouldn't fail")
}

/// Key of the module parameters
pub fn params_key() -> Key {
    module_key(PARAMS_KEY)
}

/// Returns the sequence if the key is an unbonding time key
pub fn unbonding_time_sequence(key: &Key) -> Option<Sequence> {
    match key.split_prefix(&unbonding_time_prefix())? {
        Some(suffix) => match &suffix.segments[..] {
            [DbKeySeg::StringSeg(seq)] => {
                u64::parse(seq.clone()).ok().map(Sequence)
            }
            _ => None,
        },
        None => None,
    }
}

/// Read the registered parent channel, if any
pub fn read_parent_channel<S>(
    storage: &S,
) -> storage_api::Result<Option<ChannelId>>
where
    S: StorageRead,
{
    storage.read(&parent_channel_key())
}

/// Write the parent channel
pub fn write_parent_channel<S>(
    storage: &mut S,
    channel_id: &ChannelId,
) -> storage_api::Result<()>
where
    S: StorageWrite,
{
    storage.write(&parent_channel_key(), channel_id)
}

/// Read the status of the given channel. A channel without a recorded status
/// is [`ChannelStatus::Uninitialized`].
pub fn read_channel_status<S>(
    storage: &S,
    channel_id: &ChannelId,
) -> storage_api::Result<ChannelStatus>
where
    S: StorageRead,
{
    Ok(storage
        .read(&channel_status_key(channel_id))?
        .unwrap_or_default())
}

/// Write the status of the given channel
pub fn write_channel_status<S>(
    storage: &mut S,
    channel_id: &ChannelId,
    status: ChannelStatus,
) -> storage_api::Result<()>
where
    S: StorageWrite,
{
    storage.write(&channel_status_key(channel_id), status)
}

/// Read the pending validator-set change, if any
pub fn read_pending_changes<S>(
    storage: &S,
) -> storage_api::Result<Option<ValidatorSetChangePacketData>>
where
    S: StorageRead,
{
    storage.read(&pending_changes_key())
}

/// Overwrite the pending validator-set change
pub fn write_pending_changes<S>(
    storage: &mut S,
    data: &ValidatorSetChangePacketData,
) -> storage_api::Result<()>
where
    S: StorageWrite,
{
    storage.write(&pending_changes_key(), data)
}

/// Delete the pending validator-set change once it has been applied
pub fn delete_pending_changes<S>(storage: &mut S) -> storage_api::Result<()>
where
    S: StorageWrite,
{
    storage.delete(&pending_changes_key())
}

/// Read the maturity time of the packet with the given sequence
pub fn read_unbonding_time<S>(
    storage: &S,
    sequence: Sequence,
) -> storage_api::Result<Option<u64>>
where
    S: StorageRead,
{
    storage.read(&unbonding_time_key(sequence))
}

/// Write the maturity time of the packet with the given sequence
pub fn write_unbonding_time<S>(
    storage: &mut S,
    sequence: Sequence,
    maturity_time_nanos: u64,
) -> storage_api::Result<()>
where
    S: StorageWrite,
{
    storage.write(&unbonding_time_key(sequence), maturity_time_nanos)
}

/// Delete the maturity time of the packet with the given sequence
pub fn delete_unbonding_time<S>(
    storage: &mut S,
    sequence: Sequence,
) -> storage_api::Result<()>
where
    S: StorageWrite,
{
    storage.delete(&unbonding_time_key(sequence))
}

/// Read the unbonding packet with the given sequence
pub fn read_unbonding_packet<S>(
    storage: &S,
    sequence: Sequence,
) -> storage_api::Result<Option<Packet>>
where
    S: StorageRead,
{
    storage.read(&unbonding_packet_key(sequence))
}

/// Write the unbonding packet with the given sequence
pub fn write_unbonding_packet<S>(
    storage: &mut S,
    sequence: Sequence,
    packet: &Packet,
) -> storage_api::Result<()>
where
    S: StorageWrite,
{
    storage.write(&unbonding_packet_key(sequence), packet)
}

/// Delete the unbonding packet with the given sequence
pub fn delete_unbonding_packet<S>(
    storage: &mut S,
    sequence: Sequence,
) -> storage_api::Result<()>
where
    S: StorageWrite,
{
    storage.delete(&unbonding_packet_key(sequence))
}

/// Iterate the unbonding times in ascending sequence order
pub fn iter_unbonding_times<S>(
    storage: &S,
) -> storage_api::Result<
    impl Iterator<Item = storage_api::Result<(Sequence, u64)>> + '_,
>
where
    S: StorageRead,
{
    let prefix = unbonding_time_prefix();
    let iter = storage_api::iter_prefix::<u64>(storage, &prefix)?;
    Ok(iter.map(|res| {
        let (key, maturity) = res?;
        let sequence = unbonding_time_sequence(&key)
            .ok_or_err_msg("Malformed unbonding time key")?;
        Ok((sequence, maturity))
    }))
}

/// Read the module parameters
pub fn read_params<S>(storage: &S) -> storage_api::Result<Option<ChildParams>>
where
    S: StorageRead,
{
    storage.read(&params_key())
}

/// Write the module parameters
pub fn write_params<S>(
    storage: &mut S,
    params: &ChildParams,
) -> storage_api::Result<()>
where
    S: StorageWrite,
{
    storage.write(&params_key(), params)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use ccv_storage::testing::TestStorage;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_key_layout() {
        let channel = ChannelId::from_str("channel-0").unwrap();
        assert_eq!(
            parent_channel_key().to_string(),
            "#ccv_child/parent_channel"
        );
        assert_eq!(
            channel_status_key(&channel).to_string(),
            "#ccv_child/channel_status/channel-0"
        );
        assert_eq!(
            pending_changes_key().to_string(),
            "#ccv_child/pending_changes"
        );
        assert!(is_ccv_child_key(&unbonding_packet_key(Sequence(1))));
        assert!(!is_ccv_child_key(&Key::module("ibc")));
    }

    #[test]
    fn test_unbonding_time_sequence() {
        let key = unbonding_time_key(Sequence(42));
        assert_eq!(unbonding_time_sequence(&key), Some(Sequence(42)));
        assert_eq!(
            unbonding_time_sequence(&unbonding_packet_key(Sequence(42))),
            None
        );
        assert_eq!(unbonding_time_sequence(&unbonding_time_prefix()), None);
    }

    #[test]
    fn test_channel_status_defaults_to_uninitialized() {
        let mut storage = TestStorage::default();
        let channel = ChannelId::from_str("channel-0").unwrap();
        assert_eq!(
            read_channel_status(&storage, &channel).unwrap(),
            ChannelStatus::Uninitialized
        );
        write_channel_status(&mut storage, &channel, ChannelStatus::Validating)
            .unwrap();
        assert_eq!(
            read_channel_status(&storage, &channel).unwrap(),
            ChannelStatus::Validating
        );
    }

    proptest! {
        /// The unbonding queue is walked in ascending sequence order
        /// whatever the insertion order.
        #[test]
        fn test_iter_unbonding_times_ascending(
            seqs in proptest::collection::btree_set(any::<u64>(), 0..20)
        ) {
            let mut storage = TestStorage::default();
            for seq in seqs.iter().rev() {
                write_unbonding_time(&mut storage, Sequence(*seq), *seq).unwrap();
            }
            let walked: Vec<u64> = iter_unbonding_times(&storage)
                .unwrap()
                .map(|res| res.unwrap().0.value())
                .collect();
            let expected: Vec<u64> = seqs.into_iter().collect();
            prop_assert_eq!(walked, expected);
        }
    }
}
