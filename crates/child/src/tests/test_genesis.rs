//! Genesis initialization and export tests

#![allow(clippy::arithmetic_side_effects)]

use assert_matches::assert_matches;
use ccv_core::ibc::Sequence;
use ccv_core::time::{Duration, DurationSecs};
use ccv_storage::testing::TestStorage;
use test_log::test;

use crate::context::{ChildContext, StorageChildContext};
use crate::genesis::{export_genesis, init_genesis, ChildGenesisState};
use crate::keeper::ChildKeeper;
use crate::parameters::ChildParams;
use crate::tests::{
    committed_ack, genesis_time, make_packet, matured_ack_commitment,
    other_channel_id, packet_data, parent_channel_id,
};
use crate::types::{ChannelStatus, UnbondingEntry};
use crate::{ChildModule, Error};

fn test_genesis() -> ChildGenesisState {
    let data = packet_data(30, 20);
    let t0 = genesis_time().to_unix_nanos().unwrap();
    let unbonding_entries = [3_u64, 1]
        .into_iter()
        .map(|seq| UnbondingEntry {
            sequence: Sequence(seq),
            maturity_time_nanos: t0 + seq * 1_000_000_000,
            packet: make_packet(seq, &data, &parent_channel_id()),
        })
        .collect();
    ChildGenesisState {
        params: ChildParams {
            unbonding_period: DurationSecs(600),
        },
        parent_channel: Some(parent_channel_id()),
        pending_changes: Some(data),
        unbonding_entries,
    }
}

#[test]
fn test_init_and_export_genesis() {
    let genesis = test_genesis();
    let mut storage = TestStorage::default();
    init_genesis(&mut storage, &genesis).unwrap();

    let exported = export_genesis(&storage).unwrap();
    assert_eq!(exported.params, genesis.params);
    assert_eq!(exported.parent_channel, genesis.parent_channel);
    assert_eq!(exported.pending_changes, genesis.pending_changes);
    // Exported in ascending sequence order
    let mut expected_entries = genesis.unbonding_entries.clone();
    expected_entries.sort_by_key(|entry| entry.sequence);
    assert_eq!(exported.unbonding_entries, expected_entries);

    // Re-importing the export gives the same store
    let mut reimported = TestStorage::default();
    init_genesis(&mut reimported, &exported).unwrap();
    assert_eq!(reimported, storage);
}

#[test]
fn test_keeper_resumes_from_genesis() {
    let genesis = test_genesis();
    let mut storage = TestStorage::default();
    init_genesis(&mut storage, &genesis).unwrap();

    let mut keeper =
        ChildKeeper::from_storage(StorageChildContext::new(storage)).unwrap();
    assert_eq!(keeper.params(), &genesis.params);
    assert_eq!(keeper.parent_channel().unwrap(), Some(parent_channel_id()));
    assert_eq!(
        keeper.channel_status(&parent_channel_id()).unwrap(),
        ChannelStatus::Validating
    );

    let matured = keeper
        .unbond_mature_packets(genesis_time() + Duration::seconds(2))
        .unwrap();
    assert_eq!(matured, vec![Sequence(1)]);
    assert_eq!(committed_ack(&keeper, 1), Some(matured_ack_commitment()));
    assert_eq!(
        keeper.unbonding_entries().unwrap()[0].sequence,
        Sequence(3)
    );
    assert!(!keeper.context().storage().db().is_empty());
}

#[test]
fn test_genesis_rejects_duplicate_sequences() {
    let mut genesis = test_genesis();
    let duplicate = genesis.unbonding_entries[0].clone();
    genesis.unbonding_entries.push(duplicate);
    let mut storage = TestStorage::default();
    assert_matches!(
        init_genesis(&mut storage, &genesis),
        Err(Error::DuplicateUnbondingSequence(Sequence(3)))
    );
    assert!(storage.db().is_empty());
}

/// A queue entry must hold the packet it is keyed by, or the sweep would
/// acknowledge the wrong sequence.
#[test]
fn test_genesis_rejects_mismatched_entry_sequence() {
    let mut genesis = test_genesis();
    genesis.unbonding_entries[0].packet =
        make_packet(9, &packet_data(30, 20), &parent_channel_id());
    let mut storage = TestStorage::default();
    assert_matches!(
        init_genesis(&mut storage, &genesis),
        Err(Error::UnbondingEntrySequenceMismatch {
            key: Sequence(3),
            packet: Sequence(9),
        })
    );
    assert!(storage.db().is_empty());
}

#[test]
fn test_genesis_rejects_entry_from_other_channel() {
    let mut genesis = test_genesis();
    genesis.unbonding_entries[1].packet =
        make_packet(1, &packet_data(30, 20), &other_channel_id());
    let mut storage = TestStorage::default();
    assert_matches!(
        init_genesis(&mut storage, &genesis),
        Err(Error::UnbondingEntryChannelMismatch { sequence: Sequence(1), .. })
    );
    assert!(storage.db().is_empty());

    // Without a parent channel there is nothing to check against
    genesis.parent_channel = None;
    init_genesis(&mut storage, &genesis).unwrap();
    assert_eq!(export_genesis(&storage).unwrap().unbonding_entries.len(), 2);
}

#[test]
fn test_genesis_json_round_trip() {
    let genesis = test_genesis();
    let json = genesis.to_json_string();
    let decoded = ChildGenesisState::from_json_str(&json).unwrap();
    assert_eq!(decoded, genesis);

    // Everything but the parameters is optional
    let minimal =
        ChildGenesisState::from_json_str(r#"{"params":{"unbonding_period":60}}"#)
            .unwrap();
    assert_eq!(minimal.parent_channel, None);
    assert!(minimal.unbonding_entries.is_empty());

    assert_matches!(
        ChildGenesisState::from_json_str("{}"),
        Err(Error::Config(_))
    );
}

#[test]
fn test_export_requires_params() {
    let storage = TestStorage::default();
    assert_matches!(export_genesis(&storage), Err(Error::ParamsNotFound));
}
