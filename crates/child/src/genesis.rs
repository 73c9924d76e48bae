//! Initialization and export of the child module's state

use std::collections::BTreeSet;

use ccv_core::ibc::ChannelId;
use ccv_storage::{StorageRead, StorageWrite};
use serde::{Deserialize, Serialize};

use crate::keeper::read_unbonding_entries;
use crate::parameters::ChildParams;
use crate::storage;
use crate::types::{
    ChannelStatus, UnbondingEntry, ValidatorSetChangePacketData,
};
use crate::Error;

/// The child module's state at genesis or at an export height
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildGenesisState {
    /// Module parameters
    pub params: ChildParams,
    /// The parent channel, if one was already registered
    #[serde(default)]
    pub parent_channel: Option<ChannelId>,
    /// The pending validator-set change, if any
    #[serde(default)]
    pub pending_changes: Option<ValidatorSetChangePacketData>,
    /// The unbonding queue
    #[serde(default)]
    pub unbonding_entries: Vec<UnbondingEntry>,
}

impl ChildGenesisState {
    /// Parse a genesis state from JSON
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        serde_json::from_str(s).map_err(|err| {
            Error::Config(format!("Invalid child genesis JSON: {err}"))
        })
    }

    /// Render the genesis state as JSON
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self)
            .expect("Serializing the child genesis state shouldn't fail")
    }
}

/// Write the genesis state into storage
pub fn init_genesis<S>(
    store: &mut S,
    genesis: &ChildGenesisState,
) -> Result<(), Error>
where
    S: StorageRead + StorageWrite,
{
    genesis.params.validate()?;

    let mut sequences = BTreeSet::new();
    for entry in &genesis.unbonding_entries {
        if !sequences.insert(entry.sequence) {
            return Err(Error::DuplicateUnbondingSequence(entry.sequence));
        }
        if entry.packet.sequence != entry.sequence {
            return Err(Error::UnbondingEntrySequenceMismatch {
                key: entry.sequence,
                packet: entry.packet.sequence,
            });
        }
        match &genesis.parent_channel {
            Some(parent) if *parent != entry.packet.destination_channel => {
                return Err(Error::UnbondingEntryChannelMismatch {
                    sequence: entry.sequence,
                    parent: parent.clone(),
                    found: entry.packet.destination_channel.clone(),
                });
            }
            _ => {}
        }
    }

    storage::write_params(store, &genesis.params)?;
    if let Some(channel_id) = &genesis.parent_channel {
        storage::write_parent_channel(store, channel_id)?;
        storage::write_channel_status(
            store,
            channel_id,
            ChannelStatus::Validating,
        )?;
    }
    if let Some(data) = &genesis.pending_changes {
        storage::write_pending_changes(store, data)?;
    }
    for entry in &genesis.unbonding_entries {
        storage::write_unbonding_time(
            store,
            entry.sequence,
            entry.maturity_time_nanos,
        )?;
        storage::write_unbonding_packet(store, entry.sequence, &entry.packet)?;
    }
    tracing::info!(
        parent_channel = ?genesis.parent_channel,
        unbonding_entries = genesis.unbonding_entries.len(),
        "Initialized the child module"
    );
    Ok(())
}

/// Read the module's state back from storage
pub fn export_genesis<S>(store: &S) -> Result<ChildGenesisState, Error>
where
    S: StorageRead,
{
    let params = storage::read_params(store)?.ok_or(Error::ParamsNotFound)?;
    Ok(ChildGenesisState {
        params,
        parent_channel: storage::read_parent_channel(store)?,
        pending_changes: storage::read_pending_changes(store)?,
        unbonding_entries: read_unbonding_entries(store)?,
    })
}
