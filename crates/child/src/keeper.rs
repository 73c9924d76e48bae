//! The child keeper: receives validator-set change packets and acknowledges
//! them once they have matured.

use ccv_core::ibc::{Acknowledgement, ChannelId, Packet, Sequence};
use ccv_core::time::{self, DateTimeUtc};
use ccv_storage::StorageRead;

use crate::context::ChildContext;
use crate::parameters::ChildParams;
use crate::storage;
use crate::types::{
    ChannelStatus, RecvPacketAck, UnbondingEntry, ValidatorSetChangePacketData,
};
use crate::{ChildModule, Error};

/// The result bytes of the success acknowledgement written for a matured
/// packet
pub const MATURED_ACK_RESULT: [u8; 1] = [1];

/// What happened to the child module's queue during one block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockResult {
    /// Sequences acknowledged by the maturity sweep, ascending
    pub matured: Vec<Sequence>,
    /// Sequences of the packets rejected with an error acknowledgement, in
    /// delivery order
    pub rejected: Vec<Sequence>,
}

/// The child module over an injected context
#[derive(Debug)]
pub struct ChildKeeper<C> {
    ctx: C,
    params: ChildParams,
}

impl<C> ChildKeeper<C>
where
    C: ChildContext,
{
    /// Make a keeper with the given parameters
    pub fn new(ctx: C, params: ChildParams) -> Self {
        Self { ctx, params }
    }

    /// Make a keeper with the parameters persisted at genesis
    pub fn from_storage(ctx: C) -> Result<Self, Error> {
        let params = storage::read_params(ctx.storage())?
            .ok_or(Error::ParamsNotFound)?;
        Ok(Self::new(ctx, params))
    }

    /// The module parameters
    pub fn params(&self) -> &ChildParams {
        &self.params
    }

    /// Borrow the context
    pub fn context(&self) -> &C {
        &self.ctx
    }

    /// Mutably borrow the context
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// Give back the context
    pub fn into_context(self) -> C {
        self.ctx
    }

    /// Register the parent channel. Registering the channel that is already
    /// registered has no effect, any other channel is rejected.
    pub fn set_parent_channel(
        &mut self,
        channel_id: &ChannelId,
    ) -> Result<(), Error> {
        match storage::read_parent_channel(self.ctx.storage())? {
            Some(existing) if &existing == channel_id => Ok(()),
            Some(existing) => Err(Error::ParentChannelAlreadySet {
                existing,
                requested: channel_id.clone(),
            }),
            None => {
                tracing::info!(%channel_id, "Registered the parent channel");
                storage::write_parent_channel(
                    self.ctx.storage_mut(),
                    channel_id,
                )?;
                Ok(())
            }
        }
    }

    /// Set the status of a channel
    pub fn set_channel_status(
        &mut self,
        channel_id: &ChannelId,
        status: ChannelStatus,
    ) -> Result<(), Error> {
        storage::write_channel_status(
            self.ctx.storage_mut(),
            channel_id,
            status,
        )?;
        Ok(())
    }

    /// Overwrite the pending validator-set change
    pub fn set_pending_changes(
        &mut self,
        data: &ValidatorSetChangePacketData,
    ) -> Result<(), Error> {
        storage::write_pending_changes(self.ctx.storage_mut(), data)?;
        Ok(())
    }

    /// Remove the pending validator-set change once it has been applied to
    /// the local validator set
    pub fn delete_pending_changes(&mut self) -> Result<(), Error> {
        storage::delete_pending_changes(self.ctx.storage_mut())?;
        Ok(())
    }

    /// The entries of the unbonding queue in ascending sequence order
    pub fn unbonding_entries(&self) -> Result<Vec<UnbondingEntry>, Error> {
        read_unbonding_entries(self.ctx.storage())
    }

    /// Run the child module for one block: acknowledge the matured entries
    /// first, then receive the packets delivered in the block in order.
    ///
    /// A packet received in a block can therefore never mature in that same
    /// block, even with a zero unbonding period. Rejected packets get their
    /// error acknowledgement committed immediately, as do packets whose data
    /// cannot be decoded.
    pub fn process_block<I>(
        &mut self,
        block_time: DateTimeUtc,
        packets: I,
    ) -> Result<BlockResult, Error>
    where
        I: IntoIterator<Item = Packet>,
    {
        let matured = self.unbond_mature_packets(block_time)?;
        let mut rejected = Vec::new();
        for packet in packets {
            let ack = match ValidatorSetChangePacketData::decode(&packet.data)
            {
                Ok(data) => self.on_recv_packet(block_time, &packet, &data)?,
                Err(err) => {
                    tracing::warn!(
                        sequence = %packet.sequence,
                        "Rejected a packet with invalid data: {err}"
                    );
                    RecvPacketAck::Immediate(Acknowledgement::error(err))
                }
            };
            if let RecvPacketAck::Immediate(ack) = ack {
                self.ctx.write_and_commit_acknowledgement(
                    &packet.destination_port,
                    &packet.destination_channel,
                    packet.sequence,
                    &ack,
                )?;
                rejected.push(packet.sequence);
            }
        }
        Ok(BlockResult { matured, rejected })
    }

    fn maturity_time_nanos(
        &self,
        current_time: DateTimeUtc,
    ) -> Result<u64, Error> {
        let period = self.params.unbonding_period;
        current_time
            .to_unix_nanos()?
            .checked_add(period.as_nanos()?)
            .ok_or_else(|| {
                Error::Time(time::Error::OutOfRange(format!(
                    "{current_time} + {period}s"
                )))
            })
    }
}

impl<C> ChildModule for ChildKeeper<C>
where
    C: ChildContext,
{
    fn on_recv_packet(
        &mut self,
        current_time: DateTimeUtc,
        packet: &Packet,
        data: &ValidatorSetChangePacketData,
    ) -> Result<RecvPacketAck, Error> {
        let channel_id = &packet.destination_channel;
        let parent_channel = storage::read_parent_channel(self.ctx.storage())?;
        if let Some(parent_channel) = &parent_channel {
            if parent_channel != channel_id {
                tracing::warn!(
                    %parent_channel,
                    %channel_id,
                    sequence = %packet.sequence,
                    "Rejected a packet received on a channel other than the \
                     parent channel"
                );
                return Ok(RecvPacketAck::Immediate(Acknowledgement::error(
                    format!(
                        "packet sent on channel {channel_id} which is not the \
                         parent channel {parent_channel}"
                    ),
                )));
            }
        }

        // Computed before any write so that an overflow leaves no trace
        let maturity_time_nanos = self.maturity_time_nanos(current_time)?;

        if parent_channel.is_none() {
            self.set_parent_channel(channel_id)?;
        }
        if storage::read_channel_status(self.ctx.storage(), channel_id)?
            != ChannelStatus::Validating
        {
            self.set_channel_status(channel_id, ChannelStatus::Validating)?;
        }
        self.set_pending_changes(data)?;

        let store = self.ctx.storage_mut();
        storage::write_unbonding_time(
            store,
            packet.sequence,
            maturity_time_nanos,
        )?;
        storage::write_unbonding_packet(store, packet.sequence, packet)?;

        tracing::debug!(
            sequence = %packet.sequence,
            maturity = %DateTimeUtc::from_unix_nanos(maturity_time_nanos),
            updates = data.validator_updates.len(),
            "Accepted a validator-set change, acknowledgement deferred"
        );
        Ok(RecvPacketAck::Deferred)
    }

    fn unbond_mature_packets(
        &mut self,
        current_time: DateTimeUtc,
    ) -> Result<Vec<Sequence>, Error> {
        let now = current_time.to_unix_nanos()?;

        // Collect everything first so the queue isn't mutated while walking it
        let mut matured = Vec::new();
        for res in storage::iter_unbonding_times(self.ctx.storage())? {
            let (sequence, maturity_time_nanos) = res?;
            if maturity_time_nanos <= now {
                matured.push(sequence);
            }
        }
        let matured = matured
            .into_iter()
            .map(|sequence| {
                storage::read_unbonding_packet(self.ctx.storage(), sequence)?
                    .ok_or(Error::UnbondingPacketNotFound(sequence))
                    .map(|packet| (sequence, packet))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let ack = Acknowledgement::result(MATURED_ACK_RESULT);
        // The queue entry is only removed once its ack is committed
        let mut sequences = Vec::with_capacity(matured.len());
        for (sequence, packet) in matured {
            self.ctx.write_and_commit_acknowledgement(
                &packet.destination_port,
                &packet.destination_channel,
                sequence,
                &ack,
            )?;
            let store = self.ctx.storage_mut();
            storage::delete_unbonding_time(store, sequence)?;
            storage::delete_unbonding_packet(store, sequence)?;
            tracing::debug!(%sequence, "Unbonded a matured packet");
            sequences.push(sequence);
        }
        Ok(sequences)
    }

    fn parent_channel(&self) -> Result<Option<ChannelId>, Error> {
        Ok(storage::read_parent_channel(self.ctx.storage())?)
    }

    fn channel_status(
        &self,
        channel_id: &ChannelId,
    ) -> Result<ChannelStatus, Error> {
        Ok(storage::read_channel_status(self.ctx.storage(), channel_id)?)
    }

    fn pending_changes(
        &self,
    ) -> Result<Option<ValidatorSetChangePacketData>, Error> {
        Ok(storage::read_pending_changes(self.ctx.storage())?)
    }

    fn unbonding_time(&self, sequence: Sequence) -> Result<u64, Error> {
        storage::read_unbonding_time(self.ctx.storage(), sequence)?
            .ok_or(Error::UnbondingTimeNotFound(sequence))
    }

    fn unbonding_packet(&self, sequence: Sequence) -> Result<Packet, Error> {
        storage::read_unbonding_packet(self.ctx.storage(), sequence)?
            .ok_or(Error::UnbondingPacketNotFound(sequence))
    }
}

/// Read the unbonding queue in ascending sequence order
pub fn read_unbonding_entries<S>(
    store: &S,
) -> Result<Vec<UnbondingEntry>, Error>
where
    S: StorageRead,
{
    let mut entries = Vec::new();
    for res in storage::iter_unbonding_times(store)? {
        let (sequence, maturity_time_nanos) = res?;
        let packet = storage::read_unbonding_packet(store, sequence)?
            .ok_or(Error::UnbondingPacketNotFound(sequence))?;
        entries.push(UnbondingEntry {
            sequence,
            maturity_time_nanos,
            packet,
        });
    }
    Ok(entries)
}
