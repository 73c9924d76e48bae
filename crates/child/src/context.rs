//! Collaborators injected into the child keeper: the state store and the
//! channel layer's acknowledgement writer.

use ccv_core::ibc::{ack_key, Acknowledgement, ChannelId, PortId, Sequence};
use ccv_storage::{self as storage_api, StorageRead, StorageWrite};

/// Child context trait to be implemented in integration that can read and
/// write state and commit acknowledgements to the channel layer.
pub trait ChildContext {
    /// Storage read/write type
    type Storage: StorageRead + StorageWrite;

    /// Read-only storage access
    fn storage(&self) -> &Self::Storage;

    /// Read/write storage access
    fn storage_mut(&mut self) -> &mut Self::Storage;

    /// Write the acknowledgement of the packet identified by the receiving
    /// port, channel and sequence, and commit it for relaying
    fn write_and_commit_acknowledgement(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
        ack: &Acknowledgement,
    ) -> storage_api::Result<()>;
}

/// A context that commits acknowledgements into the same store the child
/// module keeps its state in, the way the channel layer does: only the
/// commitment of an acknowledgement is persisted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StorageChildContext<S> {
    storage: S,
}

impl<S> StorageChildContext<S>
where
    S: StorageRead + StorageWrite,
{
    /// Wrap a store
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Unwrap the store
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Read the committed acknowledgement of a packet, if any
    pub fn packet_acknowledgement(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
    ) -> storage_api::Result<Option<Vec<u8>>> {
        self.storage
            .read_bytes(&ack_key(port_id, channel_id, sequence))
    }
}

impl<S> ChildContext for StorageChildContext<S>
where
    S: StorageRead + StorageWrite,
{
    type Storage = S;

    fn storage(&self) -> &S {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn write_and_commit_acknowledgement(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
        ack: &Acknowledgement,
    ) -> storage_api::Result<()> {
        let key = ack_key(port_id, channel_id, sequence);
        if self.storage.has_key(&key)? {
            return Err(storage_api::Error::new_const(
                "The acknowledgement of the packet has already been written",
            ));
        }
        let commitment = ack.commitment();
        tracing::debug!(
            %port_id,
            %channel_id,
            %sequence,
            commitment = ccv_core::ibc::commitment_to_string(&commitment),
            success = ack.success(),
            "Committing acknowledgement"
        );
        self.storage.write_bytes(&key, commitment)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use assert_matches::assert_matches;
    use ccv_storage::testing::TestStorage;

    use super::*;

    #[test]
    fn test_ack_commitment_written_once() {
        let mut ctx = StorageChildContext::new(TestStorage::default());
        let port = PortId::from_str("child").unwrap();
        let channel = ChannelId::from_str("channel-0").unwrap();
        let ack = Acknowledgement::result(vec![1]);

        assert_eq!(
            ctx.packet_acknowledgement(&port, &channel, Sequence(1))
                .unwrap(),
            None
        );
        ctx.write_and_commit_acknowledgement(
            &port,
            &channel,
            Sequence(1),
            &ack,
        )
        .unwrap();
        assert_eq!(
            ctx.packet_acknowledgement(&port, &channel, Sequence(1))
                .unwrap(),
            Some(ack.commitment().to_vec())
        );
        assert_matches!(
            ctx.write_and_commit_acknowledgement(
                &port,
                &channel,
                Sequence(1),
                &ack
            ),
            Err(storage_api::Error::SimpleMessage(_))
        );
    }
}
