use std::str::FromStr;

use ccv_core::ibc::{
    Acknowledgement, ChannelId, Height, Packet, PortId, Sequence,
};
use ccv_core::key::testing::{public_key_1, public_key_2};
use ccv_core::time::test_utils::GENESIS_TIME;
use ccv_core::time::{DateTimeUtc, DurationSecs};
use ccv_storage::mockdb::MockDB;
use ccv_storage::testing::TestStorage;

use crate::context::{ChildContext, StorageChildContext};
use crate::keeper::{ChildKeeper, MATURED_ACK_RESULT};
use crate::parameters::ChildParams;
use crate::types::{
    ValidatorSetChangePacketData, ValidatorUpdate, CHILD_PORT_ID,
    PARENT_PORT_ID,
};

mod test_genesis;

/// A keeper over in-memory storage
pub type TestKeeper = ChildKeeper<StorageChildContext<TestStorage>>;

/// The channel end the parent chain's packets are delivered to
pub fn parent_channel_id() -> ChannelId {
    ChannelId::from_str("channel-0").unwrap()
}

/// Some channel end that is not the parent channel
pub fn other_channel_id() -> ChannelId {
    ChannelId::from_str("invalidChannel").unwrap()
}

/// Block time of the first block
pub fn genesis_time() -> DateTimeUtc {
    DateTimeUtc::from_str(GENESIS_TIME).unwrap()
}

/// A keeper with the given unbonding period and nothing received yet
pub fn init_keeper(unbonding_period: DurationSecs) -> TestKeeper {
    let ctx = StorageChildContext::new(TestStorage::default());
    ChildKeeper::new(ctx, ChildParams { unbonding_period })
}

/// A validator-set change with two updates
pub fn packet_data(
    power_1: i64,
    power_2: i64,
) -> ValidatorSetChangePacketData {
    ValidatorSetChangePacketData::new(vec![
        ValidatorUpdate {
            pub_key: public_key_1(),
            power: power_1,
        },
        ValidatorUpdate {
            pub_key: public_key_2(),
            power: power_2,
        },
    ])
}

/// A packet from the parent chain carrying the given data
pub fn make_packet(
    sequence: u64,
    data: &ValidatorSetChangePacketData,
    destination_channel: &ChannelId,
) -> Packet {
    Packet {
        sequence: Sequence(sequence),
        source_port: PortId::from_str(PARENT_PORT_ID).unwrap(),
        source_channel: ChannelId::from_str("channel-7").unwrap(),
        destination_port: PortId::from_str(CHILD_PORT_ID).unwrap(),
        destination_channel: destination_channel.clone(),
        data: data.serialize_to_vec(),
        timeout_height: Height::new(1, 0),
        timeout_timestamp: 0,
    }
}

/// A copy of the whole store, to compare states byte for byte
pub fn snapshot(keeper: &TestKeeper) -> MockDB {
    keeper.context().storage().db().clone()
}

/// The committed acknowledgement of a packet received on the parent channel
pub fn committed_ack(keeper: &TestKeeper, sequence: u64) -> Option<Vec<u8>> {
    committed_ack_on(keeper, &parent_channel_id(), sequence)
}

/// The committed acknowledgement of a packet received on the given channel
pub fn committed_ack_on(
    keeper: &TestKeeper,
    channel_id: &ChannelId,
    sequence: u64,
) -> Option<Vec<u8>> {
    keeper
        .context()
        .packet_acknowledgement(
            &PortId::from_str(CHILD_PORT_ID).unwrap(),
            channel_id,
            Sequence(sequence),
        )
        .unwrap()
}

/// The commitment written for a matured packet
pub fn matured_ack_commitment() -> Vec<u8> {
    Acknowledgement::result(MATURED_ACK_RESULT)
        .commitment()
        .to_vec()
}
