use crate::opcodes::play::clientbound;
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::types::BlockPos;
use quarry_common::Result;

/// World event id for block-break particles and sound; data is the broken block state.
pub const BLOCK_BREAK_EVENT: i32 = 2001;

/// Block Update: sets one block on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockUpdatePacket {
    pub position: BlockPos,
    pub block_state: i32,
}

impl Packet for BlockUpdatePacket {
    fn packet_id() -> i32 {
        clientbound::BLOCK_UPDATE
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(BlockUpdatePacket {
            position: buffer.read_position()?,
            block_state: buffer.read_varint()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_position(self.position)
            .write_varint(self.block_state);
        Ok(())
    }
}

/// Acknowledge Block Change: settles every client prediction up to `sequence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcknowledgeBlockChangePacket {
    pub sequence: i32,
}

impl Packet for AcknowledgeBlockChangePacket {
    fn packet_id() -> i32 {
        clientbound::ACKNOWLEDGE_BLOCK_CHANGE
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(AcknowledgeBlockChangePacket {
            sequence: buffer.read_varint()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.sequence);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldEventPacket {
    pub event: i32,
    pub position: BlockPos,
    pub data: i32,
    pub disable_relative_volume: bool,
}

impl WorldEventPacket {
    pub fn block_break(position: BlockPos, block_state: i32) -> Self {
        Self {
            event: BLOCK_BREAK_EVENT,
            position,
            data: block_state,
            disable_relative_volume: false,
        }
    }
}

impl Packet for WorldEventPacket {
    fn packet_id() -> i32 {
        clientbound::WORLD_EVENT
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(WorldEventPacket {
            event: buffer.read_i32()?,
            position: buffer.read_position()?,
            data: buffer.read_i32()?,
            disable_relative_volume: buffer.read_bool()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_i32(self.event)
            .write_position(self.position)
            .write_i32(self.data)
            .write_bool(self.disable_relative_volume);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_update_round_trip() {
        let packet = BlockUpdatePacket {
            position: BlockPos::new(-3, 70, 12),
            block_state: 79,
        };
        let mut buffer = MinecraftPacketBuffer::new();
        packet.write_to_buffer(&mut buffer).unwrap();

        let mut read = MinecraftPacketBuffer::from_bytes(buffer.buffer);
        assert_eq!(read.read_varint().unwrap(), 0x09);
        assert_eq!(BlockUpdatePacket::read_from_buffer(&mut read).unwrap(), packet);
    }

    #[test]
    fn test_world_event_layout() {
        let mut buffer = MinecraftPacketBuffer::new();
        WorldEventPacket::block_break(BlockPos::new(5, 10, 5), 1)
            .write_to_buffer(&mut buffer)
            .unwrap();
        assert_eq!(buffer.buffer[0], 0x26);
        assert_eq!(&buffer.buffer[1..5], &2001i32.to_be_bytes());
        assert_eq!(buffer.len(), 1 + 4 + 8 + 4 + 1);
    }
}
