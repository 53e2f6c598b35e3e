use crate::opcodes::play::{clientbound, serverbound};
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::Result;

#[derive(Debug, Clone)]
pub struct KeepAlivePacket {
    pub keep_alive_id: i64,
}

impl KeepAlivePacket {
    pub fn new(keep_alive_id: i64) -> Self {
        Self { keep_alive_id }
    }
}

impl Packet for KeepAlivePacket {
    fn packet_id() -> i32 {
        clientbound::KEEP_ALIVE
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_i64(self.keep_alive_id);
        Ok(())
    }
}

/// The client's echo of a [`KeepAlivePacket`].
#[derive(Debug, Clone)]
pub struct KeepAliveResponsePacket {
    pub keep_alive_id: i64,
}

impl Packet for KeepAliveResponsePacket {
    fn packet_id() -> i32 {
        serverbound::KEEP_ALIVE
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(KeepAliveResponsePacket {
            keep_alive_id: buffer.read_i64()?,
        })
    }
}
