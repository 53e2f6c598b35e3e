use crate::opcodes;
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::{QuarryError, Result};

/// What the client wants after the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    Status,
    Login,
}

impl NextState {
    pub fn id(self) -> i32 {
        match self {
            NextState::Status => 1,
            NextState::Login => 2,
        }
    }

    pub fn from_id(id: i32) -> Result<Self> {
        match id {
            1 => Ok(NextState::Status),
            2 => Ok(NextState::Login),
            other => Err(QuarryError::protocol(format!(
                "Unsupported handshake intent {}",
                other
            ))),
        }
    }
}

/// Handshake packet
#[derive(Debug, Clone)]
pub struct HandshakePacket {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: NextState,
}

impl Packet for HandshakePacket {
    fn packet_id() -> i32 {
        opcodes::handshake::HANDSHAKE
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(HandshakePacket {
            protocol_version: buffer.read_varint()?,
            server_address: buffer.read_string()?,
            server_port: buffer.read_u16()?,
            next_state: NextState::from_id(buffer.read_varint()?)?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.protocol_version)
            .write_string(&self.server_address)
            .write_u16(self.server_port)
            .write_varint(self.next_state.id());
        Ok(())
    }
}
