use crate::opcodes::{self, status};
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::{QuarryError, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Serialize)]
pub struct StatusPlayers {
    pub max: u32,
    pub online: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusDescription {
    pub text: String,
}

/// The JSON document shown in the client's server list.
#[derive(Debug, Serialize)]
pub struct ServerStatus {
    pub version: StatusVersion,
    pub players: StatusPlayers,
    pub description: StatusDescription,
    #[serde(rename = "enforcesSecureChat")]
    pub enforces_secure_chat: bool,
}

impl ServerStatus {
    pub fn new(motd: &str, online: usize, max: u32) -> Self {
        Self {
            version: StatusVersion {
                name: opcodes::VERSION_NAME.to_owned(),
                protocol: opcodes::PROTOCOL_VERSION,
            },
            players: StatusPlayers { max, online },
            description: StatusDescription {
                text: crate::chat::translate_color_codes(motd),
            },
            enforces_secure_chat: false,
        }
    }
}

pub struct StatusResponsePacket {
    pub response: String,
}

impl StatusResponsePacket {
    pub fn new(status: &ServerStatus) -> Result<Self> {
        let response = serde_json::to_string(status)
            .map_err(|e| QuarryError::protocol(format!("Failed to encode status: {}", e)))?;
        Ok(Self { response })
    }
}

impl Packet for StatusResponsePacket {
    fn packet_id() -> i32 {
        status::clientbound::STATUS_RESPONSE
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_string(&self.response);
        Ok(())
    }
}

/// Ping payload, echoed back unchanged as the pong.
#[derive(Debug, Clone, Copy)]
pub struct PingPacket {
    pub payload: i64,
}

impl Packet for PingPacket {
    fn packet_id() -> i32 {
        status::clientbound::PONG
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(PingPacket {
            payload: buffer.read_i64()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer.write_varint(Self::packet_id()).write_i64(self.payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_json_fields() {
        let status = ServerStatus::new("&aHello", 3, 20);
        let packet = StatusResponsePacket::new(&status).unwrap();
        let json: serde_json::Value = serde_json::from_str(&packet.response).unwrap();

        assert_eq!(json["version"]["protocol"], 765);
        assert_eq!(json["version"]["name"], "1.20.4");
        assert_eq!(json["players"]["online"], 3);
        assert_eq!(json["players"]["max"], 20);
        assert_eq!(json["description"]["text"], "§aHello");
    }

    #[test]
    fn test_pong_echoes_payload() {
        let mut buffer = MinecraftPacketBuffer::new();
        PingPacket { payload: 0x1234 }
            .write_to_buffer(&mut buffer)
            .unwrap();

        let mut read = MinecraftPacketBuffer::from_bytes(buffer.buffer);
        assert_eq!(read.read_varint().unwrap(), 0x01);
        assert_eq!(PingPacket::read_from_buffer(&mut read).unwrap().payload, 0x1234);
    }
}
