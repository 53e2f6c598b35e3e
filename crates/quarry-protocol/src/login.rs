use crate::opcodes::login;
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::{QuarryError, Result};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct LoginStartPacket {
    pub username: String,
    pub uuid: Uuid,
}

impl Packet for LoginStartPacket {
    fn packet_id() -> i32 {
        login::serverbound::LOGIN_START
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        let username = buffer.read_string()?;
        if username.is_empty() || username.chars().count() > 16 {
            return Err(QuarryError::protocol(format!(
                "Invalid username length {}",
                username.len()
            )));
        }
        Ok(LoginStartPacket {
            username,
            uuid: buffer.read_uuid()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_string(&self.username)
            .write_uuid(self.uuid);
        Ok(())
    }
}

pub struct LoginSuccessPacket {
    pub uuid: Uuid,
    pub username: String,
}

impl Packet for LoginSuccessPacket {
    fn packet_id() -> i32 {
        login::clientbound::LOGIN_SUCCESS
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        let uuid = buffer.read_uuid()?;
        let username = buffer.read_string()?;
        Ok(LoginSuccessPacket { uuid, username })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_uuid(self.uuid)
            .write_string(&self.username)
            // No profile properties in offline mode
            .write_varint(0);
        Ok(())
    }
}

pub struct SetCompressionPacket {
    pub threshold: i32,
}

impl Packet for SetCompressionPacket {
    fn packet_id() -> i32 {
        login::clientbound::SET_COMPRESSION
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.threshold);
        Ok(())
    }
}

/// Login-phase disconnect. Unlike the later phases the reason is JSON text.
pub struct LoginDisconnectPacket {
    pub reason: String,
}

impl LoginDisconnectPacket {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: serde_json::json!({ "text": reason }).to_string(),
        }
    }
}

impl Packet for LoginDisconnectPacket {
    fn packet_id() -> i32 {
        login::clientbound::DISCONNECT
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        let reason = buffer.read_string()?;
        Ok(LoginDisconnectPacket { reason })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_string(&self.reason);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_login_start_round_trip() {
        let uuid = Uuid::new_v3(&Uuid::NAMESPACE_DNS, b"OfflinePlayer:Steve");
        let mut buffer = MinecraftPacketBuffer::new();
        LoginStartPacket {
            username: "Steve".to_owned(),
            uuid,
        }
        .write_to_buffer(&mut buffer)
        .unwrap();

        let mut read = MinecraftPacketBuffer::from_bytes(buffer.buffer);
        assert_eq!(read.read_varint().unwrap(), 0x00);
        let packet = LoginStartPacket::read_from_buffer(&mut read).unwrap();
        assert_eq!(packet.username, "Steve");
        assert_eq!(packet.uuid, uuid);
    }

    #[test]
    fn test_login_start_rejects_long_names() {
        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_string("ThisNameIsFarTooLong").write_uuid(Uuid::nil());
        assert_matches!(
            LoginStartPacket::read_from_buffer(&mut buffer),
            Err(QuarryError::ProtocolError(_))
        );
    }

    #[test]
    fn test_login_success_layout() {
        let uuid = Uuid::from_u128(1);
        let mut buffer = MinecraftPacketBuffer::new();
        LoginSuccessPacket {
            uuid,
            username: "Alex".to_owned(),
        }
        .write_to_buffer(&mut buffer)
        .unwrap();

        let mut read = MinecraftPacketBuffer::from_bytes(buffer.buffer);
        assert_eq!(read.read_varint().unwrap(), 0x02);
        let packet = LoginSuccessPacket::read_from_buffer(&mut read).unwrap();
        assert_eq!(packet.uuid, uuid);
        assert_eq!(packet.username, "Alex");
        assert_eq!(read.read_varint().unwrap(), 0);
        assert_eq!(read.remaining(), 0);
    }

    #[test]
    fn test_login_disconnect_is_json() {
        let packet = LoginDisconnectPacket::new("Banned \"here\"");
        let json: serde_json::Value = serde_json::from_str(&packet.reason).unwrap();
        assert_eq!(json["text"], "Banned \"here\"");
    }
}
