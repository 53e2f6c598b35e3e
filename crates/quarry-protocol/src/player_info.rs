use crate::chat::text_component;
use crate::opcodes::play::clientbound;
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::types::{GameMode, PlayerIdentity};
use quarry_common::Result;
use uuid::Uuid;

pub const ADD_PLAYER: u8 = 0x01;
pub const INITIALIZE_CHAT: u8 = 0x02;
pub const UPDATE_GAME_MODE: u8 = 0x04;
pub const UPDATE_LISTED: u8 = 0x08;
pub const UPDATE_LATENCY: u8 = 0x10;

/// One row of a Player Info Update.
#[derive(Debug, Clone)]
pub struct PlayerInfoEntry {
    pub uuid: Uuid,
    pub username: String,
    pub game_mode: GameMode,
    pub listed: bool,
    pub latency: i32,
}

impl PlayerInfoEntry {
    pub fn new(identity: &PlayerIdentity, game_mode: GameMode) -> Self {
        Self {
            uuid: identity.uuid,
            username: identity.username.clone(),
            game_mode,
            listed: true,
            latency: 0,
        }
    }
}

/// Player Info Update. Each entry carries a field per action bit, in bit order.
#[derive(Debug, Clone)]
pub struct PlayerInfoUpdatePacket {
    pub actions: u8,
    pub entries: Vec<PlayerInfoEntry>,
}

impl PlayerInfoUpdatePacket {
    /// Adds players to the tab list with their game mode.
    pub fn add(entries: Vec<PlayerInfoEntry>) -> Self {
        Self {
            actions: ADD_PLAYER | UPDATE_GAME_MODE | UPDATE_LISTED | UPDATE_LATENCY,
            entries,
        }
    }
}

impl Packet for PlayerInfoUpdatePacket {
    fn packet_id() -> i32 {
        clientbound::PLAYER_INFO_UPDATE
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_u8(self.actions)
            .write_varint(self.entries.len() as i32);

        for entry in &self.entries {
            buffer.write_uuid(entry.uuid);
            if self.actions & ADD_PLAYER != 0 {
                // Name, then no profile properties
                buffer.write_string(&entry.username).write_varint(0);
            }
            if self.actions & INITIALIZE_CHAT != 0 {
                buffer.write_bool(false);
            }
            if self.actions & UPDATE_GAME_MODE != 0 {
                buffer.write_varint(entry.game_mode.id() as i32);
            }
            if self.actions & UPDATE_LISTED != 0 {
                buffer.write_bool(entry.listed);
            }
            if self.actions & UPDATE_LATENCY != 0 {
                buffer.write_varint(entry.latency);
            }
        }
        Ok(())
    }
}

pub struct PlayerInfoRemovePacket {
    pub uuids: Vec<Uuid>,
}

impl Packet for PlayerInfoRemovePacket {
    fn packet_id() -> i32 {
        clientbound::PLAYER_INFO_REMOVE
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.uuids.len() as i32);
        for &uuid in &self.uuids {
            buffer.write_uuid(uuid);
        }
        Ok(())
    }
}

/// Set Tab List Header And Footer.
pub struct TabListPacket {
    pub header: String,
    pub footer: String,
}

impl Packet for TabListPacket {
    fn packet_id() -> i32 {
        clientbound::TAB_LIST_HEADER_FOOTER
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_nbt(&text_component(&self.header))?
            .write_nbt(&text_component(&self.footer))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_player_layout() {
        let identity = PlayerIdentity {
            uuid: Uuid::from_u128(7),
            username: "Alex".to_owned(),
            entity_id: 3,
        };
        let mut buffer = MinecraftPacketBuffer::new();
        PlayerInfoUpdatePacket::add(vec![PlayerInfoEntry::new(&identity, GameMode::Creative)])
            .write_to_buffer(&mut buffer)
            .unwrap();

        let mut read = MinecraftPacketBuffer::from_bytes(buffer.buffer);
        assert_eq!(read.read_varint().unwrap(), 0x3C);
        assert_eq!(read.read_u8().unwrap(), 0x1D);
        assert_eq!(read.read_varint().unwrap(), 1);
        assert_eq!(read.read_uuid().unwrap(), Uuid::from_u128(7));
        assert_eq!(read.read_string().unwrap(), "Alex");
        assert_eq!(read.read_varint().unwrap(), 0);
        assert_eq!(read.read_varint().unwrap(), 1);
        assert!(read.read_bool().unwrap());
        assert_eq!(read.read_varint().unwrap(), 0);
        assert_eq!(read.remaining(), 0);
    }

    #[test]
    fn test_remove_layout() {
        let mut buffer = MinecraftPacketBuffer::new();
        PlayerInfoRemovePacket {
            uuids: vec![Uuid::from_u128(1), Uuid::from_u128(2)],
        }
        .write_to_buffer(&mut buffer)
        .unwrap();
        assert_eq!(buffer.len(), 2 + 32);
        assert_eq!(&buffer.buffer[..2], &[0x3B, 2]);
    }
}
