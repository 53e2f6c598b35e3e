use crate::opcodes::play::clientbound;
use crate::packet::{MinecraftPacketBuffer, Packet};
use crate::player_position_and_look::{pitch_to_wire, yaw_to_wire};
use quarry_common::types::PlayerSnapshot;
use quarry_common::Result;
use uuid::Uuid;

/// Entity type id of `minecraft:player` in protocol 765.
pub const PLAYER_ENTITY_TYPE: i32 = 124;

/// Spawn Entity. Angles are wire bytes.
#[derive(Debug, Clone)]
pub struct SpawnEntityPacket {
    pub entity_id: i32,
    pub uuid: Uuid,
    pub entity_type: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pitch: u8,
    pub yaw: u8,
    pub head_yaw: u8,
    pub data: i32,
}

impl SpawnEntityPacket {
    pub fn player(player: &PlayerSnapshot) -> Self {
        let yaw = yaw_to_wire(player.rotation.yaw);
        Self {
            entity_id: player.identity.entity_id,
            uuid: player.identity.uuid,
            entity_type: PLAYER_ENTITY_TYPE,
            x: player.position.x,
            y: player.position.y,
            z: player.position.z,
            pitch: pitch_to_wire(player.rotation.pitch),
            yaw,
            head_yaw: yaw,
            data: 0,
        }
    }
}

impl Packet for SpawnEntityPacket {
    fn packet_id() -> i32 {
        clientbound::SPAWN_ENTITY
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.entity_id)
            .write_uuid(self.uuid)
            .write_varint(self.entity_type)
            .write_f64(self.x)
            .write_f64(self.y)
            .write_f64(self.z)
            .write_angle(self.pitch)
            .write_angle(self.yaw)
            .write_angle(self.head_yaw)
            .write_varint(self.data)
            // No velocity
            .write_i16(0)
            .write_i16(0)
            .write_i16(0);
        Ok(())
    }
}

pub struct RemoveEntitiesPacket {
    pub entity_ids: Vec<i32>,
}

impl Packet for RemoveEntitiesPacket {
    fn packet_id() -> i32 {
        clientbound::REMOVE_ENTITIES
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.entity_ids.len() as i32);
        for &entity_id in &self.entity_ids {
            buffer.write_varint(entity_id);
        }
        Ok(())
    }
}

/// Teleport Entity: absolute move of another player's entity.
pub struct TeleportEntityPacket {
    pub entity_id: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: u8,
    pub pitch: u8,
    pub on_ground: bool,
}

impl TeleportEntityPacket {
    pub fn player(player: &PlayerSnapshot) -> Self {
        Self {
            entity_id: player.identity.entity_id,
            x: player.position.x,
            y: player.position.y,
            z: player.position.z,
            yaw: yaw_to_wire(player.rotation.yaw),
            pitch: pitch_to_wire(player.rotation.pitch),
            on_ground: false,
        }
    }
}

impl Packet for TeleportEntityPacket {
    fn packet_id() -> i32 {
        clientbound::TELEPORT_ENTITY
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.entity_id)
            .write_f64(self.x)
            .write_f64(self.y)
            .write_f64(self.z)
            .write_angle(self.yaw)
            .write_angle(self.pitch)
            .write_bool(self.on_ground);
        Ok(())
    }
}

pub struct SetHeadRotationPacket {
    pub entity_id: i32,
    pub head_yaw: u8,
}

impl SetHeadRotationPacket {
    pub fn player(player: &PlayerSnapshot) -> Self {
        Self {
            entity_id: player.identity.entity_id,
            head_yaw: yaw_to_wire(player.rotation.yaw),
        }
    }
}

impl Packet for SetHeadRotationPacket {
    fn packet_id() -> i32 {
        clientbound::SET_HEAD_ROTATION
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.entity_id)
            .write_angle(self.head_yaw);
        Ok(())
    }
}
