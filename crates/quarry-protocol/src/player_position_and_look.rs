use crate::opcodes::play::{clientbound, serverbound};
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::types::{Position, Rotation};
use quarry_common::Result;

/// Stored yaw from client degrees: `((degrees + 180) mod 360) / 360 * 256`.
///
/// The stored value is offset by half a turn from the client's convention,
/// see [`yaw_to_wire`].
pub fn yaw_from_degrees(degrees: f32) -> f32 {
    (degrees + 180.0).rem_euclid(360.0) / 360.0 * 256.0
}

/// Stored pitch from client degrees: `degrees / 360 * 256`.
pub fn pitch_from_degrees(degrees: f32) -> f32 {
    degrees / 360.0 * 256.0
}

/// Wire angle byte for a stored yaw: `(yaw + 128) mod 256`.
pub fn yaw_to_wire(yaw: f32) -> u8 {
    ((yaw + 128.0).rem_euclid(256.0)) as u8
}

pub fn pitch_to_wire(pitch: f32) -> u8 {
    pitch.rem_euclid(256.0) as u8
}

/// Client degrees for a stored yaw.
pub fn yaw_to_degrees(yaw: f32) -> f32 {
    (yaw + 128.0).rem_euclid(256.0) / 256.0 * 360.0
}

pub fn pitch_to_degrees(pitch: f32) -> f32 {
    pitch / 256.0 * 360.0
}

pub fn rotation_from_degrees(yaw: f32, pitch: f32) -> Rotation {
    Rotation::new(yaw_from_degrees(yaw), pitch_from_degrees(pitch))
}

/// Synchronize Player Position: teleports the client's own player.
#[derive(Debug, Clone)]
pub struct PlayerPositionAndLook {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    /// Bit field marking relative fields; 0 for absolute.
    pub flags: u8,
    pub teleport_id: i32,
}

impl PlayerPositionAndLook {
    /// Absolute teleport to `position`, facing the stored `rotation`.
    pub fn new(position: Position, rotation: Rotation, teleport_id: i32) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            yaw: yaw_to_degrees(rotation.yaw),
            pitch: pitch_to_degrees(rotation.pitch),
            flags: 0,
            teleport_id,
        }
    }
}

impl Packet for PlayerPositionAndLook {
    fn packet_id() -> i32 {
        clientbound::SYNCHRONIZE_PLAYER_POSITION
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_f64(self.x)
            .write_f64(self.y)
            .write_f64(self.z)
            .write_f32(self.yaw)
            .write_f32(self.pitch)
            .write_u8(self.flags)
            .write_varint(self.teleport_id);
        Ok(())
    }
}

pub struct ConfirmTeleportPacket {
    pub teleport_id: i32,
}

impl Packet for ConfirmTeleportPacket {
    fn packet_id() -> i32 {
        serverbound::CONFIRM_TELEPORTATION
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(ConfirmTeleportPacket {
            teleport_id: buffer.read_varint()?,
        })
    }
}

/// Set Player Position.
pub struct PlayerPositionPacket {
    pub position: Position,
    pub on_ground: bool,
}

impl Packet for PlayerPositionPacket {
    fn packet_id() -> i32 {
        serverbound::SET_PLAYER_POSITION
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(PlayerPositionPacket {
            position: Position::new(buffer.read_f64()?, buffer.read_f64()?, buffer.read_f64()?),
            on_ground: buffer.read_bool()?,
        })
    }
}

/// Set Player Position and Rotation. Angles are in client degrees.
pub struct PlayerPositionAndRotationPacket {
    pub position: Position,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

impl Packet for PlayerPositionAndRotationPacket {
    fn packet_id() -> i32 {
        serverbound::SET_PLAYER_POSITION_AND_ROTATION
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(PlayerPositionAndRotationPacket {
            position: Position::new(buffer.read_f64()?, buffer.read_f64()?, buffer.read_f64()?),
            yaw: buffer.read_f32()?,
            pitch: buffer.read_f32()?,
            on_ground: buffer.read_bool()?,
        })
    }
}

/// Set Player Rotation. Angles are in client degrees.
pub struct PlayerRotationPacket {
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

impl Packet for PlayerRotationPacket {
    fn packet_id() -> i32 {
        serverbound::SET_PLAYER_ROTATION
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(PlayerRotationPacket {
            yaw: buffer.read_f32()?,
            pitch: buffer.read_f32()?,
            on_ground: buffer.read_bool()?,
        })
    }
}
