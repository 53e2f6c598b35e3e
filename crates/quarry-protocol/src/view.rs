//! View hints, game events, spawn position and abilities.

use crate::opcodes::play::clientbound;
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::types::{BlockPos, GameMode};
use quarry_common::Result;

/// Game event telling the client to wait for level chunks before leaving the loading screen.
pub const START_WAITING_FOR_CHUNKS: u8 = 13;

pub struct SetCenterChunkPacket {
    pub chunk_x: i32,
    pub chunk_z: i32,
}

impl Packet for SetCenterChunkPacket {
    fn packet_id() -> i32 {
        clientbound::SET_CENTER_CHUNK
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.chunk_x)
            .write_varint(self.chunk_z);
        Ok(())
    }
}

pub struct SetRenderDistancePacket {
    pub view_distance: i32,
}

impl Packet for SetRenderDistancePacket {
    fn packet_id() -> i32 {
        clientbound::SET_RENDER_DISTANCE
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.view_distance);
        Ok(())
    }
}

pub struct SetSimulationDistancePacket {
    pub simulation_distance: i32,
}

impl Packet for SetSimulationDistancePacket {
    fn packet_id() -> i32 {
        clientbound::SET_SIMULATION_DISTANCE
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.simulation_distance);
        Ok(())
    }
}

pub struct GameEventPacket {
    pub event: u8,
    pub value: f32,
}

impl Packet for GameEventPacket {
    fn packet_id() -> i32 {
        clientbound::GAME_EVENT
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_u8(self.event)
            .write_f32(self.value);
        Ok(())
    }
}

/// Set Default Spawn Position: where the compass points.
pub struct SetDefaultSpawnPositionPacket {
    pub position: BlockPos,
    pub angle: f32,
}

impl Packet for SetDefaultSpawnPositionPacket {
    fn packet_id() -> i32 {
        clientbound::SET_DEFAULT_SPAWN_POSITION
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_position(self.position)
            .write_f32(self.angle);
        Ok(())
    }
}

pub const INVULNERABLE: u8 = 0x01;
pub const FLYING: u8 = 0x02;
pub const ALLOW_FLYING: u8 = 0x04;
pub const CREATIVE_MODE: u8 = 0x08;

pub struct PlayerAbilitiesPacket {
    pub flags: u8,
    pub flying_speed: f32,
    pub field_of_view_modifier: f32,
}

impl PlayerAbilitiesPacket {
    pub fn for_game_mode(game_mode: GameMode) -> Self {
        let flags = match game_mode {
            GameMode::Creative => INVULNERABLE | ALLOW_FLYING | CREATIVE_MODE,
            GameMode::Spectator => INVULNERABLE | FLYING | ALLOW_FLYING,
            GameMode::Survival | GameMode::Adventure => 0,
        };
        Self {
            flags,
            flying_speed: 0.05,
            field_of_view_modifier: 0.1,
        }
    }
}

impl Packet for PlayerAbilitiesPacket {
    fn packet_id() -> i32 {
        clientbound::PLAYER_ABILITIES
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_u8(self.flags)
            .write_f32(self.flying_speed)
            .write_f32(self.field_of_view_modifier);
        Ok(())
    }
}
