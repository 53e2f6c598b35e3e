use crate::layout::{DIMENSION_NAME, DIMENSION_TYPE};
use crate::opcodes::play::clientbound;
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::types::GameMode;
use quarry_common::Result;

/// Login (play): the first packet of the play phase.
#[derive(Debug, Clone)]
pub struct JoinGamePacket {
    pub entity_id: i32,
    pub is_hardcore: bool,
    pub dimension_names: Vec<String>,
    pub max_players: i32,
    pub view_distance: i32,
    pub simulation_distance: i32,
    pub reduced_debug_info: bool,
    pub enable_respawn_screen: bool,
    pub do_limited_crafting: bool,
    pub dimension_type: String,
    pub dimension_name: String,
    pub hashed_seed: i64,
    pub game_mode: GameMode,
    pub is_debug: bool,
    pub is_flat: bool,
    pub portal_cooldown: i32,
}

impl JoinGamePacket {
    pub fn new(entity_id: i32, game_mode: GameMode, view_distance: i32, simulation_distance: i32) -> Self {
        Self {
            entity_id,
            is_hardcore: false,
            dimension_names: vec![DIMENSION_NAME.to_owned()],
            max_players: 0,
            view_distance,
            simulation_distance,
            reduced_debug_info: false,
            enable_respawn_screen: true,
            do_limited_crafting: false,
            dimension_type: DIMENSION_TYPE.to_owned(),
            dimension_name: DIMENSION_NAME.to_owned(),
            hashed_seed: 0,
            game_mode,
            is_debug: false,
            is_flat: true,
            portal_cooldown: 0,
        }
    }
}

impl Packet for JoinGamePacket {
    fn packet_id() -> i32 {
        clientbound::LOGIN
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_i32(self.entity_id)
            .write_bool(self.is_hardcore)
            .write_varint(self.dimension_names.len() as i32);
        for name in &self.dimension_names {
            buffer.write_string(name);
        }
        buffer
            .write_varint(self.max_players)
            .write_varint(self.view_distance)
            .write_varint(self.simulation_distance)
            .write_bool(self.reduced_debug_info)
            .write_bool(self.enable_respawn_screen)
            .write_bool(self.do_limited_crafting)
            .write_string(&self.dimension_type)
            .write_string(&self.dimension_name)
            .write_i64(self.hashed_seed)
            .write_u8(self.game_mode.id())
            // No previous game mode
            .write_i8(-1)
            .write_bool(self.is_debug)
            .write_bool(self.is_flat)
            // No death location
            .write_bool(false)
            .write_varint(self.portal_cooldown);
        Ok(())
    }
}

/// Respawn: re-enters the dimension, used when a session joins again.
#[derive(Debug, Clone)]
pub struct RespawnPacket {
    pub dimension_type: String,
    pub dimension_name: String,
    pub hashed_seed: i64,
    pub game_mode: GameMode,
    pub is_debug: bool,
    pub is_flat: bool,
    pub portal_cooldown: i32,
    /// Bit 0 keeps attributes, bit 1 keeps metadata.
    pub data_kept: u8,
}

impl RespawnPacket {
    pub fn new(game_mode: GameMode) -> Self {
        Self {
            dimension_type: DIMENSION_TYPE.to_owned(),
            dimension_name: DIMENSION_NAME.to_owned(),
            hashed_seed: 0,
            game_mode,
            is_debug: false,
            is_flat: true,
            portal_cooldown: 0,
            data_kept: 0x03,
        }
    }
}

impl Packet for RespawnPacket {
    fn packet_id() -> i32 {
        clientbound::RESPAWN
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_string(&self.dimension_type)
            .write_string(&self.dimension_name)
            .write_i64(self.hashed_seed)
            .write_u8(self.game_mode.id())
            .write_i8(-1)
            .write_bool(self.is_debug)
            .write_bool(self.is_flat)
            .write_bool(false)
            .write_varint(self.portal_cooldown)
            .write_u8(self.data_kept);
        Ok(())
    }
}
