use crate::opcodes::play::serverbound;
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::types::BlockPos;
use quarry_common::{QuarryError, Result};

/// Offsets of the neighbouring cell for each face id: -Y, +Y, -Z, +Z, -X, +X.
pub const FACE_OFFSETS: [(i32, i32, i32); 6] = [
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
    (-1, 0, 0),
    (1, 0, 0),
];

/// The cell adjacent to `pos` across `face`.
pub fn adjacent(pos: BlockPos, face: i32) -> Result<BlockPos> {
    let (dx, dy, dz) = usize::try_from(face)
        .ok()
        .and_then(|face| FACE_OFFSETS.get(face))
        .copied()
        .ok_or_else(|| QuarryError::protocol(format!("Unknown block face {}", face)))?;
    Ok(pos.offset(dx, dy, dz))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigStatus {
    Started,
    Cancelled,
    Finished,
    DropItemStack,
    DropItem,
    ShootArrowOrFinishEating,
    SwapItemInHand,
}

impl DigStatus {
    pub fn from_id(id: i32) -> Result<Self> {
        Ok(match id {
            0 => DigStatus::Started,
            1 => DigStatus::Cancelled,
            2 => DigStatus::Finished,
            3 => DigStatus::DropItemStack,
            4 => DigStatus::DropItem,
            5 => DigStatus::ShootArrowOrFinishEating,
            6 => DigStatus::SwapItemInHand,
            other => {
                return Err(QuarryError::protocol(format!(
                    "Unknown player action status {}",
                    other
                )))
            }
        })
    }
}

/// Player Action: digging and item actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerActionPacket {
    pub status: DigStatus,
    pub position: BlockPos,
    pub face: u8,
    pub sequence: i32,
}

impl Packet for PlayerActionPacket {
    fn packet_id() -> i32 {
        serverbound::PLAYER_ACTION
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(PlayerActionPacket {
            status: DigStatus::from_id(buffer.read_varint()?)?,
            position: buffer.read_position()?,
            face: buffer.read_u8()?,
            sequence: buffer.read_varint()?,
        })
    }
}

/// Use Item On: right click against a block face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UseItemOnPacket {
    pub hand: i32,
    pub position: BlockPos,
    pub face: i32,
    pub cursor: (f32, f32, f32),
    pub inside_block: bool,
    pub sequence: i32,
}

impl Packet for UseItemOnPacket {
    fn packet_id() -> i32 {
        serverbound::USE_ITEM_ON
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(UseItemOnPacket {
            hand: buffer.read_varint()?,
            position: buffer.read_position()?,
            face: buffer.read_varint()?,
            cursor: (buffer.read_f32()?, buffer.read_f32()?, buffer.read_f32()?),
            inside_block: buffer.read_bool()?,
            sequence: buffer.read_varint()?,
        })
    }
}
