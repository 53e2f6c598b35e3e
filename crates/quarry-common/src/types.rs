use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal block identifier, as stored by the world model.
pub type BlockId = u8;

/// Internal block identifiers known to the world model.
pub mod block {
    use super::BlockId;

    pub const AIR: BlockId = 0;
    pub const STONE: BlockId = 1;
    pub const GRASS: BlockId = 2;
    pub const DIRT: BlockId = 3;
    pub const COBBLESTONE: BlockId = 4;
    pub const PLANKS: BlockId = 5;
    pub const SAPLING: BlockId = 6;
    pub const BEDROCK: BlockId = 7;
    pub const FLOWING_WATER: BlockId = 8;
    pub const WATER: BlockId = 9;
    pub const FLOWING_LAVA: BlockId = 10;
    pub const LAVA: BlockId = 11;
    pub const SAND: BlockId = 12;
    pub const GRAVEL: BlockId = 13;
    pub const GOLD_ORE: BlockId = 14;
    pub const IRON_ORE: BlockId = 15;
    pub const COAL_ORE: BlockId = 16;
    pub const LOG: BlockId = 17;
    pub const LEAVES: BlockId = 18;

    /// Highest id the world model can hold.
    pub const MAX: BlockId = LEAVES;

    pub fn is_liquid(id: BlockId) -> bool {
        matches!(id, FLOWING_WATER | WATER | FLOWING_LAVA | LAVA)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Rotation in the protocol's 256-unit angle representation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub yaw: f32,
    pub pitch: f32,
}

impl Rotation {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }
}

/// Extent of the authoritative world, anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
}

impl WorldBounds {
    pub fn new(width: i32, height: i32, depth: i32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        (0..self.width).contains(&pos.x)
            && (0..self.height).contains(&pos.y)
            && (0..self.depth).contains(&pos.z)
    }

    pub fn volume(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpawnPoint {
    pub position: Position,
    pub rotation: Rotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Survival,
    #[default]
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    pub fn id(self) -> u8 {
        match self {
            GameMode::Survival => 0,
            GameMode::Creative => 1,
            GameMode::Adventure => 2,
            GameMode::Spectator => 3,
        }
    }
}

/// Who a session belongs to once authentication has allowed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub uuid: Uuid,
    pub username: String,
    pub entity_id: i32,
}

/// A roster member as another client should see it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub identity: PlayerIdentity,
    pub position: Position,
    pub rotation: Rotation,
}
