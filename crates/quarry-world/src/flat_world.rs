use quarry_common::collab::WorldView;
use quarry_common::types::{block, BlockId, BlockPos, Position, Rotation, SpawnPoint, WorldBounds};
use quarry_common::{QuarryError, Result};
use std::sync::{PoisonError, RwLock};

/// A flat world held in memory: bedrock floor, stone, three layers of dirt
/// and a grass surface at half the world's height.
pub struct FlatWorld {
    bounds: WorldBounds,
    blocks: RwLock<Vec<BlockId>>,
    surface: i32,
}

impl FlatWorld {
    /// `seed` is accepted for world files that carry one; flat generation ignores it.
    pub fn generate(bounds: WorldBounds, _seed: i64) -> Self {
        let surface = bounds.height / 2;
        let mut blocks = vec![block::AIR; bounds.volume()];

        for y in 0..bounds.height.min(surface + 1) {
            let layer = match y {
                0 => block::BEDROCK,
                y if y == surface => block::GRASS,
                y if y >= surface - 3 => block::DIRT,
                _ => block::STONE,
            };
            for z in 0..bounds.depth {
                for x in 0..bounds.width {
                    blocks[index(&bounds, BlockPos::new(x, y, z))] = layer;
                }
            }
        }

        Self {
            bounds,
            blocks: RwLock::new(blocks),
            surface,
        }
    }

    /// Height of the grass layer.
    pub fn surface(&self) -> i32 {
        self.surface
    }
}

fn index(bounds: &WorldBounds, pos: BlockPos) -> usize {
    ((pos.y * bounds.depth + pos.z) * bounds.width + pos.x) as usize
}

impl WorldView for FlatWorld {
    fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    fn block_at(&self, pos: BlockPos) -> Option<BlockId> {
        if !self.bounds.contains(pos) {
            return None;
        }
        let blocks = self.blocks.read().unwrap_or_else(PoisonError::into_inner);
        Some(blocks[index(&self.bounds, pos)])
    }

    fn set_block(&self, pos: BlockPos, block: BlockId) -> Result<BlockId> {
        if !self.bounds.contains(pos) {
            return Err(QuarryError::ValidationRejected(format!(
                "{:?} is outside the world",
                pos
            )));
        }
        let mut blocks = self.blocks.write().unwrap_or_else(PoisonError::into_inner);
        let cell = &mut blocks[index(&self.bounds, pos)];
        Ok(std::mem::replace(cell, block))
    }

    fn spawn_point(&self) -> SpawnPoint {
        SpawnPoint {
            position: Position::new(
                self.bounds.width as f64 / 2.0 + 0.5,
                (self.surface + 1) as f64,
                self.bounds.depth as f64 / 2.0 + 0.5,
            ),
            rotation: Rotation::default(),
        }
    }
}
