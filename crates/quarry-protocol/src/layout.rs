//! Geometry of the dimension the client is told about.
//!
//! The authoritative world occupies `0..height` vertically. The dimension
//! starts one section lower, at `MIN_Y`, so a boundary floor section sits
//! under the world, and ends with one boundary section above it.

use crate::bit_array::bits_for;
use quarry_common::types::WorldBounds;
use std::ops::RangeInclusive;

pub const SECTION_EDGE: i32 = 16;
pub const MIN_Y: i32 = -SECTION_EDGE;
pub const DIMENSION_TYPE: &str = "minecraft:overworld";
pub const DIMENSION_NAME: &str = "minecraft:overworld";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionLayout {
    bounds: WorldBounds,
}

fn sections_for(blocks: i32) -> i32 {
    (blocks + SECTION_EDGE - 1) / SECTION_EDGE
}

impl DimensionLayout {
    pub fn new(bounds: WorldBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn min_y(&self) -> i32 {
        MIN_Y
    }

    /// World sections plus the boundary section below and above.
    pub fn section_count(&self) -> i32 {
        sections_for(self.bounds.height) + 2
    }

    /// Dimension height in blocks, a multiple of 16.
    pub fn height(&self) -> i32 {
        self.section_count() * SECTION_EDGE
    }

    /// Light data covers one extra section below and above the block sections.
    pub fn light_section_count(&self) -> i32 {
        self.section_count() + 2
    }

    /// Chunk columns streamed along x, including the border column on each side.
    pub fn columns_x(&self) -> RangeInclusive<i32> {
        -1..=sections_for(self.bounds.width)
    }

    pub fn columns_z(&self) -> RangeInclusive<i32> {
        -1..=sections_for(self.bounds.depth)
    }

    pub fn column_count(&self) -> usize {
        self.columns_x().count() * self.columns_z().count()
    }

    /// Width of one packed heightmap entry: `ceil(log2(height + 1))`.
    pub fn heightmap_bits(&self) -> u8 {
        bits_for(self.height() as u64)
    }

    /// Smallest view distance that reaches every streamed column from the
    /// centre of the world, clamped to what the client accepts.
    pub fn view_distance(&self) -> i32 {
        let span = sections_for(self.bounds.width).max(sections_for(self.bounds.depth));
        (span / 2 + 2).clamp(2, 32)
    }
}
