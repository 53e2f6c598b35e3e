//! Wire encoding of one 16x16x16 chunk section.
//!
//! Layout: non-air count (Short), block states as a direct paletted
//! container (bits per entry, VarInt word count, words), then a
//! single-valued biome container. Cells are ordered y, then z, then x.

use crate::bit_array::BitArray;
use crate::blocks::{self, BOUNDARY_STATE};
use crate::layout::SECTION_EDGE;
use crate::packet::{varint_len, MinecraftPacketBuffer};
use quarry_common::collab::WorldView;
use quarry_common::types::BlockPos;
use quarry_common::Result;

pub const SECTION_CELLS: usize = 4096;
/// Bits per entry of the direct block palette, wide enough for every 1.20.4 state.
pub const DIRECT_BITS: u8 = 15;
/// Biome written into every section: the first registered biome.
pub const SECTION_BIOME: i32 = 0;

const AIR_STATE: i32 = 0;

/// Index of a cell inside a section.
pub fn cell_index(x: usize, y: usize, z: usize) -> usize {
    (y * 16 + z) * 16 + x
}

/// Block states of one section, captured from a world view.
#[derive(Debug, Clone)]
pub struct Section {
    states: Vec<i32>,
    non_air: i16,
}

impl Section {
    /// Reads the cube whose lowest corner is `origin`. Cells outside the
    /// world's bounds take the boundary state, as do unmapped blocks.
    pub fn capture(world: &dyn WorldView, origin: BlockPos) -> Self {
        let bounds = world.bounds();
        let mut states = vec![BOUNDARY_STATE; SECTION_CELLS];
        let mut non_air = 0;

        for y in 0..SECTION_EDGE {
            for z in 0..SECTION_EDGE {
                for x in 0..SECTION_EDGE {
                    let pos = origin.offset(x, y, z);
                    let state = if bounds.contains(pos) {
                        world
                            .block_at(pos)
                            .map(blocks::state_for)
                            .unwrap_or(BOUNDARY_STATE)
                    } else {
                        BOUNDARY_STATE
                    };
                    if state != AIR_STATE {
                        non_air += 1;
                    }
                    states[cell_index(x as usize, y as usize, z as usize)] = state;
                }
            }
        }

        Self { states, non_air }
    }

    pub fn state(&self, x: usize, y: usize, z: usize) -> i32 {
        self.states[cell_index(x, y, z)]
    }

    pub fn non_air(&self) -> i16 {
        self.non_air
    }

    pub fn encoded_len(&self) -> usize {
        let words = BitArray::word_count(DIRECT_BITS, SECTION_CELLS);
        2 // non-air count
            + 1 + varint_len(words as i32) + words * 8
            // biomes: single value, no data words
            + 1 + varint_len(SECTION_BIOME) + varint_len(0)
    }

    pub fn write_to(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        let mut data = BitArray::new(DIRECT_BITS, SECTION_CELLS)?;
        for (index, &state) in self.states.iter().enumerate() {
            data.pack(index, state as u64)?;
        }

        buffer
            .write_i16(self.non_air)
            .write_u8(DIRECT_BITS)
            .write_varint(data.words().len() as i32)
            .write_longs(data.words())
            .write_u8(0)
            .write_varint(SECTION_BIOME)
            .write_varint(0);
        Ok(())
    }
}

/// Encodes the section whose lowest corner is `(origin_x, origin_y, origin_z)`.
pub fn encode_section(
    world: &dyn WorldView,
    origin_x: i32,
    origin_y: i32,
    origin_z: i32,
) -> Result<Vec<u8>> {
    let section = Section::capture(world, BlockPos::new(origin_x, origin_y, origin_z));
    let mut buffer = MinecraftPacketBuffer::with_capacity(section.encoded_len());
    section.write_to(&mut buffer)?;
    Ok(buffer.buffer)
}

pub fn size_of_encoded_section(section: &Section) -> usize {
    section.encoded_len()
}
