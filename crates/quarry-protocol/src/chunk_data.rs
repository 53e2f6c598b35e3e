use crate::bit_array::BitArray;
use crate::layout::{DimensionLayout, SECTION_EDGE};
use crate::opcodes::play::clientbound;
use crate::packet::{MinecraftPacketBuffer, Packet};
use crate::section::Section;
use quarry_common::collab::WorldView;
use quarry_common::types::BlockPos;
use quarry_common::Result;
use quarry_nbt::{Compound, Tag};

const LIGHT_ARRAY_LEN: usize = 2048;

/// Light masks and arrays trailing a chunk packet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightData {
    pub sky_light_mask: Vec<u64>,
    pub block_light_mask: Vec<u64>,
    pub empty_sky_light_mask: Vec<u64>,
    pub empty_block_light_mask: Vec<u64>,
    pub sky_light: Vec<Vec<u8>>,
    pub block_light: Vec<Vec<u8>>,
}

impl LightData {
    /// Full sky light in every light section.
    pub fn full_bright(light_sections: usize) -> Self {
        let mut mask = vec![0u64; light_sections.div_ceil(64)];
        for section in 0..light_sections {
            mask[section / 64] |= 1 << (section % 64);
        }
        Self {
            sky_light_mask: mask,
            sky_light: vec![vec![0xFF; LIGHT_ARRAY_LEN]; light_sections],
            ..Self::default()
        }
    }

    /// No light arrays at all; the client computes nothing and renders dark.
    pub fn empty() -> Self {
        Self::default()
    }

    fn write_to(&self, buffer: &mut MinecraftPacketBuffer) {
        buffer
            .write_bitset(&self.sky_light_mask)
            .write_bitset(&self.block_light_mask)
            .write_bitset(&self.empty_sky_light_mask)
            .write_bitset(&self.empty_block_light_mask);

        for arrays in [&self.sky_light, &self.block_light] {
            buffer.write_varint(arrays.len() as i32);
            for array in arrays.iter() {
                buffer.write_varint(array.len() as i32).write_bytes(array);
            }
        }
    }
}

/// Chunk Data and Update Light: one full column of sections.
#[derive(Debug, Clone)]
pub struct ChunkDataPacket {
    pub chunk_x: i32,
    pub chunk_z: i32,
    /// MOTION_BLOCKING heightmap words.
    pub heightmap: Vec<u64>,
    /// Concatenated encoded sections, bottom-up.
    pub data: Vec<u8>,
    pub light: LightData,
}

impl ChunkDataPacket {
    /// Captures the column at `(chunk_x, chunk_z)`, including the boundary
    /// section below and above the world.
    pub fn build(
        world: &dyn WorldView,
        layout: &DimensionLayout,
        chunk_x: i32,
        chunk_z: i32,
        full_bright: bool,
    ) -> Result<Self> {
        let sections: Vec<Section> = (0..layout.section_count())
            .map(|index| {
                let origin = BlockPos::new(
                    chunk_x * SECTION_EDGE,
                    layout.min_y() + index * SECTION_EDGE,
                    chunk_z * SECTION_EDGE,
                );
                Section::capture(world, origin)
            })
            .collect();

        let heightmap = motion_blocking(&sections, layout)?;

        let size: usize = sections.iter().map(Section::encoded_len).sum();
        let mut data = MinecraftPacketBuffer::with_capacity(size);
        for section in &sections {
            section.write_to(&mut data)?;
        }

        let light = if full_bright {
            LightData::full_bright(layout.light_section_count() as usize)
        } else {
            LightData::empty()
        };

        Ok(Self {
            chunk_x,
            chunk_z,
            heightmap,
            data: data.buffer,
            light,
        })
    }
}

/// One entry per column (index `z * 16 + x`): one above the highest non-air
/// cell, counted from the bottom of the dimension, or 0 for an empty column.
fn motion_blocking(sections: &[Section], layout: &DimensionLayout) -> Result<Vec<u64>> {
    let mut heightmap = BitArray::new(layout.heightmap_bits(), 256)?;
    for z in 0..16 {
        for x in 0..16 {
            let top = sections.iter().enumerate().rev().find_map(|(index, section)| {
                (0..16)
                    .rev()
                    .find(|&y| section.state(x, y, z) != 0)
                    .map(|y| index * 16 + y + 1)
            });
            heightmap.pack(z * 16 + x, top.unwrap_or(0) as u64)?;
        }
    }
    Ok(heightmap.into_words())
}

impl Packet for ChunkDataPacket {
    fn packet_id() -> i32 {
        clientbound::CHUNK_DATA_AND_LIGHT
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        let heightmaps = Tag::Compound(Compound::new().with(
            "MOTION_BLOCKING",
            Tag::LongArray(self.heightmap.iter().map(|&word| word as i64).collect()),
        ));

        buffer
            .write_varint(Self::packet_id())
            .write_i32(self.chunk_x)
            .write_i32(self.chunk_z)
            .write_nbt(&heightmaps)?
            .write_varint(self.data.len() as i32)
            .write_bytes(&self.data)
            // No block entities
            .write_varint(0);
        self.light.write_to(buffer);
        Ok(())
    }
}

pub struct ChunkBatchStartPacket;

impl Packet for ChunkBatchStartPacket {
    fn packet_id() -> i32 {
        clientbound::CHUNK_BATCH_START
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer.write_varint(Self::packet_id());
        Ok(())
    }
}

pub struct ChunkBatchFinishedPacket {
    pub batch_size: i32,
}

impl Packet for ChunkBatchFinishedPacket {
    fn packet_id() -> i32 {
        clientbound::CHUNK_BATCH_FINISHED
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_varint(self.batch_size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BOUNDARY_STATE;
    use quarry_common::types::{block, BlockId, SpawnPoint, WorldBounds};
    use quarry_common::QuarryError;

    /// Stone up to y = 3, air above.
    struct Slab;

    impl WorldView for Slab {
        fn bounds(&self) -> WorldBounds {
            WorldBounds::new(16, 16, 16)
        }

        fn block_at(&self, pos: BlockPos) -> Option<BlockId> {
            if !self.bounds().contains(pos) {
                return None;
            }
            Some(if pos.y <= 3 { block::STONE } else { block::AIR })
        }

        fn set_block(&self, _pos: BlockPos, _block: BlockId) -> Result<BlockId> {
            Err(QuarryError::ValidationRejected("read only".to_owned()))
        }

        fn spawn_point(&self) -> SpawnPoint {
            SpawnPoint::default()
        }
    }

    fn layout() -> DimensionLayout {
        DimensionLayout::new(WorldBounds::new(16, 16, 16))
    }

    #[test]
    fn test_inner_column() {
        let layout = layout();
        let packet = ChunkDataPacket::build(&Slab, &layout, 0, 0, true).unwrap();

        assert_eq!(packet.data.len(), 3 * 8200);
        // 6-bit entries, 10 per word
        assert_eq!(packet.heightmap.len(), 26);
        // Boundary on top, so every column reaches the dimension ceiling
        let first = packet.heightmap[0] & 0x3F;
        assert_eq!(first, layout.height() as u64);
    }

    #[test]
    fn test_border_column_is_boundary() {
        let packet = ChunkDataPacket::build(&Slab, &layout(), -1, 0, true).unwrap();
        let mut reader = MinecraftPacketBuffer::from_bytes(packet.data);
        assert_eq!(reader.read_i16().unwrap(), 4096);
        assert_eq!(reader.read_u8().unwrap(), 15);
        assert_eq!(reader.read_varint().unwrap(), 1024);
        let word = reader.read_i64().unwrap() as u64;
        assert_eq!(word & 0x7FFF, BOUNDARY_STATE as u64);
    }

    #[test]
    fn test_full_bright_light() {
        let light = LightData::full_bright(5);
        assert_eq!(light.sky_light_mask, vec![0b11111]);
        assert_eq!(light.sky_light.len(), 5);
        assert!(light.sky_light.iter().all(|a| a.len() == 2048 && a[0] == 0xFF));
        assert!(light.block_light.is_empty());
    }

    #[test]
    fn test_packet_layout() {
        let packet = ChunkDataPacket::build(&Slab, &layout(), 1, -1, false).unwrap();
        let mut buffer = MinecraftPacketBuffer::new();
        packet.write_to_buffer(&mut buffer).unwrap();

        let mut read = MinecraftPacketBuffer::from_bytes(buffer.buffer);
        assert_eq!(read.read_varint().unwrap(), 0x25);
        assert_eq!(read.read_i32().unwrap(), 1);
        assert_eq!(read.read_i32().unwrap(), -1);
        let heightmaps = read.read_nbt().unwrap();
        let motion = heightmaps.as_compound().unwrap().get("MOTION_BLOCKING").unwrap();
        assert_eq!(motion, &Tag::LongArray(packet.heightmap.iter().map(|&w| w as i64).collect()));
        assert_eq!(read.read_varint().unwrap() as usize, packet.data.len());
        read.read_remaining();
    }

    #[test]
    fn test_tallest_valid_column_fits_one_frame() {
        use crate::frame::{FrameCodec, MAX_FRAME_LENGTH};
        use bytes::BytesMut;
        use quarry_common::config::WorldConfig;
        use tokio_util::codec::Encoder;

        struct Tall;
        impl WorldView for Tall {
            fn bounds(&self) -> WorldBounds {
                WorldBounds::new(16, 202 * 16, 16)
            }
            fn block_at(&self, pos: BlockPos) -> Option<BlockId> {
                self.bounds().contains(pos).then_some(block::STONE)
            }
            fn set_block(&self, _pos: BlockPos, _block: BlockId) -> Result<BlockId> {
                Ok(block::AIR)
            }
            fn spawn_point(&self) -> SpawnPoint {
                SpawnPoint::default()
            }
        }

        let config = WorldConfig {
            width: 16,
            height: 202 * 16,
            depth: 16,
            seed: 0,
        };
        let layout = DimensionLayout::new(config.bounds());
        let packet = ChunkDataPacket::build(&Tall, &layout, 0, 0, true).unwrap();
        let payload = crate::packet::encode_packet(&packet).unwrap();

        assert!(payload.len() <= config.column_packet_len(true));
        assert!(payload.len() <= MAX_FRAME_LENGTH);
        let mut frame = BytesMut::new();
        FrameCodec::new().encode(payload, &mut frame).unwrap();
    }

    #[test]
    fn test_heightmap_counts_from_dimension_floor() {
        struct Floor;
        impl WorldView for Floor {
            fn bounds(&self) -> WorldBounds {
                WorldBounds::new(16, 16, 16)
            }
            fn block_at(&self, pos: BlockPos) -> Option<BlockId> {
                Some(if pos.y == 0 { block::STONE } else { block::AIR })
            }
            fn set_block(&self, _pos: BlockPos, _block: BlockId) -> Result<BlockId> {
                Ok(block::AIR)
            }
            fn spawn_point(&self) -> SpawnPoint {
                SpawnPoint::default()
            }
        }

        // Only the world section, without the boundary sections around it
        let section = Section::capture(&Floor, BlockPos::new(0, 0, 0));
        let heightmap = motion_blocking(&[section], &layout()).unwrap();
        assert_eq!(heightmap[0] & 0x3F, 1);
    }
}
