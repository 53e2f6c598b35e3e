use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes};
use quarry_common::types::BlockPos;
use quarry_common::{QuarryError, Result};
use quarry_nbt::Tag;
use uuid::Uuid;

/// Longest string the protocol allows, in characters (up to 4 bytes each).
pub const MAX_STRING_LENGTH: usize = 32767;

/// Packet trait. Contains the packet ID and the functions to write and read the packet.
pub trait Packet {
    /// Packet ID
    fn packet_id() -> i32
    where
        Self: Sized;

    /// Reads the packet body. The ID has already been consumed by the dispatcher.
    fn read_from_buffer(_buffer: &mut MinecraftPacketBuffer) -> Result<Self>
    where
        Self: Sized,
    {
        Err(QuarryError::protocol("Client-bound packets are never read"))
    }

    /// Writes the packet ID followed by the body.
    fn write_to_buffer(&self, _buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        Err(QuarryError::protocol("Server-bound packets are never written"))
    }
}

/// Serializes a packet into an unframed `id + body` payload.
pub fn encode_packet<T: Packet>(packet: &T) -> Result<Bytes> {
    let mut buffer = MinecraftPacketBuffer::new();
    packet.write_to_buffer(&mut buffer)?;
    Ok(buffer.into_bytes())
}

/// Number of bytes `value` occupies as a VarInt.
pub fn varint_len(value: i32) -> usize {
    let value = value as u32;
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

/// Minecraft packet buffer. Writes append to `buffer`; reads consume from the cursor.
#[derive(Debug, Default)]
pub struct MinecraftPacketBuffer {
    pub buffer: Vec<u8>,
    cursor: usize,
}

impl MinecraftPacketBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Creates a reader over `bytes` with the cursor at the start.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buffer: bytes,
            cursor: 0,
        }
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes left between the cursor and the end.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.buffer.get(self.cursor).copied()
    }

    fn take(&mut self, count: usize, what: &str) -> Result<&[u8]> {
        if self.remaining() < count {
            return Err(QuarryError::underflow(format!(
                "{} ({} bytes needed, {} left)",
                what,
                count,
                self.remaining()
            )));
        }
        let start = self.cursor;
        self.cursor += count;
        Ok(&self.buffer[start..self.cursor])
    }

    /// Writes a VarInt: 7 bits per byte, least-significant group first,
    /// high bit set on every byte but the last.
    pub fn write_varint(&mut self, value: i32) -> &mut Self {
        let mut value = value as u32;
        while value & !0x7F != 0 {
            self.buffer.put_u8((value & 0x7F) as u8 | 0x80);
            value >>= 7;
        }
        self.buffer.put_u8(value as u8);
        self
    }

    /// Reads a VarInt, failing on a sixth byte rather than truncating.
    pub fn read_varint(&mut self) -> Result<i32> {
        let mut result: u32 = 0;
        for position in 0..5 {
            let byte = self.take(1, "VarInt")?[0];
            result |= ((byte & 0x7F) as u32) << (7 * position);
            if byte & 0x80 == 0 {
                return Ok(result as i32);
            }
        }
        Err(QuarryError::protocol("VarInt is longer than 5 bytes"))
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.buffer.put_u8(value as u8);
        self
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(QuarryError::protocol(format!(
                "Invalid boolean byte {}",
                other
            ))),
        }
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.put_u8(value);
        self
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1, "Unsigned Byte")?[0])
    }

    pub fn write_i8(&mut self, value: i8) -> &mut Self {
        self.buffer.put_i8(value);
        self
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1, "Byte")?[0] as i8)
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.buffer.put_u16(value);
        self
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2, "Unsigned Short")?))
    }

    pub fn write_i16(&mut self, value: i16) -> &mut Self {
        self.buffer.put_i16(value);
        self
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(self.take(2, "Short")?))
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.buffer.put_i32(value);
        self
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4, "Int")?))
    }

    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.buffer.put_i64(value);
        self
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take(8, "Long")?))
    }

    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.buffer.put_f32(value);
        self
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take(4, "Float")?))
    }

    pub fn write_f64(&mut self, value: f64) -> &mut Self {
        self.buffer.put_f64(value);
        self
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take(8, "Double")?))
    }

    /// Writes a string prefixed with its length in bytes.
    pub fn write_string(&mut self, value: &str) -> &mut Self {
        self.write_varint(value.len() as i32);
        self.buffer.put_slice(value.as_bytes());
        self
    }

    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_varint()?;
        let length = usize::try_from(length)
            .map_err(|_| QuarryError::protocol(format!("Negative string length {}", length)))?;
        if length > MAX_STRING_LENGTH * 4 {
            return Err(QuarryError::protocol(format!(
                "String of {} bytes exceeds the protocol limit",
                length
            )));
        }
        let bytes = self.take(length, "String")?.to_vec();
        String::from_utf8(bytes)
            .map_err(|_| QuarryError::protocol("Failed to convert bytes to UTF-8 string"))
    }

    /// Writes a UUID as 16 big-endian bytes.
    pub fn write_uuid(&mut self, value: Uuid) -> &mut Self {
        self.buffer.put_slice(value.as_bytes());
        self
    }

    pub fn read_uuid(&mut self) -> Result<Uuid> {
        let bytes = self.take(16, "UUID")?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(bytes);
        Ok(Uuid::from_bytes(raw))
    }

    /// Packs a block position as `x (26 bits) | z (26 bits) | y (12 bits)`,
    /// most significant first.
    pub fn write_position(&mut self, pos: BlockPos) -> &mut Self {
        self.buffer.put_i64(pack_position(pos));
        self
    }

    pub fn read_position(&mut self) -> Result<BlockPos> {
        Ok(unpack_position(self.read_i64()?))
    }

    /// Writes an angle in 1/256ths of a full turn.
    pub fn write_angle(&mut self, value: u8) -> &mut Self {
        self.buffer.put_u8(value);
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buffer.put_slice(bytes);
        self
    }

    /// Consumes everything after the cursor.
    pub fn read_remaining(&mut self) -> Vec<u8> {
        let rest = self.buffer[self.cursor..].to_vec();
        self.cursor = self.buffer.len();
        rest
    }

    /// Writes raw 64-bit words with no length prefix.
    pub fn write_longs(&mut self, words: &[u64]) -> &mut Self {
        for &word in words {
            self.buffer.put_u64(word);
        }
        self
    }

    /// Writes a BitSet: VarInt word count then the words.
    pub fn write_bitset(&mut self, words: &[u64]) -> &mut Self {
        self.write_varint(words.len() as i32);
        self.write_longs(words)
    }

    /// Writes a tree value in network form (no root name).
    pub fn write_nbt(&mut self, tag: &Tag) -> Result<&mut Self> {
        tag.write_network(&mut self.buffer)?;
        Ok(self)
    }

    pub fn read_nbt(&mut self) -> Result<Tag> {
        let mut rest = &self.buffer[self.cursor..];
        let before = rest.len();
        let tag = Tag::read_network(&mut rest)?;
        self.cursor += before - rest.len();
        Ok(tag)
    }
}

pub fn pack_position(pos: BlockPos) -> i64 {
    ((pos.x as i64 & 0x3FF_FFFF) << 38) | ((pos.z as i64 & 0x3FF_FFFF) << 12) | (pos.y as i64 & 0xFFF)
}

pub fn unpack_position(value: i64) -> BlockPos {
    let x = value >> 38;
    let y = value << 52 >> 52;
    let z = value << 26 >> 38;
    BlockPos::new(x as i32, y as i32, z as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use quarry_nbt::Compound;

    // Helper struct for testing Packet trait
    struct TestPacket {
        value: i32,
    }

    impl Packet for TestPacket {
        fn packet_id() -> i32 {
            0x42
        }

        fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
            buffer.write_varint(Self::packet_id()).write_varint(self.value);
            Ok(())
        }

        fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
            Ok(TestPacket {
                value: buffer.read_varint()?,
            })
        }
    }

    #[test]
    fn test_packet_buffer_from_bytes() {
        let bytes = vec![1, 2, 3];
        let buffer = MinecraftPacketBuffer::from_bytes(bytes.clone());
        assert_eq!(buffer.buffer, bytes);
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(buffer.peek_byte(), Some(1));
        assert_eq!(MinecraftPacketBuffer::new().peek_byte(), None);
    }

    #[test]
    fn test_varint() {
        let test_cases = vec![0, 1, 127, 128, 255, 25565, 2097151, 2147483647, -1, -2147483648];

        for value in test_cases {
            let mut buffer = MinecraftPacketBuffer::new();
            buffer.write_varint(value);
            assert_eq!(buffer.len(), varint_len(value), "length of {}", value);

            let mut read_buffer = MinecraftPacketBuffer::from_bytes(buffer.buffer);
            assert_eq!(read_buffer.read_varint().unwrap(), value);
            assert_eq!(read_buffer.remaining(), 0);
        }
    }

    #[test]
    fn test_varint_known_encodings() {
        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_varint(300);
        assert_eq!(buffer.buffer, vec![0xAC, 0x02]);

        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_varint(-1);
        assert_eq!(buffer.buffer, vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_varint_error_handling() {
        let mut buffer = MinecraftPacketBuffer::from_bytes(vec![0xFF; 6]);
        assert_matches!(buffer.read_varint(), Err(QuarryError::ProtocolError(_)));

        let mut buffer = MinecraftPacketBuffer::from_bytes(vec![0x80]);
        assert_matches!(buffer.read_varint(), Err(QuarryError::Underflow(_)));
    }

    #[test]
    fn test_string() {
        let test_strings = vec!["", "Hello", "Hello, World!", "🦀", "こんにちは"];

        for string in test_strings {
            let mut buffer = MinecraftPacketBuffer::new();
            buffer.write_string(string);
            assert_eq!(buffer.buffer[0] as usize, string.len());

            let mut read_buffer = MinecraftPacketBuffer::from_bytes(buffer.buffer);
            assert_eq!(read_buffer.read_string().unwrap(), string);
        }
    }

    #[test]
    fn test_string_error_handling() {
        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_varint(1);
        buffer.buffer.push(0xFF);
        assert_matches!(buffer.read_string(), Err(QuarryError::ProtocolError(_)));

        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_varint(100);
        buffer.buffer.push(0x41);
        assert_matches!(buffer.read_string(), Err(QuarryError::Underflow(_)));
    }

    #[test]
    fn test_fixed_width_round_trip() {
        let mut buffer = MinecraftPacketBuffer::new();
        buffer
            .write_bool(true)
            .write_i8(-5)
            .write_u16(25565)
            .write_i16(-300)
            .write_i32(i32::MIN)
            .write_i64(-42)
            .write_f32(0.05)
            .write_f64(-12.5);

        let mut read = MinecraftPacketBuffer::from_bytes(buffer.buffer);
        assert!(read.read_bool().unwrap());
        assert_eq!(read.read_i8().unwrap(), -5);
        assert_eq!(read.read_u16().unwrap(), 25565);
        assert_eq!(read.read_i16().unwrap(), -300);
        assert_eq!(read.read_i32().unwrap(), i32::MIN);
        assert_eq!(read.read_i64().unwrap(), -42);
        assert_eq!(read.read_f32().unwrap(), 0.05);
        assert_eq!(read.read_f64().unwrap(), -12.5);
        assert_matches!(read.read_u8(), Err(QuarryError::Underflow(_)));
    }

    #[test]
    fn test_uuid() {
        let uuid = Uuid::new_v3(&Uuid::NAMESPACE_DNS, "wow".as_ref());
        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_uuid(uuid);
        assert_eq!(buffer.len(), 16);

        let mut read_buffer = MinecraftPacketBuffer::from_bytes(buffer.buffer);
        assert_eq!(read_buffer.read_uuid().unwrap(), uuid);

        let mut short = MinecraftPacketBuffer::from_bytes(vec![0; 8]);
        assert_matches!(short.read_uuid(), Err(QuarryError::Underflow(_)));
    }

    #[test]
    fn test_position_boundaries() {
        let max_xz = (1 << 25) - 1;
        let min_xz = -(1 << 25);
        let cases = vec![
            BlockPos::new(0, 0, 0),
            BlockPos::new(5, 10, 5),
            BlockPos::new(-1, -1, -1),
            BlockPos::new(max_xz, 2047, max_xz),
            BlockPos::new(min_xz, -2048, min_xz),
            BlockPos::new(max_xz, -2048, min_xz),
            BlockPos::new(min_xz, 2047, max_xz),
        ];

        for pos in cases {
            let mut buffer = MinecraftPacketBuffer::new();
            buffer.write_position(pos);
            let mut read = MinecraftPacketBuffer::from_bytes(buffer.buffer);
            assert_eq!(read.read_position().unwrap(), pos);
        }
    }

    #[test]
    fn test_position_bit_layout() {
        assert_eq!(pack_position(BlockPos::new(1, 0, 0)), 1 << 38);
        assert_eq!(pack_position(BlockPos::new(0, 0, 1)), 1 << 12);
        assert_eq!(pack_position(BlockPos::new(0, 1, 0)), 1);
        assert_eq!(
            pack_position(BlockPos::new(18357644, 831, -20882616)),
            0x4607632C15B4833F
        );
    }

    #[test]
    fn test_nbt_cursor_advances() {
        let tag = Tag::Compound(Compound::new().with("text", "hello".into()));
        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_nbt(&tag).unwrap();
        buffer.write_bool(true);

        let mut read = MinecraftPacketBuffer::from_bytes(buffer.buffer);
        assert_eq!(read.read_nbt().unwrap(), tag);
        assert!(read.read_bool().unwrap());
    }

    #[test]
    fn test_encode_packet_includes_id() {
        let bytes = encode_packet(&TestPacket { value: 300 }).unwrap();
        assert_eq!(&bytes[..], &[0x42, 0xAC, 0x02]);

        let mut read = MinecraftPacketBuffer::from_bytes(bytes[1..].to_vec());
        assert_eq!(TestPacket::read_from_buffer(&mut read).unwrap().value, 300);
    }
}
