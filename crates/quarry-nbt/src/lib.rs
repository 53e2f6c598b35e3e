//! Self-describing tree codec (NBT).
//!
//! Every value carries a one-byte type tag. Compounds write `tag, name,
//! payload` per entry and finish with [`TAG_END`]; lists write the element tag
//! and a count once, then bare payloads. Two framings exist: the *named* form
//! used on disk (root tag, root name, payload) and the *network* form the
//! protocol uses since 1.20.2 (root tag, payload, no root name).

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use quarry_common::{QuarryError, Result};
use std::io::{Read, Write};

pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// Nesting limit for lists and compounds while decoding.
pub const MAX_DEPTH: usize = 512;

/// Elements reserved up front for a length-prefixed payload. Anything past
/// this grows only as bytes actually arrive.
const PREALLOCATE_LIMIT: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// Named entries in insertion order, so encoding is deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `name`, returning the replaced value.
    pub fn insert(&mut self, name: impl Into<String>, tag: Tag) -> Option<Tag> {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, tag)),
            None => {
                self.entries.push((name, tag));
                None
            }
        }
    }

    /// Builder form of [`Compound::insert`].
    pub fn with(mut self, name: impl Into<String>, tag: Tag) -> Self {
        self.insert(name, tag);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, tag)| tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(key, tag)| (key.as_str(), tag))
    }
}

impl From<Compound> for Tag {
    fn from(compound: Compound) -> Self {
        Tag::Compound(compound)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Tag::String(value.to_owned())
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Tag::String(value)
    }
}

impl From<bool> for Tag {
    fn from(value: bool) -> Self {
        Tag::Byte(value as i8)
    }
}

fn malformed(msg: impl Into<String>) -> QuarryError {
    QuarryError::MalformedTree(msg.into())
}

fn read_length<R: Read>(reader: &mut R) -> Result<usize> {
    let length = reader.read_i32::<BigEndian>()?;
    usize::try_from(length).map_err(|_| malformed(format!("negative length {}", length)))
}

fn read_utf<R: Read>(reader: &mut R) -> Result<String> {
    let length = reader.read_u16::<BigEndian>()?;
    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| malformed(format!("invalid UTF-8: {}", e)))
}

fn write_utf<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let length = u16::try_from(value.len())
        .map_err(|_| malformed(format!("string of {} bytes is too long", value.len())))?;
    writer.write_u16::<BigEndian>(length)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

fn write_length<W: Write>(writer: &mut W, length: usize) -> Result<()> {
    let length =
        i32::try_from(length).map_err(|_| malformed(format!("{} elements is too many", length)))?;
    writer.write_i32::<BigEndian>(length)?;
    Ok(())
}

impl Tag {
    pub fn type_id(&self) -> u8 {
        match self {
            Tag::End => TAG_END,
            Tag::Byte(_) => TAG_BYTE,
            Tag::Short(_) => TAG_SHORT,
            Tag::Int(_) => TAG_INT,
            Tag::Long(_) => TAG_LONG,
            Tag::Float(_) => TAG_FLOAT,
            Tag::Double(_) => TAG_DOUBLE,
            Tag::ByteArray(_) => TAG_BYTE_ARRAY,
            Tag::String(_) => TAG_STRING,
            Tag::List(_) => TAG_LIST,
            Tag::Compound(_) => TAG_COMPOUND,
            Tag::IntArray(_) => TAG_INT_ARRAY,
            Tag::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Reads a named root: tag, name, payload.
    pub fn read_named<R: Read>(reader: &mut R) -> Result<(String, Tag)> {
        Self::read_entry(reader, 0)
    }

    /// Writes a named root: tag, name, payload.
    pub fn write_named<W: Write>(&self, writer: &mut W, name: &str) -> Result<()> {
        writer.write_u8(self.type_id())?;
        if !matches!(self, Tag::End) {
            write_utf(writer, name)?;
        }
        self.write_payload(writer)
    }

    /// Reads a network root: tag and payload without a name.
    /// A lone [`TAG_END`] decodes as [`Tag::End`], meaning "no value".
    pub fn read_network<R: Read>(reader: &mut R) -> Result<Tag> {
        let type_id = reader.read_u8()?;
        Self::read_payload(reader, type_id, 0)
    }

    /// Writes a network root: tag and payload without a name.
    pub fn write_network<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.type_id())?;
        self.write_payload(writer)
    }

    fn read_entry<R: Read>(reader: &mut R, depth: usize) -> Result<(String, Tag)> {
        let type_id = reader.read_u8()?;
        if type_id == TAG_END {
            return Ok((String::new(), Tag::End));
        }
        let name = read_utf(reader)?;
        let tag = Self::read_payload(reader, type_id, depth)?;
        Ok((name, tag))
    }

    fn read_payload<R: Read>(reader: &mut R, type_id: u8, depth: usize) -> Result<Tag> {
        if depth > MAX_DEPTH {
            return Err(malformed(format!("nesting deeper than {}", MAX_DEPTH)));
        }

        let tag = match type_id {
            TAG_END => Tag::End,
            TAG_BYTE => Tag::Byte(reader.read_i8()?),
            TAG_SHORT => Tag::Short(reader.read_i16::<BigEndian>()?),
            TAG_INT => Tag::Int(reader.read_i32::<BigEndian>()?),
            TAG_LONG => Tag::Long(reader.read_i64::<BigEndian>()?),
            TAG_FLOAT => Tag::Float(reader.read_f32::<BigEndian>()?),
            TAG_DOUBLE => Tag::Double(reader.read_f64::<BigEndian>()?),
            TAG_BYTE_ARRAY => {
                let length = read_length(reader)?;
                let mut bytes = Vec::with_capacity(length.min(PREALLOCATE_LIMIT));
                let read = (&mut *reader).take(length as u64).read_to_end(&mut bytes)?;
                if read != length {
                    return Err(QuarryError::underflow(format!(
                        "byte array of {} bytes, {} present",
                        length, read
                    )));
                }
                Tag::ByteArray(bytes.into_iter().map(|b| b as i8).collect())
            }
            TAG_STRING => Tag::String(read_utf(reader)?),
            TAG_LIST => {
                let element_type = reader.read_u8()?;
                let length = read_length(reader)?;
                if element_type == TAG_END && length > 0 {
                    return Err(malformed("non-empty list of end tags"));
                }
                let mut list = Vec::with_capacity(length.min(PREALLOCATE_LIMIT));
                for _ in 0..length {
                    list.push(Self::read_payload(reader, element_type, depth + 1)?);
                }
                Tag::List(list)
            }
            TAG_COMPOUND => {
                let mut compound = Compound::new();
                loop {
                    let (name, tag) = Self::read_entry(reader, depth + 1)?;
                    if let Tag::End = tag {
                        break;
                    }
                    compound.insert(name, tag);
                }
                Tag::Compound(compound)
            }
            TAG_INT_ARRAY => {
                let length = read_length(reader)?;
                let mut ints = Vec::with_capacity(length.min(PREALLOCATE_LIMIT));
                for _ in 0..length {
                    ints.push(reader.read_i32::<BigEndian>()?);
                }
                Tag::IntArray(ints)
            }
            TAG_LONG_ARRAY => {
                let length = read_length(reader)?;
                let mut longs = Vec::with_capacity(length.min(PREALLOCATE_LIMIT));
                for _ in 0..length {
                    longs.push(reader.read_i64::<BigEndian>()?);
                }
                Tag::LongArray(longs)
            }
            unknown => return Err(malformed(format!("unknown type tag {}", unknown))),
        };
        Ok(tag)
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Tag::End => {}
            Tag::Byte(v) => writer.write_i8(*v)?,
            Tag::Short(v) => writer.write_i16::<BigEndian>(*v)?,
            Tag::Int(v) => writer.write_i32::<BigEndian>(*v)?,
            Tag::Long(v) => writer.write_i64::<BigEndian>(*v)?,
            Tag::Float(v) => writer.write_f32::<BigEndian>(*v)?,
            Tag::Double(v) => writer.write_f64::<BigEndian>(*v)?,
            Tag::ByteArray(v) => {
                write_length(writer, v.len())?;
                for &b in v {
                    writer.write_i8(b)?;
                }
            }
            Tag::String(v) => write_utf(writer, v)?,
            Tag::List(v) => {
                let element_type = v.first().map_or(TAG_END, Tag::type_id);
                if v.iter().any(|tag| tag.type_id() != element_type) {
                    return Err(malformed("list elements must share one type"));
                }
                writer.write_u8(element_type)?;
                write_length(writer, v.len())?;
                for tag in v {
                    tag.write_payload(writer)?;
                }
            }
            Tag::Compound(v) => {
                for (name, tag) in v.iter() {
                    if let Tag::End = tag {
                        return Err(malformed(format!("end tag stored under {:?}", name)));
                    }
                    tag.write_named(writer, name)?;
                }
                writer.write_u8(TAG_END)?;
            }
            Tag::IntArray(v) => {
                write_length(writer, v.len())?;
                for &i in v {
                    writer.write_i32::<BigEndian>(i)?;
                }
            }
            Tag::LongArray(v) => {
                write_length(writer, v.len())?;
                for &l in v {
                    writer.write_i64::<BigEndian>(l)?;
                }
            }
        }
        Ok(())
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Tag::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Tag::Byte(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Tag::Float(n) => Some(*n),
            _ => None,
        }
    }
}
