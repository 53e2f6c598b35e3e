//! Length-prefixed packet framing, with optional zlib compression once the
//! login phase has sent Set Compression.
//!
//! Uncompressed frame: `VarInt length | id + body`.
//! Compressed frame: `VarInt length | VarInt data length | payload`, where a
//! data length of 0 means the payload was sent raw because it was below the
//! threshold.

use crate::packet::varint_len;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use quarry_common::{QuarryError, Result};
use std::io::{Read, Write};
use tokio_util::codec::{Decoder, Encoder};

/// Largest frame accepted from or sent to a client.
pub const MAX_FRAME_LENGTH: usize = quarry_common::config::MAX_PACKET_LENGTH;

/// Decodes the VarInt at the front of `src` without consuming it.
/// `Ok(None)` means more bytes are needed.
fn peek_varint(src: &[u8]) -> Result<Option<(i32, usize)>> {
    let mut value: u32 = 0;
    for (index, &byte) in src.iter().enumerate() {
        if index == 5 {
            return Err(QuarryError::protocol("VarInt frame header is too long"));
        }
        value |= ((byte & 0x7F) as u32) << (7 * index);
        if byte & 0x80 == 0 {
            return Ok(Some((value as i32, index + 1)));
        }
    }
    if src.len() >= 5 {
        return Err(QuarryError::protocol("VarInt frame header is too long"));
    }
    Ok(None)
}

fn put_varint(dst: &mut BytesMut, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7F == 0 {
            dst.put_u8(value as u8);
            return;
        }
        dst.put_u8((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
}

fn checked_length(length: i32) -> Result<usize> {
    let length = usize::try_from(length)
        .map_err(|_| QuarryError::protocol(format!("Negative frame length {}", length)))?;
    if length > MAX_FRAME_LENGTH {
        return Err(QuarryError::protocol(format!(
            "Frame of {} bytes exceeds the {} byte limit",
            length, MAX_FRAME_LENGTH
        )));
    }
    Ok(length)
}

/// Splits the byte stream into packet payloads (`id + body`) and frames
/// outgoing payloads.
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    compression: Option<usize>,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(threshold)` switches to the compressed frame format.
    pub fn set_compression(&mut self, threshold: Option<usize>) {
        self.compression = threshold;
    }

    pub fn compression(&self) -> Option<usize> {
        self.compression
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = QuarryError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>> {
        let Some((length, header)) = peek_varint(src)? else {
            return Ok(None);
        };
        let length = checked_length(length)?;
        if src.len() < header + length {
            src.reserve(header + length - src.len());
            return Ok(None);
        }

        src.advance(header);
        let mut frame = src.split_to(length);

        if self.compression.is_none() {
            return Ok(Some(frame));
        }

        let (data_length, data_header) = peek_varint(&frame)?
            .ok_or_else(|| QuarryError::underflow("compressed frame data length"))?;
        frame.advance(data_header);
        if data_length == 0 {
            return Ok(Some(frame));
        }

        let data_length = checked_length(data_length)?;
        let mut inflated = Vec::with_capacity(data_length);
        ZlibDecoder::new(&frame[..])
            .take(data_length as u64 + 1)
            .read_to_end(&mut inflated)?;
        if inflated.len() != data_length {
            return Err(QuarryError::protocol(format!(
                "Compressed frame inflated to {} bytes, header said {}",
                inflated.len(),
                data_length
            )));
        }
        Ok(Some(BytesMut::from(&inflated[..])))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = QuarryError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<()> {
        checked_length(payload.len() as i32)?;

        match self.compression {
            None => {
                dst.reserve(varint_len(payload.len() as i32) + payload.len());
                put_varint(dst, payload.len() as i32);
                dst.put_slice(&payload);
            }
            Some(threshold) if payload.len() < threshold => {
                // Data length 0: payload follows uncompressed
                put_varint(dst, payload.len() as i32 + 1);
                put_varint(dst, 0);
                dst.put_slice(&payload);
            }
            Some(_) => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&payload)?;
                let compressed = encoder.finish()?;

                let data_length = payload.len() as i32;
                let length = varint_len(data_length) + compressed.len();
                checked_length(length as i32)?;
                put_varint(dst, length as i32);
                put_varint(dst, data_length);
                dst.put_slice(&compressed);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    fn framed(payload: &[u8], compression: Option<usize>) -> BytesMut {
        let mut codec = FrameCodec::new();
        codec.set_compression(compression);
        let mut dst = BytesMut::new();
        codec.encode(Bytes::copy_from_slice(payload), &mut dst).unwrap();
        dst
    }

    #[test]
    fn test_uncompressed_layout() {
        let dst = framed(&[0x00, 0x2A], None);
        assert_eq!(&dst[..], &[0x02, 0x00, 0x2A]);
    }

    #[test]
    fn test_below_threshold_is_raw() {
        let dst = framed(&[0x24, 1, 2, 3], Some(256));
        assert_eq!(&dst[..], &[0x05, 0x00, 0x24, 1, 2, 3]);
    }

    #[test]
    fn test_compressed_frame_decodes() {
        let payload: Vec<u8> = (0..4000).map(|i| (i % 7) as u8).collect();
        let mut dst = framed(&payload, Some(256));
        assert!(dst.len() < payload.len());

        let mut codec = FrameCodec::new();
        codec.set_compression(Some(256));
        let frame = codec.decode(&mut dst).unwrap().unwrap();
        assert_eq!(&frame[..], &payload[..]);
        assert!(dst.is_empty());
    }

    #[test]
    fn test_partial_frame_waits() {
        let mut codec = FrameCodec::new();
        let mut src = BytesMut::from(&[0x03, 0x00][..]);
        assert!(codec.decode(&mut src).unwrap().is_none());
        src.put_slice(&[0x01, 0x02]);
        let frame = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(&frame[..], &[0x00, 0x01, 0x02]);
    }

    #[test]
    fn test_oversize_frame_rejected() {
        let mut codec = FrameCodec::new();
        // 0x7FFFFF: 3-byte VarInt above the limit
        let mut src = BytesMut::from(&[0xFF, 0xFF, 0xFF, 0x03][..]);
        assert_matches!(codec.decode(&mut src), Err(QuarryError::ProtocolError(_)));

        let mut src = BytesMut::from(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01][..]);
        assert_matches!(codec.decode(&mut src), Err(QuarryError::ProtocolError(_)));
    }

    #[tokio::test]
    async fn test_frames_across_reads() {
        let mock = tokio_test::io::Builder::new()
            .read(&[0x02, 0x00])
            .read(&[0x2A, 0x01])
            .read(&[0x07])
            .build();
        let mut reader = FramedRead::new(mock, FrameCodec::new());

        let first = reader.next().await.unwrap().unwrap();
        assert_eq!(&first[..], &[0x00, 0x2A]);
        let second = reader.next().await.unwrap().unwrap();
        assert_eq!(&second[..], &[0x07]);
        assert!(reader.next().await.is_none());
    }
}
