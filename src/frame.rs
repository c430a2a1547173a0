//! Frame codec: the 9-octet frame header plus per-type payload rules.
//! https://httpwg.org/specs/rfc7540.html#FrameHeader

use crate::error::ErrorCode;
use crate::types::{mask_stream_id, StreamId};
use bytes::{Bytes, BytesMut};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// The absolute ceiling for a 24-bit frame length field.
pub const ABSOLUTE_MAX_FRAME_SIZE: u32 = (1 << 24) - 1;
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;

/// https://httpwg.org/specs/rfc7540.html#FrameTypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum FrameType {
    Data = 0x0,
    Headers = 0x1,
    Priority = 0x2,
    RstStream = 0x3,
    Settings = 0x4,
    PushPromise = 0x5,
    Ping = 0x6,
    GoAway = 0x7,
    WindowUpdate = 0x8,
    Continuation = 0x9,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub raw_type: u8,
    /// `None` for a frame type this endpoint does not recognize; such frames
    /// are parsed (so the stream of bytes stays in sync) but never dispatched.
    pub frame_type: Option<FrameType>,
    pub flags: u8,
    pub stream_id: StreamId,
    pub payload: Bytes,
}

impl Frame {
    #[must_use]
    pub fn is(&self, ty: FrameType) -> bool {
        self.frame_type == Some(ty)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("frame length {0} exceeds the advertised SETTINGS_MAX_FRAME_SIZE")]
    TooLarge(u32),
    #[error("{0:?} frame had invalid payload size {1}")]
    InvalidSize(FrameType, u32),
}

impl FrameError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        ErrorCode::FrameSizeError
    }
}

/// Accumulates bytes read off the wire and yields complete frames.
/// Non-blocking: `next` returns `Ok(None)` when more bytes are needed.
#[derive(Default)]
pub struct FrameParser {
    buf: BytesMut,
}

impl FrameParser {
    #[must_use]
    pub fn new() -> Self {
        Self { buf: BytesMut::new() }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Parses the next complete frame out of the buffer, if any.
    pub fn next(&mut self, max_frame_size: u32) -> Result<Option<Frame>, FrameError> {
        if self.buf.len() < 9 {
            return Ok(None);
        }
        let length = u32::from_be_bytes([0, self.buf[0], self.buf[1], self.buf[2]]);
        if length > max_frame_size {
            return Err(FrameError::TooLarge(length));
        }
        let total = 9 + length as usize;
        if self.buf.len() < total {
            return Ok(None);
        }

        let raw_type = self.buf[3];
        let flags = self.buf[4];
        let stream_id = mask_stream_id(u32::from_be_bytes([
            self.buf[5], self.buf[6], self.buf[7], self.buf[8],
        ]));

        let frame_type = FrameType::from_u8(raw_type);
        if let Some(ty) = frame_type {
            validate_size(ty, length)?;
        }

        let mut whole = self.buf.split_to(total);
        let payload = whole.split_off(9).freeze();

        Ok(Some(Frame {
            raw_type,
            frame_type,
            flags,
            stream_id,
            payload,
        }))
    }
}

fn validate_size(ty: FrameType, length: u32) -> Result<(), FrameError> {
    let ok = match ty {
        FrameType::Priority => length == 5,
        FrameType::RstStream => length == 4,
        FrameType::Settings => length % 6 == 0,
        FrameType::Ping => length == 8,
        FrameType::GoAway => length >= 8,
        FrameType::WindowUpdate => length == 4,
        FrameType::Data | FrameType::Headers | FrameType::PushPromise | FrameType::Continuation => {
            true
        }
    };
    if ok {
        Ok(())
    } else {
        Err(FrameError::InvalidSize(ty, length))
    }
}

/// Serializes one frame header + payload with a cleared reserved bit and a
/// correct 24-bit length.
#[must_use]
pub fn serialize(frame_type: u8, flags: u8, stream_id: StreamId, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(9 + payload.len());
    let len = payload.len() as u32;
    out.extend_from_slice(&len.to_be_bytes()[1..]);
    out.push(frame_type);
    out.push(flags);
    out.extend_from_slice(&(stream_id & crate::types::MAX_STREAM_ID).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

#[must_use]
pub fn serialize_typed(frame_type: FrameType, flags: u8, stream_id: StreamId, payload: &[u8]) -> Vec<u8> {
    serialize(frame_type as u8, flags, stream_id, payload)
}

/// Wraps `payload` with a 1-byte pad-length prefix and that many zero octets,
/// as DATA/HEADERS/PUSH_PROMISE framing requires when the PADDED flag is set.
#[must_use]
pub fn pad(payload: &[u8], pad_len: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len() + pad_len as usize);
    out.push(pad_len);
    out.extend_from_slice(payload);
    out.extend(std::iter::repeat(0u8).take(pad_len as usize));
    out
}

/// Strips padding from a DATA/HEADERS/PUSH_PROMISE payload. Returns the
/// unpadded remainder. `pad_length >= payload.len()` (after removing the
/// pad-length byte itself) is a PROTOCOL_ERROR.
pub fn strip_padding(payload: &[u8]) -> Result<&[u8], ErrorCode> {
    if payload.is_empty() {
        return Err(ErrorCode::ProtocolError);
    }
    let pad_len = payload[0] as usize;
    if pad_len >= payload.len() {
        return Err(ErrorCode::ProtocolError);
    }
    let rest = &payload[1..];
    Ok(&rest[..rest.len() - pad_len])
}

/// Reads the 5-byte priority block (E bit + 31-bit stream dependency + 1
/// byte weight) that prefixes a HEADERS frame's header-block fragment when
/// the PRIORITY flag is set.
#[must_use]
pub fn read_priority(buf: &[u8]) -> Option<(StreamId, bool, u8, &[u8])> {
    if buf.len() < 5 {
        return None;
    }
    let raw = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let exclusive = raw & 0x8000_0000 != 0;
    let dep = mask_stream_id(raw);
    let weight = buf[4];
    Some((dep, exclusive, weight, &buf[5..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_data_frame() {
        let bytes = serialize_typed(FrameType::Data, 0x1, 3, b"hello");
        let mut parser = FrameParser::new();
        parser.push(&bytes);
        let frame = parser.next(DEFAULT_MAX_FRAME_SIZE).unwrap().unwrap();
        assert_eq!(frame.frame_type, Some(FrameType::Data));
        assert_eq!(frame.flags, 0x1);
        assert_eq!(frame.stream_id, 3);
        assert_eq!(&frame.payload[..], b"hello");
    }

    #[test]
    fn reserved_bit_is_masked_on_read() {
        let mut bytes = serialize_typed(FrameType::Ping, 0, 0, &[0u8; 8]);
        // Set stream id bytes with the reserved high bit on.
        bytes[5] |= 0x80;
        let mut parser = FrameParser::new();
        parser.push(&bytes);
        let frame = parser.next(DEFAULT_MAX_FRAME_SIZE).unwrap().unwrap();
        assert_eq!(frame.stream_id, 0);
    }

    #[test]
    fn needs_more_until_full_frame_present() {
        let bytes = serialize_typed(FrameType::Settings, 0, 0, &[0u8; 6]);
        let mut parser = FrameParser::new();
        parser.push(&bytes[..5]);
        assert!(parser.next(DEFAULT_MAX_FRAME_SIZE).unwrap().is_none());
        parser.push(&bytes[5..]);
        assert!(parser.next(DEFAULT_MAX_FRAME_SIZE).unwrap().is_some());
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut parser = FrameParser::new();
        let payload = vec![0u8; 100];
        let bytes = serialize_typed(FrameType::Data, 0, 1, &payload);
        parser.push(&bytes);
        assert!(matches!(parser.next(50), Err(FrameError::TooLarge(100))));
    }

    #[test]
    fn settings_size_must_be_multiple_of_six() {
        let bytes = serialize_typed(FrameType::Settings, 0, 0, &[0u8; 5]);
        let mut parser = FrameParser::new();
        parser.push(&bytes);
        assert!(matches!(
            parser.next(DEFAULT_MAX_FRAME_SIZE),
            Err(FrameError::InvalidSize(FrameType::Settings, 5))
        ));
    }

    #[test]
    fn unknown_type_skips_size_checks_and_is_discarded() {
        let bytes = serialize(0xFF, 0, 0, &[1, 2, 3]);
        let mut parser = FrameParser::new();
        parser.push(&bytes);
        let frame = parser.next(DEFAULT_MAX_FRAME_SIZE).unwrap().unwrap();
        assert_eq!(frame.frame_type, None);
        assert_eq!(frame.raw_type, 0xFF);
    }

    #[test]
    fn padding_strip_rejects_overlong_pad() {
        let payload = [3u8, b'h', b'i']; // pad_len=3 but only 2 bytes follow
        assert_eq!(strip_padding(&payload), Err(ErrorCode::ProtocolError));
    }

    #[test]
    fn padding_strip_happy_path() {
        let payload = pad(b"hi", 3);
        assert_eq!(strip_padding(&payload).unwrap(), b"hi");
    }
}
