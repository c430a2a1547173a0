pub type StreamId = u32;

/// https://httpwg.org/specs/rfc7540.html#StreamIdentifiers
pub const MAX_STREAM_ID: u32 = u32::MAX >> 1;

/// Mask that clears the reserved high bit of a stream identifier on receive.
#[must_use]
pub fn mask_stream_id(raw: u32) -> StreamId {
    raw & MAX_STREAM_ID
}

#[must_use]
pub fn is_client_initiated(id: StreamId) -> bool {
    id % 2 == 1
}
