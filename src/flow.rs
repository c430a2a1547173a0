//! Dual-level flow control: one connection-scope window plus one window per
//! stream. https://httpwg.org/specs/rfc7540.html#FlowControl

use crate::error::ErrorCode;
use crate::stream::MAX_WINDOW_SIZE;

pub const INITIAL_WINDOW_SIZE: i64 = 65_535;

/// Applies a WINDOW_UPDATE increment to `window`. Rejects a zero increment
/// and rejects any increment that would push the window past 2^31-1.
pub fn apply_window_update(window: &mut i64, increment: u32) -> Result<(), ErrorCode> {
    if increment == 0 {
        return Err(ErrorCode::ProtocolError);
    }
    let updated = *window + i64::from(increment);
    if updated > MAX_WINDOW_SIZE {
        return Err(ErrorCode::FlowControlError);
    }
    *window = updated;
    Ok(())
}

/// Debits `window` by the number of DATA payload octets sent or received
/// (including the pad-length byte and padding, per RFC 7540 §6.9.1).
pub fn debit(window: &mut i64, n: u32) {
    *window -= i64::from(n);
}

/// Applies a SETTINGS_INITIAL_WINDOW_SIZE change to one stream's send
/// window. Returns the error to close the connection with if the shift
/// would overflow `window` past the 2^31-1 ceiling.
pub fn apply_initial_window_delta(window: &mut i64, old: u32, new: u32) -> Result<(), ErrorCode> {
    let delta = i64::from(new) - i64::from(old);
    let updated = *window + delta;
    if updated > MAX_WINDOW_SIZE {
        return Err(ErrorCode::FlowControlError);
    }
    *window = updated;
    Ok(())
}

/// Caps a requested send chunk to what both the stream and the connection
/// window, and the peer's advertised max frame size, currently allow.
#[must_use]
pub fn sendable_chunk(stream_window: i64, conn_window: i64, max_frame_size: u32, available: usize) -> usize {
    if stream_window <= 0 || conn_window <= 0 {
        return 0;
    }
    let window_cap = stream_window.min(conn_window) as u64;
    available
        .min(max_frame_size as usize)
        .min(window_cap as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_increment_is_protocol_error() {
        let mut w = INITIAL_WINDOW_SIZE;
        assert_eq!(apply_window_update(&mut w, 0), Err(ErrorCode::ProtocolError));
    }

    #[test]
    fn increment_past_ceiling_is_flow_control_error() {
        let mut w = MAX_WINDOW_SIZE;
        assert_eq!(apply_window_update(&mut w, 1), Err(ErrorCode::FlowControlError));
    }

    #[test]
    fn increment_applies_cleanly() {
        let mut w = 10;
        apply_window_update(&mut w, 5).unwrap();
        assert_eq!(w, 15);
    }

    #[test]
    fn initial_window_shrink_can_go_negative() {
        let mut w: i64 = 100;
        apply_initial_window_delta(&mut w, 65_535, 0).unwrap();
        assert_eq!(w, 100 - 65_535);
    }

    #[test]
    fn sendable_chunk_is_bounded_by_smallest_constraint() {
        assert_eq!(sendable_chunk(10, 1000, 16_384, 100), 10);
        assert_eq!(sendable_chunk(1000, 5, 16_384, 100), 5);
        assert_eq!(sendable_chunk(1000, 1000, 4, 100), 4);
        assert_eq!(sendable_chunk(1000, 1000, 16_384, 2), 2);
    }

    #[test]
    fn non_positive_window_yields_nothing_sendable() {
        assert_eq!(sendable_chunk(0, 1000, 16_384, 100), 0);
        assert_eq!(sendable_chunk(-5, 1000, 16_384, 100), 0);
    }
}
