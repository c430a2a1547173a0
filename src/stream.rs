//! Per-stream record and the receive-side state machine.
//! https://httpwg.org/specs/rfc7540.html#StreamStatesLifecycle

use crate::error::ErrorCode;
use crate::types::StreamId;
use bytes::BytesMut;

/// The window ceiling RFC 7540 §6.9 imposes on both directions.
pub const MAX_WINDOW_SIZE: i64 = (1i64 << 31) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    ReservedLocal,
    ReservedRemote,
    Open,
    HalfClosedLocal,
    HalfClosedRemote,
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct Priority {
    pub dep_id: StreamId,
    pub exclusive: bool,
    pub weight: u8,
}

impl Default for Priority {
    fn default() -> Self {
        Self {
            dep_id: 0,
            exclusive: false,
            weight: 15,
        }
    }
}

#[derive(Debug)]
pub struct Stream {
    pub id: StreamId,
    pub state: StreamState,
    pub recv_window: i64,
    pub send_window: i64,
    pub priority: Priority,
    pub header_accum: BytesMut,
    pub body_accum: BytesMut,
    pub headers_map: Vec<(String, String)>,
    pub expected_content_length: Option<u64>,
    pub received_bytes: u64,
    pub received_initial_headers: bool,
    pub received_trailers: bool,
    pub outbound_buffer: bytes::Bytes,
    pub outbound_offset: usize,
    pub outbound_end_stream: bool,
    pub received_end_stream: bool,
    pub sent_end_stream: bool,
}

impl Stream {
    #[must_use]
    pub fn new(id: StreamId, initial_recv_window: i64, initial_send_window: i64) -> Self {
        Self {
            id,
            state: StreamState::Idle,
            recv_window: initial_recv_window,
            send_window: initial_send_window,
            priority: Priority::default(),
            header_accum: BytesMut::new(),
            body_accum: BytesMut::new(),
            headers_map: Vec::new(),
            expected_content_length: None,
            received_bytes: 0,
            received_initial_headers: false,
            received_trailers: false,
            outbound_buffer: bytes::Bytes::new(),
            outbound_offset: 0,
            outbound_end_stream: false,
            received_end_stream: false,
            sent_end_stream: false,
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Applies the receive-side effect of a HEADERS frame. `is_trailer_eligible`
    /// is true when this stream has already received its initial header block,
    /// so a subsequent HEADERS frame is only valid as a trailer block.
    pub fn on_recv_headers(&mut self, end_stream: bool) -> Result<(), ErrorCode> {
        match self.state {
            StreamState::Idle => {
                self.received_initial_headers = true;
                if end_stream {
                    self.received_end_stream = true;
                    self.state = StreamState::HalfClosedRemote;
                } else {
                    self.state = StreamState::Open;
                }
                Ok(())
            }
            StreamState::Open | StreamState::HalfClosedLocal if self.received_initial_headers => {
                if !end_stream {
                    return Err(ErrorCode::ProtocolError);
                }
                self.received_trailers = true;
                self.mark_end_stream_received();
                Ok(())
            }
            StreamState::ReservedRemote => {
                // Unreachable in practice: this server rejects every inbound
                // PUSH_PROMISE as a connection error, so no stream ever
                // enters ReservedRemote. Kept for state-table fidelity.
                self.state = StreamState::HalfClosedLocal;
                Ok(())
            }
            _ => Err(ErrorCode::StreamClosed),
        }
    }

    /// Applies the receive-side effect of a DATA frame's END_STREAM flag.
    /// Caller is responsible for rejecting DATA on a stream that was never
    /// opened (stream-manager lookup miss), which is a connection error.
    pub fn on_recv_data(&mut self, end_stream: bool) -> Result<(), ErrorCode> {
        match self.state {
            StreamState::Open | StreamState::HalfClosedLocal => {
                if end_stream {
                    self.mark_end_stream_received();
                }
                Ok(())
            }
            _ => Err(ErrorCode::StreamClosed),
        }
    }

    pub fn on_recv_rst_stream(&mut self) {
        self.state = StreamState::Closed;
    }

    /// Shared receive-side END_STREAM transition for both DATA and trailer
    /// HEADERS: `Open` becomes `HalfClosedRemote`, `HalfClosedLocal` becomes
    /// `Closed`.
    fn mark_end_stream_received(&mut self) {
        self.received_end_stream = true;
        self.state = match self.state {
            StreamState::HalfClosedLocal => StreamState::Closed,
            _ => StreamState::HalfClosedRemote,
        };
    }

    /// Applies the send-side effect of setting END_STREAM on an outbound
    /// HEADERS or DATA frame.
    pub fn on_send_end_stream(&mut self) {
        self.sent_end_stream = true;
        self.state = match self.state {
            StreamState::Open => StreamState::HalfClosedLocal,
            StreamState::HalfClosedRemote => StreamState::Closed,
            other => other,
        };
    }
}
