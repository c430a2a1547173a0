//! The HTTP/2 connection engine: preface handshake, frame dispatch loop,
//! header-block reassembly, flow control, and request/response plumbing.
//! https://httpwg.org/specs/rfc7540.html#ConnectionManagement
//!
//! `ConnectionEngine` is a pure byte-in/byte-out state machine with no I/O of
//! its own; `server.rs` pumps socket reads into `receive` and socket writes
//! out of its return value. Keeping it synchronous is what makes the wire
//! scenarios in `tests/scenarios.rs` possible to assert on directly.

use std::sync::Arc;

use crate::error::{ErrorCode, FrameOutcome};
use crate::flags::{DataFlags, HeadersFlags, PingFlags, SettingsFlags};
use crate::flow;
use crate::frame::{self, Frame, FrameParser, FrameType};
use crate::hpack;
use crate::request::Request;
use crate::router::Router;
use crate::settings::{Settings, SettingsParameter};
use crate::stream::Priority;
use crate::stream_manager::StreamManager;
use crate::types::StreamId;
use bytes::Bytes;

pub const PREFACE: &[u8; 24] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

const CONNECTION_SPECIFIC_HEADERS: [&str; 5] =
    ["connection", "keep-alive", "proxy-connection", "transfer-encoding", "upgrade"];

#[derive(Debug)]
struct Continuation {
    stream_id: StreamId,
    is_trailers: bool,
    accumulated_size: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_body_size: usize,
}

pub struct ConnectionEngine {
    router: Arc<dyn Router>,
    limits: Limits,

    preface_buf: Vec<u8>,
    recv_preface_done: bool,

    local_settings: Settings,
    peer_settings: Settings,

    send_conn_window: i64,
    recv_conn_window: i64,

    goaway_sent: bool,
    goaway_received: bool,
    continuation: Option<Continuation>,

    encoder: hpack::Encoder,
    decoder: hpack::Decoder,
    parser: FrameParser,
    streams: StreamManager,

    outbound: Vec<u8>,
    closed: bool,
}

impl ConnectionEngine {
    #[must_use]
    pub fn new(router: Arc<dyn Router>, limits: Limits) -> Self {
        let local_settings = Settings::default();
        let header_table_size = local_settings.get(SettingsParameter::HeaderTableSize) as usize;
        Self {
            router,
            limits,
            preface_buf: Vec::new(),
            recv_preface_done: false,
            local_settings,
            peer_settings: Settings::default(),
            send_conn_window: flow::INITIAL_WINDOW_SIZE,
            recv_conn_window: flow::INITIAL_WINDOW_SIZE,
            goaway_sent: false,
            goaway_received: false,
            continuation: None,
            encoder: hpack::Encoder::new(),
            decoder: hpack::Decoder::new(header_table_size),
            parser: FrameParser::new(),
            streams: StreamManager::new(flow::INITIAL_WINDOW_SIZE, flow::INITIAL_WINDOW_SIZE, 100),
            outbound: Vec::new(),
            closed: false,
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Queues the server's initial SETTINGS frame. Call once, immediately for
    /// ALPN-negotiated h2, or right after preface validation on cleartext.
    pub fn start(&mut self) -> Vec<u8> {
        let payload = self.local_settings.to_wire();
        self.send_frame(FrameType::Settings, 0, 0, &payload);
        self.take_outbound()
    }

    /// Feeds newly read bytes into the engine and returns bytes to write back.
    pub fn receive(&mut self, bytes: &[u8]) -> Vec<u8> {
        if self.closed {
            return Vec::new();
        }
        if !self.recv_preface_done {
            self.preface_buf.extend_from_slice(bytes);
            if self.preface_buf.len() < PREFACE.len() {
                return Vec::new();
            }
            if &self.preface_buf[..PREFACE.len()] != PREFACE {
                self.connection_error(ErrorCode::ProtocolError, "bad connection preface", 0);
                return self.take_outbound();
            }
            self.recv_preface_done = true;
            let remainder = self.preface_buf[PREFACE.len()..].to_vec();
            self.preface_buf.clear();
            self.parser.push(&remainder);
        } else {
            self.parser.push(bytes);
        }

        self.pump_frames();
        self.take_outbound()
    }

    fn take_outbound(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    fn pump_frames(&mut self) {
        loop {
            let max_frame_size = self.local_settings.get(SettingsParameter::MaxFrameSize);
            match self.parser.next(max_frame_size) {
                Ok(Some(frame)) => {
                    let outcome = self.dispatch(frame);
                    if self.apply_outcome(outcome) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    self.connection_error(err.code(), &err.to_string(), 0);
                    break;
                }
            }
        }
    }

    /// Applies a handler's outcome; returns `true` if the connection is now
    /// closed and the dispatch loop should stop.
    fn apply_outcome(&mut self, outcome: FrameOutcome) -> bool {
        match outcome {
            FrameOutcome::Continue => false,
            FrameOutcome::StreamError(id, code) => {
                self.reset_stream(id, code);
                false
            }
            FrameOutcome::ConnectionError(code, msg) => {
                self.connection_error(code, &msg, 0);
                true
            }
        }
    }

    fn dispatch(&mut self, frame: Frame) -> FrameOutcome {
        if let Some(cont) = &self.continuation {
            if !frame.is(FrameType::Continuation) || frame.stream_id != cont.stream_id {
                return FrameOutcome::ConnectionError(
                    ErrorCode::ProtocolError,
                    "expected CONTINUATION to complete the header block".to_string(),
                );
            }
        }

        let Some(ty) = frame.frame_type else {
            return FrameOutcome::Continue;
        };

        match ty {
            FrameType::Headers => self.on_headers(frame),
            FrameType::Continuation => self.on_continuation(frame),
            FrameType::Data => self.on_data(frame),
            FrameType::Settings => self.on_settings(frame),
            FrameType::Ping => self.on_ping(frame),
            FrameType::GoAway => self.on_goaway(frame),
            FrameType::WindowUpdate => self.on_window_update(frame),
            FrameType::Priority => self.on_priority(frame),
            FrameType::RstStream => self.on_rst_stream(frame),
            FrameType::PushPromise => {
                FrameOutcome::ConnectionError(ErrorCode::ProtocolError, "server never accepts PUSH_PROMISE".to_string())
            }
        }
    }

    // ---- HEADERS / CONTINUATION --------------------------------------

    fn on_headers(&mut self, frame: Frame) -> FrameOutcome {
        let id = frame.stream_id;
        let flags = frame.flags;
        let end_headers = flags & HeadersFlags::END_HEADERS.bits() != 0;
        let end_stream = flags & HeadersFlags::END_STREAM.bits() != 0;
        let padded = flags & HeadersFlags::PADDED.bits() != 0;
        let has_priority = flags & HeadersFlags::PRIORITY.bits() != 0;

        let mut payload: &[u8] = &frame.payload;
        if padded {
            payload = match frame::strip_padding(payload) {
                Ok(p) => p,
                Err(code) => return FrameOutcome::ConnectionError(code, "invalid HEADERS padding".to_string()),
            };
        }
        if has_priority {
            let Some((dep, exclusive, weight, rest)) = frame::read_priority(payload) else {
                return FrameOutcome::ConnectionError(ErrorCode::FrameSizeError, "truncated priority block".to_string());
            };
            if dep == id {
                return FrameOutcome::StreamError(id, ErrorCode::ProtocolError);
            }
            self.streams.set_pending_priority(id, Priority { dep_id: dep, exclusive, weight });
            payload = rest;
        }

        let is_new_stream = self.streams.get(id).is_none();
        let is_trailers;
        if is_new_stream {
            if self.streams.is_closed_id(id) {
                return FrameOutcome::StreamError(id, ErrorCode::StreamClosed);
            }
            if self.goaway_received {
                return FrameOutcome::StreamError(id, ErrorCode::RefusedStream);
            }
            let stream = match self.streams.open_client_stream(id) {
                Ok(s) => s,
                Err(ErrorCode::RefusedStream) => return FrameOutcome::StreamError(id, ErrorCode::RefusedStream),
                Err(code) => return FrameOutcome::ConnectionError(code, "invalid new stream".to_string()),
            };
            if let Err(code) = stream.on_recv_headers(end_stream) {
                return FrameOutcome::StreamError(id, code);
            }
            is_trailers = false;
        } else {
            let is_closed = self.streams.get(id).map(crate::stream::Stream::is_closed).unwrap_or(true);
            if is_closed {
                return FrameOutcome::StreamError(id, ErrorCode::StreamClosed);
            }
            is_trailers = true;
            let stream = self.streams.get_mut(id).expect("checked above");
            if let Err(code) = stream.on_recv_headers(end_stream) {
                return FrameOutcome::StreamError(id, code);
            }
        }

        let stream = self.streams.get_mut(id).expect("stream exists");
        stream.header_accum.clear();
        stream.header_accum.extend_from_slice(payload);

        if end_headers {
            self.finish_header_block(id, is_trailers)
        } else {
            self.continuation = Some(Continuation {
                stream_id: id,
                is_trailers,
                accumulated_size: payload.len(),
            });
            FrameOutcome::Continue
        }
    }

    fn on_continuation(&mut self, frame: Frame) -> FrameOutcome {
        let Some(cont) = self.continuation.take() else {
            return FrameOutcome::ConnectionError(ErrorCode::ProtocolError, "unexpected CONTINUATION".to_string());
        };
        let end_headers = frame.flags & crate::flags::ContinuationFlags::END_HEADERS.bits() != 0;
        let max_header_list = self.local_settings.get(SettingsParameter::MaxHeaderListSize) as usize;
        let new_size = cont.accumulated_size + frame.payload.len();
        if new_size > max_header_list {
            return FrameOutcome::ConnectionError(ErrorCode::CompressionError, "header list too large".to_string());
        }

        if let Some(stream) = self.streams.get_mut(cont.stream_id) {
            stream.header_accum.extend_from_slice(&frame.payload);
        }

        if end_headers {
            self.finish_header_block(cont.stream_id, cont.is_trailers)
        } else {
            self.continuation = Some(Continuation {
                stream_id: cont.stream_id,
                is_trailers: cont.is_trailers,
                accumulated_size: new_size,
            });
            FrameOutcome::Continue
        }
    }

    fn finish_header_block(&mut self, id: StreamId, is_trailers: bool) -> FrameOutcome {
        let Some(stream) = self.streams.get_mut(id) else {
            return FrameOutcome::Continue;
        };
        let block = stream.header_accum.split().freeze();

        let headers = match self.decoder.decode_block(&block) {
            Ok(h) => h,
            Err(err) => {
                return FrameOutcome::ConnectionError(ErrorCode::CompressionError, err.to_string());
            }
        };

        let validation = if is_trailers {
            validate_trailer_headers(&headers)
        } else {
            validate_request_headers(&headers)
        };
        if let Err(code) = validation {
            return FrameOutcome::StreamError(id, code);
        }

        let Some(stream) = self.streams.get_mut(id) else {
            return FrameOutcome::Continue;
        };

        if !is_trailers {
            if let Some((_, value)) = headers.iter().find(|(n, _)| n == "content-length") {
                match value.parse::<u64>() {
                    Ok(len) => stream.expected_content_length = Some(len),
                    Err(_) => return FrameOutcome::StreamError(id, ErrorCode::ProtocolError),
                }
            }
            stream.headers_map = headers;
        }

        self.maybe_dispatch(id)
    }

    fn maybe_dispatch(&mut self, id: StreamId) -> FrameOutcome {
        let Some(stream) = self.streams.get(id) else {
            return FrameOutcome::Continue;
        };
        if !stream.received_end_stream {
            return FrameOutcome::Continue;
        }
        if let (Some(expected), received) = (stream.expected_content_length, stream.received_bytes) {
            if received != expected {
                return FrameOutcome::StreamError(id, ErrorCode::ProtocolError);
            }
        }

        let method = header_value(&stream.headers_map, ":method").unwrap_or_default();
        let path_raw = header_value(&stream.headers_map, ":path").unwrap_or_default();
        let scheme = header_value(&stream.headers_map, ":scheme").unwrap_or_default();
        let authority = header_value(&stream.headers_map, ":authority");
        let (path, query) = Request::split_path(&path_raw);
        let headers: Vec<(String, String)> = stream
            .headers_map
            .iter()
            .filter(|(n, _)| !n.starts_with(':'))
            .cloned()
            .collect();
        let body = Bytes::copy_from_slice(&stream.body_accum);

        let request = Request {
            method,
            path,
            query,
            authority,
            scheme,
            headers,
            body,
        };

        self.streams.last_processed_id = self.streams.last_processed_id.max(id);

        let mut response = self.router.route(&request);
        response.strip_connection_specific_headers();
        self.send_response(id, response);
        FrameOutcome::Continue
    }

    fn send_response(&mut self, id: StreamId, response: crate::response::Response) {
        let mut header_list = vec![(":status".to_string(), response.status.to_string())];
        header_list.extend(response.headers);
        let encoded = self.encoder.encode(&header_list);

        let has_body = !response.body.is_empty();
        let flags = if has_body { HeadersFlags::END_HEADERS.bits() } else { HeadersFlags::END_HEADERS.bits() | HeadersFlags::END_STREAM.bits() };
        self.send_frame(FrameType::Headers, flags, id, &encoded);

        if !has_body {
            if let Some(stream) = self.streams.get_mut(id) {
                stream.on_send_end_stream();
            }
            self.streams.retire_closed(id);
            return;
        }

        if let Some(stream) = self.streams.get_mut(id) {
            stream.outbound_buffer = response.body;
            stream.outbound_offset = 0;
            stream.outbound_end_stream = true;
        }
        self.drain_stream(id);
    }

    // ---- DATA ---------------------------------------------------------

    fn on_data(&mut self, frame: Frame) -> FrameOutcome {
        let id = frame.stream_id;
        if id == 0 {
            return FrameOutcome::ConnectionError(ErrorCode::ProtocolError, "DATA on stream 0".to_string());
        }
        let total_len = frame.payload.len() as u32;

        if total_len as i64 > self.recv_conn_window {
            return FrameOutcome::ConnectionError(ErrorCode::FlowControlError, "connection recv window exceeded".to_string());
        }
        flow::debit(&mut self.recv_conn_window, total_len);

        if self.streams.get(id).is_none() {
            if self.streams.is_closed_id(id) {
                return FrameOutcome::StreamError(id, ErrorCode::StreamClosed);
            }
            return FrameOutcome::ConnectionError(ErrorCode::ProtocolError, "DATA on idle stream".to_string());
        }

        let end_stream = frame.flags & DataFlags::END_STREAM.bits() != 0;
        let padded = frame.flags & DataFlags::PADDED.bits() != 0;
        let data: Vec<u8> = if padded {
            match frame::strip_padding(&frame.payload) {
                Ok(p) => p.to_vec(),
                Err(code) => return FrameOutcome::ConnectionError(code, "invalid DATA padding".to_string()),
            }
        } else {
            frame.payload.to_vec()
        };

        let stream = self.streams.get_mut(id).expect("checked above");
        if total_len as i64 > stream.recv_window {
            return FrameOutcome::StreamError(id, ErrorCode::FlowControlError);
        }
        flow::debit(&mut stream.recv_window, total_len);

        if let Err(code) = stream.on_recv_data(end_stream) {
            return FrameOutcome::StreamError(id, code);
        }

        stream.received_bytes += data.len() as u64;
        if let Some(expected) = stream.expected_content_length {
            if stream.received_bytes > expected {
                return FrameOutcome::StreamError(id, ErrorCode::ProtocolError);
            }
        }
        if stream.body_accum.len() + data.len() > self.limits.max_body_size {
            return FrameOutcome::StreamError(id, ErrorCode::RefusedStream);
        }
        stream.body_accum.extend_from_slice(&data);

        // Per-stream and connection windows are both replenished immediately
        // so a long body never stalls waiting on application-paced reads.
        self.recv_conn_window += i64::from(total_len);
        self.send_frame(FrameType::WindowUpdate, 0, 0, &total_len.to_be_bytes());
        if let Some(stream) = self.streams.get_mut(id) {
            stream.recv_window += i64::from(total_len);
        }
        self.send_frame(FrameType::WindowUpdate, 0, id, &total_len.to_be_bytes());

        self.maybe_dispatch(id)
    }

    // ---- SETTINGS -------------------------------------------------------

    fn on_settings(&mut self, frame: Frame) -> FrameOutcome {
        if frame.stream_id != 0 {
            return FrameOutcome::ConnectionError(ErrorCode::ProtocolError, "SETTINGS on non-zero stream".to_string());
        }
        if frame.flags & SettingsFlags::ACK.bits() != 0 {
            return FrameOutcome::Continue;
        }

        let old_initial_window = self.peer_settings.get(SettingsParameter::InitialWindowSize);
        let applied = self.peer_settings.apply_wire(&frame.payload);

        for (param, value) in applied {
            if param == SettingsParameter::InitialWindowSize {
                let mut overflowed = false;
                self.streams.for_each_mut(|s| {
                    if flow::apply_initial_window_delta(&mut s.send_window, old_initial_window, value).is_err() {
                        overflowed = true;
                    }
                });
                if overflowed {
                    return FrameOutcome::ConnectionError(ErrorCode::FlowControlError, "INITIAL_WINDOW_SIZE update overflowed a stream window".to_string());
                }
                self.streams.remote_initial_window = i64::from(value);
            }
            // SETTINGS_HEADER_TABLE_SIZE from the peer bounds *their* encoder,
            // i.e. our own encoder's table use. It says nothing about the
            // table our Decoder enforces, which is sized from our own
            // advertised local_settings and never changes after the handshake.
        }

        self.send_frame(FrameType::Settings, SettingsFlags::ACK.bits(), 0, &[]);
        self.drain_all_streams();
        FrameOutcome::Continue
    }

    // ---- PING / GOAWAY / WINDOW_UPDATE / PRIORITY / RST_STREAM ---------

    fn on_ping(&mut self, frame: Frame) -> FrameOutcome {
        if frame.stream_id != 0 {
            return FrameOutcome::ConnectionError(ErrorCode::ProtocolError, "PING on non-zero stream".to_string());
        }
        if frame.flags & PingFlags::ACK.bits() != 0 {
            return FrameOutcome::Continue;
        }
        self.send_frame(FrameType::Ping, PingFlags::ACK.bits(), 0, &frame.payload);
        FrameOutcome::Continue
    }

    fn on_goaway(&mut self, _frame: Frame) -> FrameOutcome {
        self.goaway_received = true;
        FrameOutcome::Continue
    }

    fn on_window_update(&mut self, frame: Frame) -> FrameOutcome {
        if frame.payload.len() != 4 {
            return FrameOutcome::ConnectionError(ErrorCode::FrameSizeError, "WINDOW_UPDATE must be 4 octets".to_string());
        }
        let raw = u32::from_be_bytes([frame.payload[0], frame.payload[1], frame.payload[2], frame.payload[3]]);
        let increment = raw & 0x7FFF_FFFF;

        if frame.stream_id == 0 {
            if let Err(code) = flow::apply_window_update(&mut self.send_conn_window, increment) {
                return FrameOutcome::ConnectionError(code, "connection WINDOW_UPDATE invalid".to_string());
            }
            self.drain_all_streams();
        } else {
            let id = frame.stream_id;
            if self.streams.get(id).is_none() {
                return FrameOutcome::Continue;
            }
            let stream = self.streams.get_mut(id).expect("checked above");
            if let Err(code) = flow::apply_window_update(&mut stream.send_window, increment) {
                return FrameOutcome::StreamError(id, code);
            }
            self.drain_stream(id);
        }
        FrameOutcome::Continue
    }

    fn on_priority(&mut self, frame: Frame) -> FrameOutcome {
        let Some((dep, exclusive, weight, _)) = frame::read_priority(&frame.payload) else {
            return FrameOutcome::ConnectionError(ErrorCode::FrameSizeError, "truncated PRIORITY frame".to_string());
        };
        let id = frame.stream_id;
        if dep == id {
            return FrameOutcome::StreamError(id, ErrorCode::ProtocolError);
        }
        self.streams.set_pending_priority(id, Priority { dep_id: dep, exclusive, weight });
        FrameOutcome::Continue
    }

    fn on_rst_stream(&mut self, frame: Frame) -> FrameOutcome {
        let id = frame.stream_id;
        if id == 0 {
            return FrameOutcome::ConnectionError(ErrorCode::ProtocolError, "RST_STREAM on stream 0".to_string());
        }
        if self.streams.is_closed_id(id) {
            return FrameOutcome::Continue;
        }
        let Some(stream) = self.streams.get_mut(id) else {
            // RST_STREAM on an idle stream is accepted per the state table:
            // the id is simply marked closed, no error response.
            self.streams.mark_closed(id);
            return FrameOutcome::Continue;
        };
        stream.on_recv_rst_stream();
        self.streams.retire_closed(id);
        FrameOutcome::Continue
    }

    // ---- sender loop ----------------------------------------------------

    fn drain_all_streams(&mut self) {
        for id in self.streams.ids_in_insertion_order() {
            self.drain_stream(id);
        }
    }

    fn drain_stream(&mut self, id: StreamId) {
        let max_frame_size = self.peer_settings.get(SettingsParameter::MaxFrameSize);
        loop {
            let Some(stream) = self.streams.get(id) else { return };
            let remaining = stream.outbound_buffer.len() - stream.outbound_offset;
            if remaining == 0 {
                break;
            }
            let chunk_len = flow::sendable_chunk(stream.send_window, self.send_conn_window, max_frame_size, remaining);
            if chunk_len == 0 {
                break;
            }
            let stream = self.streams.get(id).expect("checked above");
            let chunk = stream.outbound_buffer.slice(stream.outbound_offset..stream.outbound_offset + chunk_len);
            let is_last = stream.outbound_offset + chunk_len == stream.outbound_buffer.len();
            let end_stream = is_last && stream.outbound_end_stream;

            flow::debit(&mut self.send_conn_window, chunk_len as u32);
            let flags = if end_stream { DataFlags::END_STREAM.bits() } else { 0 };
            self.send_frame(FrameType::Data, flags, id, &chunk);

            let stream = self.streams.get_mut(id).expect("checked above");
            flow::debit(&mut stream.send_window, chunk_len as u32);
            stream.outbound_offset += chunk_len;
            if end_stream {
                stream.on_send_end_stream();
            }
        }
        self.streams.retire_closed(id);
    }

    // ---- error paths ------------------------------------------------------

    fn reset_stream(&mut self, id: StreamId, code: ErrorCode) {
        self.send_frame(FrameType::RstStream, 0, id, &code.to_u32().to_be_bytes());
        if let Some(stream) = self.streams.get_mut(id) {
            stream.on_recv_rst_stream();
        }
        self.streams.retire_closed(id);
    }

    fn connection_error(&mut self, code: ErrorCode, debug: &str, last_stream_id: StreamId) {
        if self.goaway_sent {
            return;
        }
        self.goaway_sent = true;
        let last = if last_stream_id == 0 { self.streams.last_processed_id } else { last_stream_id };
        let mut payload = Vec::with_capacity(8 + debug.len());
        payload.extend_from_slice(&last.to_be_bytes());
        payload.extend_from_slice(&code.to_u32().to_be_bytes());
        payload.extend_from_slice(debug.as_bytes());
        self.send_frame(FrameType::GoAway, 0, 0, &payload);
        self.streams.retire_all();
        self.closed = true;
    }

    fn send_frame(&mut self, ty: FrameType, flags: u8, stream_id: StreamId, payload: &[u8]) {
        self.outbound.extend(frame::serialize_typed(ty, flags, stream_id, payload));
    }
}

fn header_value(headers: &[(String, String)], name: &str) -> Option<String> {
    headers.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())
}

fn validate_request_headers(headers: &[(String, String)]) -> Result<(), ErrorCode> {
    let mut seen_regular = false;
    let mut seen_pseudo = std::collections::HashSet::new();
    let mut has_method = false;
    let mut has_scheme = false;
    let mut has_path = false;

    for (name, value) in headers {
        if name != &name.to_ascii_lowercase() {
            return Err(ErrorCode::ProtocolError);
        }
        if name.starts_with(':') {
            if seen_regular {
                return Err(ErrorCode::ProtocolError);
            }
            if !seen_pseudo.insert(name.clone()) {
                return Err(ErrorCode::ProtocolError);
            }
            match name.as_str() {
                ":method" => has_method = true,
                ":scheme" => has_scheme = true,
                ":path" => {
                    if value.is_empty() {
                        return Err(ErrorCode::ProtocolError);
                    }
                    has_path = true;
                }
                ":authority" => {}
                _ => return Err(ErrorCode::ProtocolError),
            }
        } else {
            seen_regular = true;
            if CONNECTION_SPECIFIC_HEADERS.contains(&name.as_str()) {
                return Err(ErrorCode::ProtocolError);
            }
            if name == "te" && value != "trailers" {
                return Err(ErrorCode::ProtocolError);
            }
        }
    }

    if !(has_method && has_scheme && has_path) {
        return Err(ErrorCode::ProtocolError);
    }
    Ok(())
}

fn validate_trailer_headers(headers: &[(String, String)]) -> Result<(), ErrorCode> {
    for (name, _) in headers {
        if name.starts_with(':') {
            return Err(ErrorCode::ProtocolError);
        }
        if name != &name.to_ascii_lowercase() {
            return Err(ErrorCode::ProtocolError);
        }
    }
    Ok(())
}
