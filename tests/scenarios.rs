//! End-to-end wire scenarios driving `ConnectionEngine` purely through its
//! public byte-in/byte-out API, one scenario per accepted trace.

use std::sync::Arc;

use bytes::Bytes;
use h2srv::connection::{ConnectionEngine, Limits, PREFACE};
use h2srv::flags::{DataFlags, HeadersFlags, SettingsFlags};
use h2srv::frame::{self, FrameParser, FrameType};
use h2srv::hpack;
use h2srv::request::Request;
use h2srv::response::Response;
use h2srv::router::Router;

struct OkRouter;
impl Router for OkRouter {
    fn route(&self, _request: &Request) -> Response {
        Response::new(200, Bytes::new())
    }
}

struct EchoRouter;
impl Router for EchoRouter {
    fn route(&self, request: &Request) -> Response {
        Response::new(200, request.body.clone())
    }
}

struct FixedBodyRouter(&'static [u8]);
impl Router for FixedBodyRouter {
    fn route(&self, _request: &Request) -> Response {
        Response::new(200, Bytes::from_static(self.0))
    }
}

fn engine(router: Arc<dyn Router>) -> ConnectionEngine {
    ConnectionEngine::new(router, Limits { max_body_size: 1 << 20 })
}

fn request_headers_block(extra: &[(&str, &str)]) -> Vec<u8> {
    let enc = hpack::Encoder::new();
    let mut headers = vec![
        (":method".to_string(), "GET".to_string()),
        (":scheme".to_string(), "http".to_string()),
        (":path".to_string(), "/".to_string()),
        (":authority".to_string(), "x".to_string()),
    ];
    for (k, v) in extra {
        headers.push((k.to_string(), v.to_string()));
    }
    enc.encode(&headers)
}

fn collect_frames(bytes: &[u8]) -> Vec<frame::Frame> {
    let mut parser = FrameParser::new();
    parser.push(bytes);
    let mut frames = Vec::new();
    while let Some(f) = parser.next(1 << 20).unwrap() {
        frames.push(f);
    }
    frames
}

#[test]
fn scenario_1_preface_and_settings_exchange() {
    let mut eng = engine(Arc::new(OkRouter));
    let mut out = eng.start();

    let frames = collect_frames(&out);
    assert_eq!(frames.len(), 1);
    assert!(frames[0].is(FrameType::Settings));
    assert_eq!(frames[0].flags & SettingsFlags::ACK.bits(), 0);

    let mut input = PREFACE.to_vec();
    input.extend(frame::serialize_typed(FrameType::Settings, 0, 0, &[]));
    out.extend(eng.receive(&input));

    let all = collect_frames(&out);
    assert!(all.iter().any(|f| f.is(FrameType::Settings) && f.flags & SettingsFlags::ACK.bits() != 0));
}

#[test]
fn scenario_2_get_via_headers() {
    let mut eng = engine(Arc::new(OkRouter));
    let _ = eng.start();
    let mut input = PREFACE.to_vec();
    input.extend(frame::serialize_typed(FrameType::Settings, 0, 0, &[]));
    let block = request_headers_block(&[]);
    input.extend(frame::serialize_typed(
        FrameType::Headers,
        HeadersFlags::END_HEADERS.bits() | HeadersFlags::END_STREAM.bits(),
        1,
        &block,
    ));
    let out = eng.receive(&input);

    let frames = collect_frames(&out);
    let response = frames
        .iter()
        .find(|f| f.is(FrameType::Headers) && f.stream_id == 1)
        .expect("response HEADERS");
    assert_ne!(response.flags & HeadersFlags::END_STREAM.bits(), 0);

    let mut decoder = hpack::Decoder::new(4096);
    let headers = decoder.decode_block(&response.payload).unwrap();
    assert!(headers.iter().any(|(n, v)| n == ":status" && v == "200"));
}

#[test]
fn scenario_3_echo_post() {
    let mut eng = engine(Arc::new(EchoRouter));
    let _ = eng.start();
    let mut input = PREFACE.to_vec();
    input.extend(frame::serialize_typed(FrameType::Settings, 0, 0, &[]));
    let block = request_headers_block(&[("content-length", "5")]);
    input.extend(frame::serialize_typed(FrameType::Headers, HeadersFlags::END_HEADERS.bits(), 1, &block));
    input.extend(frame::serialize_typed(FrameType::Data, DataFlags::END_STREAM.bits(), 1, b"hello"));
    let out = eng.receive(&input);

    let frames = collect_frames(&out);
    let response_headers = frames
        .iter()
        .find(|f| f.is(FrameType::Headers) && f.stream_id == 1)
        .expect("response HEADERS");
    assert_eq!(response_headers.flags & HeadersFlags::END_STREAM.bits(), 0);

    let data = frames.iter().find(|f| f.is(FrameType::Data)).expect("response DATA");
    assert_eq!(&data.payload[..], b"hello");
    assert_ne!(data.flags & DataFlags::END_STREAM.bits(), 0);
}

#[test]
fn scenario_4_continuation_atomicity_violation() {
    let mut eng = engine(Arc::new(OkRouter));
    let _ = eng.start();
    let mut input = PREFACE.to_vec();
    input.extend(frame::serialize_typed(FrameType::Settings, 0, 0, &[]));
    let block = request_headers_block(&[]);
    input.extend(frame::serialize_typed(FrameType::Headers, 0, 1, &block));
    input.extend(frame::serialize_typed(FrameType::Data, 0, 1, b"x"));
    let out = eng.receive(&input);

    let frames = collect_frames(&out);
    assert!(frames.iter().any(|f| f.is(FrameType::GoAway)));
    assert!(eng.is_closed());
}

#[test]
fn scenario_5_content_length_mismatch() {
    let mut eng = engine(Arc::new(OkRouter));
    let _ = eng.start();
    let mut input = PREFACE.to_vec();
    input.extend(frame::serialize_typed(FrameType::Settings, 0, 0, &[]));
    let block = request_headers_block(&[("content-length", "10")]);
    input.extend(frame::serialize_typed(FrameType::Headers, HeadersFlags::END_HEADERS.bits(), 1, &block));
    input.extend(frame::serialize_typed(FrameType::Data, DataFlags::END_STREAM.bits(), 1, b"hi"));
    let out = eng.receive(&input);

    let frames = collect_frames(&out);
    assert!(frames.iter().any(|f| f.is(FrameType::RstStream) && f.stream_id == 1));
    assert!(!frames.iter().any(|f| f.is(FrameType::GoAway)));
    assert!(!eng.is_closed());
}

#[test]
fn scenario_6_flow_control_interleave() {
    let mut eng = engine(Arc::new(FixedBodyRouter(b"abc")));
    let _ = eng.start();

    let mut input = PREFACE.to_vec();
    // Tell the server our receive window starts at 1 octet, before opening
    // any stream, so the new stream inherits it as its send_window ceiling.
    let mut settings_payload = Vec::new();
    settings_payload.extend_from_slice(&4u16.to_be_bytes()); // INITIAL_WINDOW_SIZE
    settings_payload.extend_from_slice(&1u32.to_be_bytes());
    input.extend(frame::serialize_typed(FrameType::Settings, 0, 0, &settings_payload));
    let block = request_headers_block(&[]);
    input.extend(frame::serialize_typed(
        FrameType::Headers,
        HeadersFlags::END_HEADERS.bits() | HeadersFlags::END_STREAM.bits(),
        1,
        &block,
    ));
    let out = eng.receive(&input);
    let frames = collect_frames(&out);

    let response_headers = frames
        .iter()
        .find(|f| f.is(FrameType::Headers) && f.stream_id == 1)
        .expect("response HEADERS");
    assert_eq!(response_headers.flags & HeadersFlags::END_STREAM.bits(), 0);

    let data_frames: Vec<_> = frames.iter().filter(|f| f.is(FrameType::Data)).collect();
    assert_eq!(data_frames.len(), 1);
    assert_eq!(&data_frames[0].payload[..], b"a");
    assert_eq!(data_frames[0].flags & DataFlags::END_STREAM.bits(), 0);

    // +1 on the stream window: exactly one more byte is sendable.
    let window_update = frame::serialize_typed(FrameType::WindowUpdate, 0, 1, &1u32.to_be_bytes());
    let out = eng.receive(&window_update);
    let frames = collect_frames(&out);
    let data_frames: Vec<_> = frames.iter().filter(|f| f.is(FrameType::Data)).collect();
    assert_eq!(data_frames.len(), 1);
    assert_eq!(&data_frames[0].payload[..], b"b");
    assert_eq!(data_frames[0].flags & DataFlags::END_STREAM.bits(), 0);

    let window_update = frame::serialize_typed(FrameType::WindowUpdate, 0, 1, &1u32.to_be_bytes());
    let out = eng.receive(&window_update);
    let frames = collect_frames(&out);
    let data_frames: Vec<_> = frames.iter().filter(|f| f.is(FrameType::Data)).collect();
    assert_eq!(data_frames.len(), 1);
    assert_eq!(&data_frames[0].payload[..], b"c");
    assert_ne!(data_frames[0].flags & DataFlags::END_STREAM.bits(), 0);
}
