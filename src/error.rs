use crate::types::StreamId;

/// https://httpwg.org/specs/rfc7540.html#ErrorCodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    NoError = 0x0,
    ProtocolError = 0x1,
    InternalError = 0x2,
    FlowControlError = 0x3,
    SettingsTimeout = 0x4,
    StreamClosed = 0x5,
    FrameSizeError = 0x6,
    RefusedStream = 0x7,
    Cancel = 0x8,
    CompressionError = 0x9,
    ConnectError = 0xa,
    EnhanceYourCalm = 0xb,
    InadequateSecurity = 0xc,
    Http11Required = 0xd,
}

impl ErrorCode {
    #[must_use]
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub fn from_u32(value: u32) -> Self {
        match value {
            0x0 => Self::NoError,
            0x1 => Self::ProtocolError,
            0x2 => Self::InternalError,
            0x3 => Self::FlowControlError,
            0x4 => Self::SettingsTimeout,
            0x5 => Self::StreamClosed,
            0x6 => Self::FrameSizeError,
            0x7 => Self::RefusedStream,
            0x8 => Self::Cancel,
            0x9 => Self::CompressionError,
            0xa => Self::ConnectError,
            0xb => Self::EnhanceYourCalm,
            0xc => Self::InadequateSecurity,
            0xd => Self::Http11Required,
            // Unknown error codes are mapped to INTERNAL_ERROR rather than rejected;
            // RFC 7540 only requires treating them as opaque.
            _ => Self::InternalError,
        }
    }
}

/// Outcome of processing a single inbound frame. The dispatch loop in
/// `connection` translates this into outbound RST_STREAM/GOAWAY frames.
#[derive(Debug)]
pub enum FrameOutcome {
    Continue,
    StreamError(StreamId, ErrorCode),
    ConnectionError(ErrorCode, String),
}

#[derive(thiserror::Error, Debug)]
pub enum Http2Error {
    #[error("stream {0} error: {1:?}")]
    Stream(StreamId, ErrorCode),
    #[error("connection error {0:?}: {1}")]
    Connection(ErrorCode, String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Http2Error {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Connection(ErrorCode::ProtocolError, msg.into())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Http1Error {
    #[error("request line malformed")]
    BadRequestLine,
    #[error("unsupported HTTP version")]
    BadVersion,
    #[error("request target exceeds limit")]
    TargetTooLong,
    #[error("header line malformed")]
    BadHeaderLine,
    #[error("header field exceeds per-header limit")]
    HeaderTooLong,
    #[error("aggregate header size exceeds limit")]
    HeadersTooLarge,
    #[error("too many header fields")]
    TooManyHeaders,
    #[error("whitespace is not permitted before ':'")]
    WhitespaceBeforeColon,
    #[error("invalid chunk size")]
    BadChunkSize,
    #[error("chunk exceeds per-chunk limit")]
    ChunkTooLarge,
    #[error("too many chunks")]
    TooManyChunks,
    #[error("body exceeds configured limit")]
    BodyTooLarge,
    #[error("malformed chunk terminator")]
    BadChunkTerminator,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}
