//! An HTTP/2 server (RFC 7540/7541) that also speaks HTTP/1.1 on the same
//! port, dispatching by ALPN under TLS or by preface-sniffing in plaintext.

pub mod cli;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod flags;
pub mod flow;
pub mod frame;
pub mod hpack;
pub mod http1;
pub mod logging;
pub mod mime;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod settings;
pub mod stream;
pub mod stream_manager;
pub mod tls;
pub mod types;

pub use config::{CliOverrides, Config};
pub use error::{ConfigError, Http1Error, Http2Error};
pub use request::Request;
pub use response::Response;
pub use router::{Router, StaticFileRouter};
