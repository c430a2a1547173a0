//! TCP accept loop: one `tokio::spawn`ed task per connection, each task the
//! sole owner of its `ConnectionEngine`/HTTP1 state for that socket's life.

use std::sync::Arc;

use crate::config::Config;
use crate::connection::{ConnectionEngine, Limits};
use crate::dispatcher::{self, Decision, PrefaceSniffer, Protocol};
use crate::error::Http2Error;
use crate::http1::{self, Http1Parser};
use crate::response::Response;
use crate::router::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

const READ_CHUNK: usize = 16 * 1024;

pub async fn run(config: Config, router: Arc<dyn Router>, tls: Option<Arc<rustls::ServerConfig>>) -> Result<(), Http2Error> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");

    let acceptor = tls.map(TlsAcceptor::from);
    let limits = Limits {
        max_body_size: config.limits.max_body_size as usize,
    };

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = accepted?;
                let router = Arc::clone(&router);
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(socket, acceptor, router, limits).await {
                        log::warn!("connection {peer} ended: {err}");
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("received shutdown signal, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

async fn handle_connection(
    socket: TcpStream,
    acceptor: Option<TlsAcceptor>,
    router: Arc<dyn Router>,
    limits: Limits,
) -> Result<(), Http2Error> {
    match acceptor {
        Some(acceptor) => {
            let tls_stream = acceptor.accept(socket).await?;
            let alpn = tls_stream.get_ref().1.alpn_protocol().map(<[u8]>::to_vec);
            match dispatcher::from_alpn(alpn.as_deref()) {
                Protocol::Http2 => run_http2(tls_stream, router, limits, Vec::new()).await,
                Protocol::Http1 => run_http1(tls_stream, router, limits).await,
            }
        }
        None => run_plaintext(socket, router, limits).await,
    }
}

async fn run_plaintext(mut socket: TcpStream, router: Arc<dyn Router>, limits: Limits) -> Result<(), Http2Error> {
    let mut sniffer = PrefaceSniffer::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        sniffer.push(&chunk[..n]);
        match sniffer.sniff() {
            Decision::NeedMore => continue,
            Decision::Chosen(Protocol::Http2, prefix) => {
                return run_http2(socket, router, limits, prefix).await;
            }
            Decision::Chosen(Protocol::Http1, prefix) => {
                return run_http1_with_prefix(socket, router, limits, prefix).await;
            }
            Decision::Reject => {
                let goaway = crate::frame::serialize_typed(
                    crate::frame::FrameType::GoAway,
                    0,
                    0,
                    &[0, 0, 0, 0, 0, 0, 0, 1],
                );
                let _ = socket.write_all(&goaway).await;
                return Ok(());
            }
        }
    }
}

async fn run_http2<S>(mut socket: S, router: Arc<dyn Router>, limits: Limits, prefix: Vec<u8>) -> Result<(), Http2Error>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut engine = ConnectionEngine::new(router, limits);
    let initial = engine.start();
    if !initial.is_empty() {
        socket.write_all(&initial).await?;
    }
    if !prefix.is_empty() {
        let out = engine.receive(&prefix);
        if !out.is_empty() {
            socket.write_all(&out).await?;
        }
    }

    let mut chunk = vec![0u8; READ_CHUNK];
    while !engine.is_closed() {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        let out = engine.receive(&chunk[..n]);
        if !out.is_empty() {
            socket.write_all(&out).await?;
        }
    }
    Ok(())
}

async fn run_http1<S>(socket: S, router: Arc<dyn Router>, limits: Limits) -> Result<(), Http2Error>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    run_http1_with_prefix(socket, router, limits, Vec::new()).await
}

async fn run_http1_with_prefix<S>(
    mut socket: S,
    router: Arc<dyn Router>,
    limits: Limits,
    prefix: Vec<u8>,
) -> Result<(), Http2Error>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut parser = Http1Parser::default();
    parser.push(&prefix);
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        loop {
            match parser.parse(limits.max_body_size) {
                Ok(Some(request)) => {
                    let keep_alive = should_keep_alive(&request);
                    let response = route_http1(router.as_ref(), request);
                    let bytes = render_http1_response(&response, keep_alive);
                    socket.write_all(&bytes).await?;
                    if !keep_alive {
                        return Ok(());
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    let response = Response::new(400, bytes::Bytes::from(err.to_string().into_bytes()));
                    let bytes = render_http1_response(&response, false);
                    let _ = socket.write_all(&bytes).await;
                    return Ok(());
                }
            }
        }
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        parser.push(&chunk[..n]);
    }
}

fn should_keep_alive(request: &http1::Http1Request) -> bool {
    let explicit = request
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("connection"))
        .map(|(_, value)| value.eq_ignore_ascii_case("keep-alive"));
    match explicit {
        Some(keep) => keep,
        None => request.version == "HTTP/1.1",
    }
}

fn route_http1(router: &dyn Router, request: http1::Http1Request) -> Response {
    let (path, query) = crate::request::Request::split_path(&request.target);
    let req = crate::request::Request {
        method: request.method,
        path,
        query,
        authority: request
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("host"))
            .map(|(_, v)| v.clone()),
        scheme: "http".to_string(),
        headers: request.headers,
        body: request.body,
    };
    router.route(&req)
}

fn render_http1_response(response: &Response, keep_alive: bool) -> Vec<u8> {
    let reason = reason_phrase(response.status);
    let mut out = format!("HTTP/1.1 {} {}\r\n", response.status, reason).into_bytes();
    for (name, value) in &response.headers {
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    out.extend_from_slice(format!("content-length: {}\r\n", response.body.len()).as_bytes());
    out.extend_from_slice(
        format!("connection: {}\r\n", if keep_alive { "keep-alive" } else { "close" }).as_bytes(),
    );
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&response.body);
    out
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        413 => "Payload Too Large",
        _ => "Unknown",
    }
}
