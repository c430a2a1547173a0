//! HTTP/1.1 request parser: just enough of RFC 9112 to serve the shared-port
//! dispatcher. Only used when the peer did not speak HTTP/2.

use crate::error::Http1Error;
use bytes::{Buf, Bytes, BytesMut};

const MAX_TARGET_LEN: usize = 8 * 1024;
const MAX_HEADER_LEN: usize = 8 * 1024;
const MAX_HEADERS_AGGREGATE: usize = 16 * 1024;
const MAX_HEADER_COUNT: usize = 100;
const MAX_CHUNK_SIZE: usize = 64 * 1024;
const MAX_CHUNK_COUNT: u32 = 1000;

pub(crate) const KNOWN_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "CONNECT", "TRACE",
];

#[derive(Debug, Clone)]
pub struct Http1Request {
    pub method: String,
    pub target: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Accumulates bytes off the wire and yields complete requests.
#[derive(Default)]
pub struct Http1Parser {
    buf: BytesMut,
}

impl Http1Parser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Parses the next request, if the buffer holds one complete already.
    pub fn parse(&mut self, max_body_size: usize) -> Result<Option<Http1Request>, Http1Error> {
        let Some(header_end) = find_subslice(&self.buf, b"\r\n\r\n") else {
            if self.buf.len() > MAX_TARGET_LEN + MAX_HEADERS_AGGREGATE {
                return Err(Http1Error::HeadersTooLarge);
            }
            return Ok(None);
        };

        let head = self.buf[..header_end].to_vec();
        let mut lines = head.split(|&b| b == b'\n').map(strip_cr);

        let request_line = lines.next().ok_or(Http1Error::BadRequestLine)?;
        let (method, target, version) = parse_request_line(request_line)?;

        let mut headers = Vec::new();
        let mut aggregate = 0usize;
        for line in lines {
            if line.is_empty() {
                continue;
            }
            if line.len() > MAX_HEADER_LEN {
                return Err(Http1Error::HeaderTooLong);
            }
            aggregate += line.len();
            if aggregate > MAX_HEADERS_AGGREGATE {
                return Err(Http1Error::HeadersTooLarge);
            }
            if headers.len() >= MAX_HEADER_COUNT {
                return Err(Http1Error::TooManyHeaders);
            }
            let colon = line.iter().position(|&b| b == b':').ok_or(Http1Error::BadHeaderLine)?;
            if colon > 0 && matches!(line[colon - 1], b' ' | b'\t') {
                return Err(Http1Error::WhitespaceBeforeColon);
            }
            let name = std::str::from_utf8(&line[..colon])
                .map_err(|_| Http1Error::BadHeaderLine)?
                .to_ascii_lowercase();
            let value = std::str::from_utf8(&line[colon + 1..])
                .map_err(|_| Http1Error::BadHeaderLine)?
                .trim()
                .to_string();
            headers.push((name, value));
        }

        let body_start = header_end + 4;
        let content_length = headers
            .iter()
            .find(|(n, _)| n == "content-length")
            .map(|(_, v)| v.parse::<usize>().map_err(|_| Http1Error::BadRequestLine))
            .transpose()?;
        let is_chunked = headers
            .iter()
            .any(|(n, v)| n == "transfer-encoding" && v.eq_ignore_ascii_case("chunked"));

        let available_body = &self.buf[body_start..];
        let (body, body_len) = if is_chunked {
            match decode_chunked(available_body, max_body_size)? {
                Some(result) => result,
                None => return Ok(None),
            }
        } else if let Some(len) = content_length {
            if len > max_body_size {
                return Err(Http1Error::BodyTooLarge);
            }
            if available_body.len() < len {
                return Ok(None);
            }
            (available_body[..len].to_vec(), len)
        } else {
            (Vec::new(), 0)
        };

        let total_consumed = body_start + body_len;
        self.buf.advance(total_consumed);

        Ok(Some(Http1Request {
            method,
            target,
            version,
            headers,
            body: Bytes::from(body),
        }))
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    if let Some(stripped) = line.strip_suffix(b"\r") {
        stripped
    } else {
        line
    }
}

fn parse_request_line(line: &[u8]) -> Result<(String, String, String), Http1Error> {
    let s = std::str::from_utf8(line).map_err(|_| Http1Error::BadRequestLine)?;
    let mut parts = s.splitn(3, ' ');
    let method = parts.next().ok_or(Http1Error::BadRequestLine)?;
    let target = parts.next().ok_or(Http1Error::BadRequestLine)?;
    let version = parts.next().ok_or(Http1Error::BadRequestLine)?;

    if !KNOWN_METHODS.contains(&method) {
        return Err(Http1Error::BadRequestLine);
    }
    if target.len() > MAX_TARGET_LEN {
        return Err(Http1Error::TargetTooLong);
    }
    if !is_valid_version(version) {
        return Err(Http1Error::BadVersion);
    }
    Ok((method.to_string(), target.to_string(), version.to_string()))
}

fn is_valid_version(v: &str) -> bool {
    let bytes = v.as_bytes();
    bytes.len() == 8
        && v.starts_with("HTTP/")
        && bytes[5].is_ascii_digit()
        && bytes[6] == b'.'
        && bytes[7].is_ascii_digit()
}

/// Decodes a chunked body. Returns `Ok(None)` if the buffer does not yet
/// contain a complete terminating sequence.
fn decode_chunked(buf: &[u8], max_body_size: usize) -> Result<Option<(Vec<u8>, usize)>, Http1Error> {
    let mut pos = 0;
    let mut body = Vec::new();
    let mut chunk_count: u32 = 0;

    loop {
        let Some(line_len) = find_subslice(&buf[pos..], b"\r\n") else {
            return Ok(None);
        };
        let size_line = &buf[pos..pos + line_len];
        let size_str = size_line.split(|&b| b == b';').next().unwrap_or(size_line);
        let size_str = std::str::from_utf8(size_str).map_err(|_| Http1Error::BadChunkSize)?;
        let size =
            usize::from_str_radix(size_str.trim(), 16).map_err(|_| Http1Error::BadChunkSize)?;
        if size > MAX_CHUNK_SIZE {
            return Err(Http1Error::ChunkTooLarge);
        }
        pos += line_len + 2;

        if size == 0 {
            // Consume an optional trailer section up through the final
            // empty line; a bare CRLF immediately here means no trailers.
            let Some(trailer_end) = find_subslice(&buf[pos..], b"\r\n\r\n") else {
                if find_subslice(&buf[pos..], b"\r\n") == Some(0) {
                    return Ok(Some((body, pos + 2)));
                }
                return Ok(None);
            };
            return Ok(Some((body, pos + trailer_end + 4)));
        }

        chunk_count += 1;
        if chunk_count > MAX_CHUNK_COUNT {
            return Err(Http1Error::TooManyChunks);
        }
        if pos + size + 2 > buf.len() {
            return Ok(None);
        }
        body.extend_from_slice(&buf[pos..pos + size]);
        if body.len() > max_body_size {
            return Err(Http1Error::BodyTooLarge);
        }
        pos += size;
        if &buf[pos..pos + 2] != b"\r\n" {
            return Err(Http1Error::BadChunkTerminator);
        }
        pos += 2;
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_get_with_no_body() {
        let mut parser = Http1Parser::new();
        parser.push(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n");
        let req = parser.parse(1024).unwrap().unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.target, "/index.html");
        assert_eq!(req.headers, vec![("host".to_string(), "example.com".to_string())]);
        assert!(req.body.is_empty());
    }

    #[test]
    fn waits_for_full_headers() {
        let mut parser = Http1Parser::new();
        parser.push(b"GET / HTTP/1.1\r\nHost: ex");
        assert!(parser.parse(1024).unwrap().is_none());
    }

    #[test]
    fn parses_content_length_body() {
        let mut parser = Http1Parser::new();
        parser.push(b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");
        let req = parser.parse(1024).unwrap().unwrap();
        assert_eq!(&req.body[..], b"hello");
    }

    #[test]
    fn waits_for_full_content_length_body() {
        let mut parser = Http1Parser::new();
        parser.push(b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel");
        assert!(parser.parse(1024).unwrap().is_none());
    }

    #[test]
    fn rejects_whitespace_before_colon() {
        let mut parser = Http1Parser::new();
        parser.push(b"GET / HTTP/1.1\r\nHost : example.com\r\n\r\n");
        assert_eq!(parser.parse(1024), Err(Http1Error::WhitespaceBeforeColon));
    }

    #[test]
    fn rejects_unknown_method() {
        let mut parser = Http1Parser::new();
        parser.push(b"FROB / HTTP/1.1\r\n\r\n");
        assert_eq!(parser.parse(1024), Err(Http1Error::BadRequestLine));
    }

    #[test]
    fn decodes_chunked_body() {
        let mut parser = Http1Parser::new();
        parser.push(b"POST /echo HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n");
        parser.push(b"5\r\nhello\r\n0\r\n\r\n");
        let req = parser.parse(1024).unwrap().unwrap();
        assert_eq!(&req.body[..], b"hello");
    }

    #[test]
    fn chunk_over_limit_is_rejected() {
        let mut parser = Http1Parser::new();
        parser.push(b"POST /echo HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n");
        parser.push(b"10001\r\n"); // 0x10001 = 65537 > 64 KiB
        assert_eq!(parser.parse(1 << 20), Err(Http1Error::ChunkTooLarge));
    }
}
