//! Selects HTTP/2 vs HTTP/1.1 on a shared listening port.
//! https://httpwg.org/specs/rfc7540.html#discover-prior-knowledge

use crate::connection::PREFACE;
use crate::http1::KNOWN_METHODS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http2,
    Http1,
}

/// Reads an ALPN negotiation result straight into a protocol choice. `None`
/// (no ALPN extension, or a TLS library that didn't negotiate one of our two
/// advertised protocols) defaults to HTTP/1.1, same as plaintext with no
/// preface.
#[must_use]
pub fn from_alpn(protocol: Option<&[u8]>) -> Protocol {
    match protocol {
        Some(b"h2") => Protocol::Http2,
        _ => Protocol::Http1,
    }
}

#[derive(Debug)]
pub enum Decision {
    /// Not enough bytes yet to tell; keep buffering.
    NeedMore,
    /// Protocol determined; the accumulated prefix (which may include the
    /// full connection preface) must be replayed into that engine.
    Chosen(Protocol, Vec<u8>),
    /// Neither a known HTTP/1.1 method nor the HTTP/2 preface: the 24-byte
    /// prefix is garbage and the connection should be closed.
    Reject,
}

/// Buffers a plaintext connection's opening bytes until it can tell whether
/// the peer is speaking HTTP/2 (by prior knowledge, RFC 7540 §3.4) or
/// HTTP/1.1.
#[derive(Default)]
pub struct PrefaceSniffer {
    buf: Vec<u8>,
}

impl PrefaceSniffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Call after every `push`. Returns `NeedMore` until a decision is
    /// possible, at which point the sniffer has nothing left to do.
    pub fn sniff(&mut self) -> Decision {
        if let Some(space) = self.buf.iter().position(|&b| b == b' ') {
            let token = &self.buf[..space];
            if let Ok(word) = std::str::from_utf8(token) {
                if KNOWN_METHODS.contains(&word) {
                    return Decision::Chosen(Protocol::Http1, std::mem::take(&mut self.buf));
                }
            }
            if self.buf.len() >= PREFACE.len() {
                return self.decide_on_full_prefix();
            }
            // A space appeared before 24 octets and before PRI arrived with a
            // matching method: could still be a short HTTP/1.1 request line
            // using an unrecognized method, or garbage. Keep buffering up to
            // the 24-octet ceiling to check against the preface.
            return Decision::NeedMore;
        }

        if self.buf.len() >= PREFACE.len() {
            return self.decide_on_full_prefix();
        }
        Decision::NeedMore
    }

    fn decide_on_full_prefix(&mut self) -> Decision {
        if self.buf[..PREFACE.len()] == PREFACE[..] {
            Decision::Chosen(Protocol::Http2, std::mem::take(&mut self.buf))
        } else {
            Decision::Reject
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpn_h2_selects_http2() {
        assert_eq!(from_alpn(Some(b"h2")), Protocol::Http2);
    }

    #[test]
    fn alpn_http11_or_absent_selects_http1() {
        assert_eq!(from_alpn(Some(b"http/1.1")), Protocol::Http1);
        assert_eq!(from_alpn(None), Protocol::Http1);
    }

    #[test]
    fn full_preface_selects_http2() {
        let mut sniffer = PrefaceSniffer::new();
        sniffer.push(PREFACE);
        match sniffer.sniff() {
            Decision::Chosen(Protocol::Http2, buffered) => assert_eq!(buffered, PREFACE),
            other => panic!("expected Http2, got {other:?}"),
        }
    }

    #[test]
    fn get_request_line_selects_http1_before_24_octets() {
        let mut sniffer = PrefaceSniffer::new();
        sniffer.push(b"GET /");
        match sniffer.sniff() {
            Decision::Chosen(Protocol::Http1, buffered) => assert_eq!(buffered, b"GET /"),
            other => panic!("expected Http1, got {other:?}"),
        }
    }

    #[test]
    fn partial_preface_needs_more() {
        let mut sniffer = PrefaceSniffer::new();
        sniffer.push(&PREFACE[..10]);
        assert!(matches!(sniffer.sniff(), Decision::NeedMore));
    }

    #[test]
    fn garbage_prefix_is_rejected() {
        let mut sniffer = PrefaceSniffer::new();
        sniffer.push(&[0u8; 24]);
        assert!(matches!(sniffer.sniff(), Decision::Reject));
    }
}
