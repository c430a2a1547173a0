//! The opaque response record the router returns.

use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// HTTP/2 forbids connection-specific response headers on the wire;
    /// the engine calls this right before HPACK-encoding the response.
    pub fn strip_connection_specific_headers(&mut self) {
        const FORBIDDEN: [&str; 4] = ["connection", "keep-alive", "transfer-encoding", "content-length"];
        self.headers
            .retain(|(name, _)| !FORBIDDEN.iter().any(|f| name.eq_ignore_ascii_case(f)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_connection_specific_headers() {
        let mut resp = Response::new(200, Bytes::new())
            .with_header("Connection", "keep-alive")
            .with_header("Content-Length", "0")
            .with_header("x-custom", "ok");
        resp.strip_connection_specific_headers();
        assert_eq!(resp.headers, vec![("x-custom".to_string(), "ok".to_string())]);
    }
}
