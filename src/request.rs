//! The opaque request record the router sees. https://httpwg.org/specs/rfc7540.html#HttpRequest

use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authority: Option<String>,
    pub scheme: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Request {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Splits a raw `:path` pseudo-header value into path and query, per
    /// RFC 3986 §3.4.
    #[must_use]
    pub fn split_path(raw: &str) -> (String, Option<String>) {
        match raw.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (raw.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_path_separates_query() {
        assert_eq!(
            Request::split_path("/echo?x=1"),
            ("/echo".to_string(), Some("x=1".to_string()))
        );
        assert_eq!(Request::split_path("/echo"), ("/echo".to_string(), None));
    }
}
