//! The router contract: `(method, path, headers, body) -> response`, opaque
//! to the connection engine. https://httpwg.org/specs/rfc7540.html#HttpRequest

use crate::mime;
use crate::request::Request;
use crate::response::Response;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

pub trait Router: Send + Sync {
    fn route(&self, request: &Request) -> Response;
}

/// Serves files under `root`. Demonstrates the `Router` trait end to end so
/// the binary is useful without a caller-supplied router; not itself part of
/// any protocol invariant.
pub struct StaticFileRouter {
    root: PathBuf,
}

impl StaticFileRouter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves `:path` against `root`, rejecting any `..` component so a
    /// request can never escape the served directory.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = path.trim_start_matches('/');
        let relative = if relative.is_empty() { "index.html" } else { relative };
        let candidate = Path::new(relative);
        if candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return None;
        }
        Some(self.root.join(candidate))
    }
}

impl Router for StaticFileRouter {
    fn route(&self, request: &Request) -> Response {
        let Some(full_path) = self.resolve(&request.path) else {
            return Response::new(403, Bytes::from_static(b"forbidden"));
        };

        match std::fs::read(&full_path) {
            Ok(bytes) => {
                let content_type = mime::lookup(&request.path);
                Response::new(200, Bytes::from(bytes)).with_header("content-type", content_type)
            }
            Err(_) => Response::new(404, Bytes::from_static(b"not found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(path: &str) -> Request {
        Request {
            method: "GET".into(),
            path: path.into(),
            query: None,
            authority: None,
            scheme: "http".into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    #[test]
    fn rejects_directory_traversal() {
        let router = StaticFileRouter::new("/srv/www");
        let resp = router.route(&req("/../etc/passwd"));
        assert_eq!(resp.status, 403);
    }

    #[test]
    fn missing_file_is_404() {
        let dir = std::env::temp_dir().join(format!("h2srv-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let router = StaticFileRouter::new(&dir);
        let resp = router.route(&req("/nope.txt"));
        assert_eq!(resp.status, 404);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn serves_existing_file_with_mime_type() {
        let dir = std::env::temp_dir().join(format!("h2srv-test2-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hello.txt"), b"hi").unwrap();
        let router = StaticFileRouter::new(&dir);
        let resp = router.route(&req("/hello.txt"));
        assert_eq!(resp.status, 200);
        assert_eq!(&resp.body[..], b"hi");
        std::fs::remove_dir_all(&dir).ok();
    }
}
