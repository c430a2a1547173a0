//! Small builtin extension-to-MIME-type table for the default router.

const TABLE: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("txt", "text/plain; charset=utf-8"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("wasm", "application/wasm"),
    ("pdf", "application/pdf"),
];

const DEFAULT: &str = "application/octet-stream";

#[must_use]
pub fn lookup(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("");
    TABLE
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map_or(DEFAULT, |(_, mime)| mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extension_resolves() {
        assert_eq!(lookup("index.html"), "text/html; charset=utf-8");
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(lookup("archive.tar.gz"), DEFAULT);
    }

    #[test]
    fn no_extension_falls_back_to_octet_stream() {
        assert_eq!(lookup("README"), DEFAULT);
    }
}
