//! `rustls::ServerConfig` construction with ALPN `h2`/`http/1.1`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::{Certificate, PrivateKey};

#[derive(thiserror::Error, Debug)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} contains no certificates")]
    NoCertificates { path: String },
    #[error("{path} contains no private key")]
    NoPrivateKey { path: String },
    #[error(transparent)]
    Rustls(#[from] rustls::Error),
}

/// Loads a cert chain + private key pair and builds a `ServerConfig` that
/// advertises `h2` ahead of `http/1.1` in ALPN, so the dispatcher
/// (`dispatcher.rs`) can read back which protocol the peer agreed to.
pub fn load_server_config(cert_file: &Path, key_file: &Path) -> Result<Arc<rustls::ServerConfig>, TlsError> {
    let certs = load_certs(cert_file)?;
    let key = load_private_key(key_file)?;

    let mut config = rustls::ServerConfig::builder()
        .with_safe_defaults()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

fn load_certs(path: &Path) -> Result<Vec<Certificate>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let raw = rustls_pemfile::certs(&mut reader).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if raw.is_empty() {
        return Err(TlsError::NoCertificates {
            path: path.display().to_string(),
        });
    }
    Ok(raw.into_iter().map(Certificate).collect())
}

fn load_private_key(path: &Path) -> Result<PrivateKey, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let pkcs8 = rustls_pemfile::pkcs8_private_keys(&mut reader).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if let Some(key) = pkcs8.into_iter().next() {
        return Ok(PrivateKey(key));
    }

    // Rewind and try the legacy RSA PEM marker if no PKCS#8 key was found.
    let file = File::open(path).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let rsa = rustls_pemfile::rsa_private_keys(&mut reader).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    rsa.into_iter()
        .next()
        .map(PrivateKey)
        .ok_or_else(|| TlsError::NoPrivateKey {
            path: path.display().to_string(),
        })
}
