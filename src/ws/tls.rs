//! TLS trust material.
//!
//! The transport treats its trust store as opaque: callers build an
//! [`Arc<ClientConfig>`] from a PEM CA bundle once and may share it across
//! any number of sessions.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};

use super::error::WsError;

/// Build a TLS client configuration whose root store holds exactly the
/// certificates of the given PEM CA bundle.
pub fn trust_store_from_pem(path: &Path) -> Result<Arc<ClientConfig>, WsError> {
    let file = File::open(path).map_err(WsError::TrustStore)?;
    let mut reader = BufReader::new(file);

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(WsError::TrustStore)?;
    if certs.is_empty() {
        return Err(WsError::NoCertificatesFound(path.to_owned()));
    }

    let mut roots = RootCertStore::empty();
    for cert in certs {
        roots.add(cert).map_err(WsError::InvalidCertificate)?;
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}
