//! HTTPS file downloader.
//!
//! The monitor process fetches the network-layout JSON once at startup;
//! this is the small HTTPS client that does it, verifying the server
//! against the same kind of PEM CA bundle the WebSocket transport uses.

use std::path::Path;

use url::Url;

use crate::Result;
use crate::error::Error;

/// Download `url` to `destination`, whose parent directory must exist.
///
/// When `ca_bundle` is given, the server certificate is verified against
/// exactly those roots instead of the built-in ones. Non-2xx responses are
/// reported as status errors.
pub async fn download_file(
    url: &str,
    destination: &Path,
    ca_bundle: Option<&Path>,
) -> Result<()> {
    let url = Url::parse(url)?;

    let mut builder = reqwest::Client::builder().use_rustls_tls();
    if let Some(path) = ca_bundle {
        let pem = std::fs::read(path)?;
        builder = builder.tls_built_in_root_certs(false);
        for certificate in reqwest::Certificate::from_pem_bundle(&pem)? {
            builder = builder.add_root_certificate(certificate);
        }
    }
    let client = builder.build()?;

    let response = client.get(url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(Error::status(response.status().as_u16(), url.as_str()));
    }

    let bytes = response.bytes().await?;
    tokio::fs::write(destination, &bytes).await?;

    #[cfg(feature = "tracing")]
    tracing::debug!(url = %url, bytes = bytes.len(), "downloaded file");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_a_relative_url() {
        let temp = tempfile::tempdir().unwrap();
        let result = download_file("not-a-url", &temp.path().join("out.json"), None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_ca_bundle_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let result = download_file(
            "https://example.com/layout.json",
            &temp.path().join("out.json"),
            Some(Path::new("/nonexistent/cacert.pem")),
        )
        .await;
        assert!(result.is_err());
    }
}
