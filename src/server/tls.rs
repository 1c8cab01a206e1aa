//! TLS configuration loading.

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use rustls::crypto::aws_lc_rs::default_provider;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{version, ServerConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Load the first private key found in `path` (PKCS#8, PKCS#1 or SEC1).
fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut open(path)?)
        .with_context(|| format!("read {}", path.display()))?
        .with_context(|| format!("no private key found in {}", path.display()))
}

fn load_cert_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut open(path)?)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("read {}", path.display()))?;
    anyhow::ensure!(!certs.is_empty(), "no certificate found in {}", path.display());
    Ok(certs)
}

/// Create a RustlsConfig from certificate and key file paths.
///
/// Configures TLS 1.2 and TLS 1.3 with ALPN for HTTP/2 and HTTP/1.1.
pub async fn rustls_config_from_paths(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig> {
    let certs = load_cert_chain(cert_path)?;
    let key = load_private_key(key_path)?;

    let provider = default_provider();
    let mut config = ServerConfig::builder_with_provider(<Arc<CryptoProvider>>::from(provider))
        .with_protocol_versions(&[&version::TLS13, &version::TLS12])?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("certificate and key do not match")?;

    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(RustlsConfig::from_config(Arc::new(config)))
}
