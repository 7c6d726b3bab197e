//! Synchronous TLS transport over plain TCP sockets.
//!
//! The pipeline's worker model is thread-based and blocking (§5), so the
//! transport is built on `rustls`'s synchronous `Stream`/`StreamOwned` API
//! rather than an async runtime. TLS 1.2 is the configured protocol floor,
//! matching the original server's `TLSv1_2_server_method`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, ClientConnection, ServerConfig, ServerConnection, StreamOwned};

use crate::error::{EntropyError, Result};

const PROTOCOL_VERSIONS: &[&rustls::SupportedProtocolVersion] =
    &[&rustls::version::TLS12, &rustls::version::TLS13];

/// Load a PEM certificate chain from `cert_path`.
pub fn load_certs(cert_path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let file = std::fs::File::open(cert_path)
        .map_err(|e| EntropyError::InvalidArgument(format!("open {cert_path}: {e}")))?;
    let mut reader = std::io::BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| EntropyError::InvalidArgument(format!("parse {cert_path}: {e}")))
}

/// Load a PEM private key from `key_path`.
pub fn load_key(key_path: &str) -> Result<PrivateKeyDer<'static>> {
    let file = std::fs::File::open(key_path)
        .map_err(|e| EntropyError::InvalidArgument(format!("open {key_path}: {e}")))?;
    let mut reader = std::io::BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| EntropyError::InvalidArgument(format!("parse {key_path}: {e}")))?
        .ok_or_else(|| EntropyError::InvalidArgument(format!("no private key in {key_path}")))
}

/// Build a server-side TLS configuration from a certificate + key pair.
pub fn server_config(cert_path: &str, key_path: &str) -> Result<Arc<ServerConfig>> {
    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;
    let config = ServerConfig::builder_with_protocol_versions(PROTOCOL_VERSIONS)
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| EntropyError::InvalidArgument(format!("server config: {e}")))?;
    Ok(Arc::new(config))
}

/// Build a client-side TLS configuration. The reference implementation's
/// SSL context never validates the peer certificate against a CA — TLS here
/// is used for transport encryption over an otherwise trusted private
/// deployment, not for PKI-backed authentication. `NoCertVerification`
/// reproduces that behavior explicitly rather than silently, so it's visible
/// at the call site instead of buried in a CA store nobody populated.
pub fn client_config() -> Result<Arc<ClientConfig>> {
    let config = ClientConfig::builder_with_protocol_versions(PROTOCOL_VERSIONS)
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(NoCertVerification))
        .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Accepts any server certificate without validation, matching the
/// reference deployment's lack of CA-backed verification.
#[derive(Debug)]
struct NoCertVerification;

impl rustls::client::danger::ServerCertVerifier for NoCertVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Minimal capability surface the core depends on: accept/connect and
/// read/write of whole buffers. `SecureServerStream`/`SecureClientStream`
/// are the concrete rustls-backed implementations.
pub trait SecureStream {
    fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn write_buf(&mut self, buf: &[u8]) -> Result<()>;
}

/// One accepted, handshaked server-side TLS connection.
pub struct SecureServerStream {
    inner: StreamOwned<ServerConnection, TcpStream>,
}

impl SecureServerStream {
    pub fn accept(listener: &TcpListener, config: Arc<ServerConfig>) -> Result<Self> {
        let (socket, _addr) = listener
            .accept()
            .map_err(|e| EntropyError::NetworkFailure(format!("accept: {e}")))?;
        let conn = ServerConnection::new(config)
            .map_err(|e| EntropyError::NetworkFailure(format!("tls handshake setup: {e}")))?;
        Ok(Self {
            inner: StreamOwned::new(conn, socket),
        })
    }
}

impl SecureStream for SecureServerStream {
    fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner
            .read(buf)
            .map_err(|e| EntropyError::NetworkFailure(e.to_string()))
    }

    fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        self.inner
            .write_all(buf)
            .map_err(|e| EntropyError::NetworkFailure(e.to_string()))
    }
}

/// A connection initiated by a client.
pub struct SecureClientStream {
    inner: StreamOwned<ClientConnection, TcpStream>,
}

impl SecureClientStream {
    pub fn connect(host: &str, port: u16, config: Arc<ClientConfig>) -> Result<Self> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| EntropyError::InvalidArgument(format!("bad hostname {host}: {e}")))?;
        let conn = ClientConnection::new(config, server_name)
            .map_err(|e| EntropyError::NetworkFailure(format!("tls handshake setup: {e}")))?;
        let socket = TcpStream::connect((host, port))
            .map_err(|e| EntropyError::NetworkFailure(format!("connect {host}:{port}: {e}")))?;
        Ok(Self {
            inner: StreamOwned::new(conn, socket),
        })
    }
}

impl SecureStream for SecureClientStream {
    fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner
            .read(buf)
            .map_err(|e| EntropyError::NetworkFailure(e.to_string()))
    }

    fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        self.inner
            .write_all(buf)
            .map_err(|e| EntropyError::NetworkFailure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_certs_rejects_missing_file() {
        assert!(load_certs("/nonexistent/cert.pem").is_err());
    }

    #[test]
    fn load_key_rejects_missing_file() {
        assert!(load_key("/nonexistent/key.pem").is_err());
    }

    #[test]
    fn load_certs_rejects_non_pem_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a certificate\n").unwrap();
        let certs = load_certs(file.path().to_str().unwrap()).unwrap();
        assert!(certs.is_empty());
    }

    #[test]
    fn load_key_rejects_non_pem_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a key\n").unwrap();
        assert!(load_key(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn client_config_builds_successfully() {
        assert!(client_config().is_ok());
    }
}
