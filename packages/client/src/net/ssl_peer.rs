//! Peer certificate capture through a TLS handshake
//!
//! The verifier accepts any server certificate and records the presented
//! chain; the connection is closed right after the handshake.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme};

use crate::error::{CertError, Result};

#[derive(Debug, Default)]
struct CapturingVerifier {
    captured: Mutex<Vec<Vec<u8>>>,
}

impl CapturingVerifier {
    fn take(&self) -> Vec<Vec<u8>> {
        match self.captured.lock() {
            Ok(mut captured) => std::mem::take(&mut *captured),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl ServerCertVerifier for CapturingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let chain: Vec<Vec<u8>> = std::iter::once(end_entity)
            .chain(intermediates)
            .map(|cert| cert.as_ref().to_vec())
            .collect();

        tracing::debug!("Captured {} certificates from {:?}", chain.len(), server_name);

        match self.captured.lock() {
            Ok(mut captured) => *captured = chain,
            Err(poisoned) => *poisoned.into_inner() = chain,
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Connect to `host:port` and return the DER certificates the server presents.
pub fn fetch_peer_certificates(host: &str, port: u16, timeout: Duration) -> Result<Vec<Vec<u8>>> {
    let verifier = Arc::new(CapturingVerifier::default());
    let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier.clone())
        .with_no_client_auth();

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| CertError::invalid_argument(format!("invalid server name '{host}': {e}")))?;
    let mut connection = ClientConnection::new(Arc::new(config), server_name)?;

    let address = (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| CertError::not_found(format!("no address for {host}:{port}")))?;
    let mut socket = TcpStream::connect_timeout(&address, timeout)?;
    socket.set_read_timeout(Some(timeout))?;
    socket.set_write_timeout(Some(timeout))?;

    let mut handshake_error = None;

    while connection.is_handshaking() {
        if let Err(e) = connection.complete_io(&mut socket) {
            handshake_error = Some(e);
            break;
        }
    }

    let certificates = verifier.take();

    match handshake_error {
        // the chain may be complete even if the handshake failed afterwards
        Some(e) if certificates.is_empty() => return Err(CertError::Tls(e.to_string())),
        Some(e) => tracing::debug!("Handshake with {}:{} failed after capture: {}", host, port, e),
        None => {
            connection.send_close_notify();
            let _ = connection.complete_io(&mut socket);
        }
    }

    tracing::info!("Received {} certificates from {}:{}", certificates.len(), host, port);
    Ok(certificates)
}
