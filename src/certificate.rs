//! TLS certificate retrieval
//!
//! The audit inspects whatever certificate a site presents, including
//! expired or self-signed ones, so the TLS client here accepts any chain.
//! The connection is closed right after the handshake; nothing is sent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::error::{Error, Result};

/// Fields of a server certificate shown in the report
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Certificate {
    /// Subject common name
    pub subject_cn: String,
    /// Issuer country
    pub issuer_country: String,
    /// Issuer organization
    pub issuer_organization: String,
    /// Issuer common name
    pub issuer_cn: String,
    /// Start of validity
    pub valid_from: DateTime<Utc>,
    /// End of validity
    pub valid_to: DateTime<Utc>,
    /// Serial number, upper-case hex
    pub serial_number: String,
    /// SHA-1 fingerprint of the DER encoding, colon separated
    pub fingerprint: String,
    /// SHA-256 fingerprint of the DER encoding, colon separated
    pub fingerprint256: String,
}

impl Certificate {
    /// Extract the report fields from a DER-encoded certificate
    pub fn from_der(der: &[u8]) -> std::result::Result<Self, String> {
        let (_, cert) = X509Certificate::from_der(der).map_err(|e| e.to_string())?;

        let first = |values: Vec<&str>| values.first().copied().unwrap_or_default().to_string();
        let validity = cert.validity();

        Ok(Self {
            subject_cn: first(cert.subject().iter_common_name().filter_map(|a| a.as_str().ok()).collect()),
            issuer_country: first(cert.issuer().iter_country().filter_map(|a| a.as_str().ok()).collect()),
            issuer_organization: first(
                cert.issuer()
                    .iter_organization()
                    .filter_map(|a| a.as_str().ok())
                    .collect(),
            ),
            issuer_cn: first(cert.issuer().iter_common_name().filter_map(|a| a.as_str().ok()).collect()),
            valid_from: timestamp(validity.not_before.timestamp()),
            valid_to: timestamp(validity.not_after.timestamp()),
            serial_number: hex::encode_upper(cert.raw_serial()),
            fingerprint: colon_hex(&Sha1::digest(der)),
            fingerprint256: colon_hex(&Sha256::digest(der)),
        })
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// `AB:CD:...` rendering of a digest
pub fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(":")
}

/// Source of server certificates
#[async_trait]
pub trait CertificateProvider: Send + Sync {
    /// Certificate presented by `host`
    ///
    /// # Errors
    /// Returns [`Error::Certificate`] when no certificate could be obtained.
    async fn certificate(&self, host: &str) -> Result<Certificate>;
}

/// [`CertificateProvider`] performing a TLS handshake with tokio-rustls
#[derive(Clone, Debug)]
pub struct TlsCertificateProvider {
    port: u16,
    timeout: Duration,
}

impl Default for TlsCertificateProvider {
    fn default() -> Self {
        Self {
            port: 443,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TlsCertificateProvider {
    /// Provider connecting on port 443
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect on another port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Bound the connection and handshake
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn connector() -> std::result::Result<TlsConnector, rustls::Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(InspectOnly(provider)))
            .with_no_client_auth();
        Ok(TlsConnector::from(Arc::new(config)))
    }

    async fn handshake(&self, host: &str) -> std::result::Result<Certificate, String> {
        let connector = Self::connector().map_err(|e| e.to_string())?;
        let server_name = ServerName::try_from(host.to_string()).map_err(|e| e.to_string())?;

        let stream = TcpStream::connect((host, self.port))
            .await
            .map_err(|e| format!("connect failed: {e}"))?;
        let tls = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| format!("TLS handshake failed: {e}"))?;

        let (_, session) = tls.get_ref();
        let leaf = session
            .peer_certificates()
            .and_then(|chain| chain.first())
            .ok_or_else(|| "server presented no certificate".to_string())?;
        Certificate::from_der(leaf.as_ref())
    }
}

#[async_trait]
impl CertificateProvider for TlsCertificateProvider {
    async fn certificate(&self, host: &str) -> Result<Certificate> {
        debug!(host, port = self.port, "retrieving certificate");
        let outcome = tokio::time::timeout(self.timeout, self.handshake(host))
            .await
            .unwrap_or_else(|_| Err(format!("timed out after {:?}", self.timeout)));
        outcome.map_err(|reason| Error::Certificate {
            host: host.to_string(),
            reason,
        })
    }
}

/// Accepts any certificate chain while still checking handshake signatures
#[derive(Debug)]
struct InspectOnly(Arc<CryptoProvider>);

impl ServerCertVerifier for InspectOnly {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
