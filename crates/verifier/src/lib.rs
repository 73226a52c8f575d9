//! Alexa request authenticity verification
//!
//! Amazon requires webhook skills to prove that each request came from
//! their signing infrastructure: a certificate-chain URL header pointing at
//! an Amazon-hosted X.509 certificate, and a detached base64 signature
//! header over the raw request body. Every check here is mandatory; any
//! failure means the request must be refused with a uniform 401.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

pub mod cert;
pub mod signature;

/// Header carrying the certificate-chain URL
pub const CERT_CHAIN_URL_HEADER: &str = "SignatureCertChainUrl";
/// Header carrying the base64 detached signature
pub const SIGNATURE_HEADER: &str = "Signature";

/// Host Amazon serves signing certificates from
pub const AMAZON_CERT_HOST: &str = "s3.amazonaws.com";
/// Required path prefix on the certificate URL
pub const AMAZON_CERT_PATH_PREFIX: &str = "/echo.api/";
/// SAN the certificate must carry
pub const AMAZON_SAN: &str = "echo-api.amazon.com";

/// Why a request was refused. Only ever logged; the client response is a
/// uniform "not authorized" regardless of variant.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("invalid certificate URL: {0}")]
    InvalidCertUrl(String),
    #[error("certificate fetch failed: {0}")]
    CertFetch(#[from] reqwest::Error),
    #[error("certificate decode failed: {0}")]
    CertDecode(String),
    #[error("certificate outside its validity window")]
    CertExpired,
    #[error("certificate missing required subject alternative name")]
    CertDomainMismatch,
    #[error("certificate public key unusable: {0}")]
    PublicKey(String),
    #[error("signature is not valid base64: {0}")]
    SignatureDecode(#[from] base64::DecodeError),
    #[error("signature does not match request body")]
    SignatureMismatch,
}

/// Verifies that inbound webhook requests originated from Amazon.
///
/// Stateless apart from the HTTP client; safe to share across requests.
/// The certificate is fetched fresh on every call and discarded after.
pub struct AlexaVerifier {
    client: reqwest::Client,
}

impl Default for AlexaVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AlexaVerifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Run all mandatory checks against one request.
    ///
    /// `body` is borrowed: the caller keeps the original bytes and can hand
    /// them to the JSON parser afterwards untouched.
    pub async fn verify(
        &self,
        cert_url: &str,
        signature_b64: &str,
        body: &[u8],
    ) -> Result<(), VerifyError> {
        cert::validate_cert_url(cert_url)?;
        let pem_bytes = self.fetch_cert(cert_url).await?;
        verify_with_certificate(&pem_bytes, signature_b64, body, Utc::now())
    }

    async fn fetch_cert(&self, cert_url: &str) -> Result<Vec<u8>, VerifyError> {
        debug!("Fetching signing certificate from {}", cert_url);
        let resp = self.client.get(cert_url).send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Certificate + signature checks, separated from the network fetch so the
/// cryptographic path is testable with locally minted certificates.
pub fn verify_with_certificate(
    cert_pem: &[u8],
    signature_b64: &str,
    body: &[u8],
    now: DateTime<Utc>,
) -> Result<(), VerifyError> {
    let cert = cert::parse_certificate(cert_pem)?;
    cert::check_certificate(&cert, now)?;
    signature::verify_signature(&cert, signature_b64, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use rsa::pkcs1v15::SigningKey;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
    use sha1::{Digest, Sha1};
    use sha2::Sha256;
    use std::str::FromStr;
    use std::time::Duration;
    use x509_cert::builder::{Builder, CertificateBuilder, Profile};
    use x509_cert::der::asn1::Ia5String;
    use x509_cert::der::Encode;
    use x509_cert::ext::pkix::name::GeneralName;
    use x509_cert::ext::pkix::SubjectAltName;
    use x509_cert::name::Name;
    use x509_cert::serial_number::SerialNumber;
    use x509_cert::spki::SubjectPublicKeyInfoOwned;
    use x509_cert::time::Validity;

    /// Mint a self-signed RSA certificate, optionally carrying the Amazon
    /// SAN, valid for one hour from now. Returns the PEM bytes and the
    /// private key for signing request bodies.
    fn make_cert(san: Option<&str>) -> (Vec<u8>, RsaPrivateKey) {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let public_key = RsaPublicKey::from(&private_key);
        let signer = SigningKey::<Sha256>::new(private_key.clone());

        let serial = SerialNumber::from(1u32);
        let validity = Validity::from_now(Duration::from_secs(3600)).unwrap();
        let subject = Name::from_str("CN=Amazon Echo API").unwrap();
        let spki_der = public_key.to_public_key_der().unwrap();
        let spki = SubjectPublicKeyInfoOwned::try_from(spki_der.as_bytes()).unwrap();

        let mut builder =
            CertificateBuilder::new(Profile::Root, serial, validity, subject, spki, &signer)
                .unwrap();
        if let Some(name) = san {
            builder
                .add_extension(&SubjectAltName(vec![GeneralName::DnsName(
                    Ia5String::new(name).unwrap(),
                )]))
                .unwrap();
        }
        let cert = builder.build::<rsa::pkcs1v15::Signature>().unwrap();

        let der = cert.to_der().unwrap();
        let pem = pem::encode(&pem::Pem::new("CERTIFICATE", der));
        (pem.into_bytes(), private_key)
    }

    fn sign_body(key: &RsaPrivateKey, body: &[u8]) -> String {
        let digest = Sha1::digest(body);
        let sig = key.sign(Pkcs1v15Sign::new::<Sha1>(), &digest).unwrap();
        BASE64.encode(sig)
    }

    #[test]
    fn test_accepts_valid_request() {
        let (pem, key) = make_cert(Some(AMAZON_SAN));
        let body = br#"{"request":{"type":"LaunchRequest"}}"#;
        let sig = sign_body(&key, body);

        assert!(verify_with_certificate(&pem, &sig, body, Utc::now()).is_ok());
    }

    #[test]
    fn test_body_untouched_after_verification() {
        let (pem, key) = make_cert(Some(AMAZON_SAN));
        let body = br#"{"request":{"type":"IntentRequest"}}"#.to_vec();
        let original = body.clone();
        let sig = sign_body(&key, &body);

        verify_with_certificate(&pem, &sig, &body, Utc::now()).unwrap();
        assert_eq!(body, original);
        // Downstream JSON parsing still works on the same bytes
        assert!(serde_json::from_slice::<serde_json::Value>(&body).is_ok());
    }

    #[test]
    fn test_rejects_tampered_body() {
        let (pem, key) = make_cert(Some(AMAZON_SAN));
        let body = br#"{"request":{"type":"LaunchRequest"}}"#;
        let sig = sign_body(&key, body);

        let mut tampered = body.to_vec();
        tampered[10] ^= 1;
        assert!(matches!(
            verify_with_certificate(&pem, &sig, &tampered, Utc::now()),
            Err(VerifyError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_rejects_signature_from_other_key() {
        let (pem, _key) = make_cert(Some(AMAZON_SAN));
        let (_other_pem, other_key) = make_cert(Some(AMAZON_SAN));
        let body = b"payload";
        let sig = sign_body(&other_key, body);

        assert!(matches!(
            verify_with_certificate(&pem, &sig, body, Utc::now()),
            Err(VerifyError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_rejects_expired_certificate() {
        let (pem, key) = make_cert(Some(AMAZON_SAN));
        let body = b"payload";
        let sig = sign_body(&key, body);

        let future = Utc::now() + chrono::Duration::days(30);
        assert!(matches!(
            verify_with_certificate(&pem, &sig, body, future),
            Err(VerifyError::CertExpired)
        ));
    }

    #[test]
    fn test_rejects_missing_san() {
        let (pem, key) = make_cert(None);
        let body = b"payload";
        let sig = sign_body(&key, body);

        assert!(matches!(
            verify_with_certificate(&pem, &sig, body, Utc::now()),
            Err(VerifyError::CertDomainMismatch)
        ));
    }

    #[test]
    fn test_rejects_wrong_san() {
        let (pem, key) = make_cert(Some("echo-api.evil.com"));
        let body = b"payload";
        let sig = sign_body(&key, body);

        assert!(matches!(
            verify_with_certificate(&pem, &sig, body, Utc::now()),
            Err(VerifyError::CertDomainMismatch)
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_host_without_fetching() {
        let verifier = AlexaVerifier::new();
        // The URL error variant proves rejection happened before the
        // certificate fetch step.
        let result = verifier
            .verify(
                "https://s3.evil.com/echo.api/echo-api-cert.pem",
                "c2ln",
                b"payload",
            )
            .await;
        assert!(matches!(result, Err(VerifyError::InvalidCertUrl(_))));
    }

    #[test]
    fn test_rejects_malformed_base64_signature() {
        let (pem, _key) = make_cert(Some(AMAZON_SAN));
        assert!(matches!(
            verify_with_certificate(&pem, "!!!not-base64!!!", b"payload", Utc::now()),
            Err(VerifyError::SignatureDecode(_))
        ));
    }
}
