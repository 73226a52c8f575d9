//! Certificate URL validation and X.509 parsing/checking

use chrono::{DateTime, Utc};
use url::Url;
use x509_cert::der::oid::AssociatedOid;
use x509_cert::der::Decode;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::Certificate;

use crate::{VerifyError, AMAZON_CERT_HOST, AMAZON_CERT_PATH_PREFIX, AMAZON_SAN};

/// Validate the certificate-chain URL before any network I/O.
///
/// Scheme must be exactly `https`, host exactly Amazon's certificate host
/// (an explicit `:443` is allowed), and the path must start with the
/// required prefix.
pub fn validate_cert_url(raw: &str) -> Result<(), VerifyError> {
    let reject = || VerifyError::InvalidCertUrl(raw.to_string());

    let url = Url::parse(raw).map_err(|_| reject())?;

    if url.scheme() != "https" {
        return Err(reject());
    }

    if url.host_str() != Some(AMAZON_CERT_HOST) {
        return Err(reject());
    }

    // Url::port() is None for the scheme default, so an explicit :443
    // passes and any other port fails.
    if url.port().is_some() {
        return Err(reject());
    }

    if !url.path().starts_with(AMAZON_CERT_PATH_PREFIX) {
        return Err(reject());
    }

    Ok(())
}

/// Decode a PEM block and parse it as an X.509 certificate
pub fn parse_certificate(pem_bytes: &[u8]) -> Result<Certificate, VerifyError> {
    let block = pem::parse(pem_bytes)
        .map_err(|e| VerifyError::CertDecode(format!("failed to parse PEM: {e}")))?;
    if block.tag() != "CERTIFICATE" {
        return Err(VerifyError::CertDecode(format!(
            "unexpected PEM tag: {}",
            block.tag()
        )));
    }
    Certificate::from_der(block.contents())
        .map_err(|e| VerifyError::CertDecode(format!("failed to parse DER: {e}")))
}

/// Check the validity window and the required subject alternative name
pub fn check_certificate(cert: &Certificate, now: DateTime<Utc>) -> Result<(), VerifyError> {
    let validity = &cert.tbs_certificate.validity;
    let not_before: DateTime<Utc> = validity.not_before.to_system_time().into();
    let not_after: DateTime<Utc> = validity.not_after.to_system_time().into();

    if now < not_before || now > not_after {
        return Err(VerifyError::CertExpired);
    }

    if !san_dns_names(cert).any(|name| name == AMAZON_SAN) {
        return Err(VerifyError::CertDomainMismatch);
    }

    Ok(())
}

/// DNS names from the certificate's SubjectAltName extension, if present
fn san_dns_names(cert: &Certificate) -> impl Iterator<Item = String> + '_ {
    cert.tbs_certificate
        .extensions
        .iter()
        .flatten()
        .filter(|ext| ext.extn_id == SubjectAltName::OID)
        .filter_map(|ext| SubjectAltName::from_der(ext.extn_value.as_bytes()).ok())
        .flat_map(|san| san.0.into_iter())
        .filter_map(|name| match name {
            GeneralName::DnsName(dns) => Some(dns.to_string()),
            _ => None,
        })
}
