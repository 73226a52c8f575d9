//! Detached-signature verification against the raw request body

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::{Digest, Sha1};
use x509_cert::der::Encode;
use x509_cert::Certificate;

use crate::VerifyError;

/// Verify the base64 `Signature` header against the raw body bytes using
/// the certificate's RSA public key (PKCS#1 v1.5 over SHA-1, per Amazon).
///
/// The body is hashed exactly as received; the caller's buffer is never
/// modified or consumed.
pub fn verify_signature(
    cert: &Certificate,
    signature_b64: &str,
    body: &[u8],
) -> Result<(), VerifyError> {
    let signature = BASE64.decode(signature_b64)?;

    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| VerifyError::PublicKey(e.to_string()))?;
    let public_key = RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| VerifyError::PublicKey(e.to_string()))?;

    let digest = Sha1::digest(body);
    public_key
        .verify(Pkcs1v15Sign::new::<Sha1>(), &digest, &signature)
        .map_err(|_| VerifyError::SignatureMismatch)
}
