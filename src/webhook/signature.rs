use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ClientError;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify the GitHub webhook HMAC-SHA256 signature.
///
/// GitHub sends the signature in the `X-Hub-Signature-256` header as `sha256=<hex>`.
/// A header that is absent or not of the form `sha256=[0-9a-f]+` is reported as
/// unsigned; anything else that fails to verify is a mismatch.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    signature_header: Option<&str>,
) -> Result<(), ClientError> {
    let signature_hex = signature_header
        .and_then(|h| h.strip_prefix(SIGNATURE_PREFIX))
        .filter(|hex| is_lower_hex(hex))
        .ok_or(ClientError::SignatureNotSha256)?;

    // Odd-length digests are well-formed per the header grammar but can never match.
    let signature_bytes =
        hex::decode(signature_hex).map_err(|_| ClientError::SignatureMismatch)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| ClientError::SignatureMismatch)?;

    mac.update(payload);

    mac.verify_slice(&signature_bytes)
        .map_err(|_| ClientError::SignatureMismatch)
}

/// Compute the `X-Hub-Signature-256` header value GitHub would send for `payload`.
#[cfg(test)]
pub(crate) fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

fn is_lower_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
