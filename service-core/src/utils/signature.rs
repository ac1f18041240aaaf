use crate::error::AppError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Generate HMAC-SHA256 signature for a time-limited document download URL.
///
/// Format: HMAC-SHA256(document_id|expires, secret)
pub fn generate_document_signature(
    secret: &str,
    document_id: &str,
    expires: i64,
) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;

    let payload = format!("{}|{}", document_id, expires);
    mac.update(payload.as_bytes());
    let result = mac.finalize();

    Ok(hex::encode(result.into_bytes()))
}

/// Validate a document download signature using constant-time comparison.
///
/// Rejects expired links before doing any cryptographic work.
pub fn validate_document_signature(
    document_id: &str,
    signature: &str,
    expires: i64,
    secret: &str,
) -> Result<(), AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("System clock error: {}", e)))?
        .as_secs() as i64;

    if expires < now {
        return Err(AppError::Unauthenticated(anyhow::anyhow!(
            "Download link expired"
        )));
    }

    let expected = generate_document_signature(secret, document_id, expires)
        .map_err(AppError::InternalError)?;

    let expected_bytes = expected.as_bytes();
    let signature_bytes = signature.as_bytes();

    let valid = expected_bytes.len() == signature_bytes.len()
        && bool::from(expected_bytes.ct_eq(signature_bytes));

    if !valid {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Invalid download signature"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn far_future() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
            + 3600
    }

    #[test]
    fn test_signature_generation_and_validation() {
        let secret = "my_secret_key";
        let document_id = "5f0c1f6a-7d3e-4a5b-9c8d-1e2f3a4b5c6d";
        let expires = far_future();

        let signature = generate_document_signature(secret, document_id, expires).unwrap();
        assert!(!signature.is_empty());

        validate_document_signature(document_id, &signature, expires, secret).unwrap();
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let secret = "my_secret_key";
        let document_id = "5f0c1f6a-7d3e-4a5b-9c8d-1e2f3a4b5c6d";
        let expires = far_future();

        let signature = generate_document_signature(secret, document_id, expires).unwrap();
        let tampered = format!("a{}", &signature[1..]);

        let err = validate_document_signature(document_id, &tampered, expires, secret).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_signature_bound_to_document() {
        let secret = "my_secret_key";
        let expires = far_future();

        let signature = generate_document_signature(secret, "doc-a", expires).unwrap();

        let err = validate_document_signature("doc-b", &signature, expires, secret).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_expired_link_rejected() {
        let secret = "my_secret_key";
        let document_id = "5f0c1f6a-7d3e-4a5b-9c8d-1e2f3a4b5c6d";
        let expires = 1_000_000; // long past

        let signature = generate_document_signature(secret, document_id, expires).unwrap();

        let err =
            validate_document_signature(document_id, &signature, expires, secret).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
