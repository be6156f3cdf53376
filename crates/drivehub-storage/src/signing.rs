//! Signed object URL tokens for stores without native presigning.
//!
//! A token is an HS256 JWT binding the bucket, key, disposition and content
//! type the URL was issued for. The serving layer verifies it before
//! streaming the object.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use drivehub_core::error::AppError;
use drivehub_core::traits::storage::SignedUrlOptions;

/// Claims carried by a signed object URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectUrlClaims {
    /// Bucket the URL grants access to.
    pub bucket: String,
    /// Object key the URL grants access to.
    pub key: String,
    /// `Content-Disposition` header to serve with.
    pub disposition: String,
    /// `Content-Type` override, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Issues and verifies object URL tokens.
#[derive(Clone)]
pub struct UrlSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("validation", &self.validation)
            .finish()
    }
}

impl UrlSigner {
    /// Create a signer from an HMAC secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        validation.required_spec_claims.insert("exp".to_string());

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for one object.
    pub fn sign(
        &self,
        bucket: &str,
        key: &str,
        options: &SignedUrlOptions,
    ) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = ObjectUrlClaims {
            bucket: bucket.to_string(),
            key: key.to_string(),
            disposition: options.disposition.header_value(),
            content_type: options.content_type.clone(),
            iat: now,
            exp: now + options.expiry_seconds as i64,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign object URL: {e}")))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<ObjectUrlClaims, AppError> {
        decode::<ObjectUrlClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::gone("Object URL has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authorization("Invalid object URL signature")
                }
                _ => AppError::authorization(format!("Invalid object URL token: {e}")),
            })
    }
}

/// Percent-encode an object key for use in a URL path, keeping `/`.
pub fn encode_key_path(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
