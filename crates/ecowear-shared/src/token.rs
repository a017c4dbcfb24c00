//! Signed bearer tokens.
//!
//! A token carries `{user_id, role, expires_at}` plus an Ed25519 signature
//! over those fields, produced with the server's signing key. Clients treat
//! the encoded form as opaque; the server decodes and verifies it on every
//! authorized request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::Role;

/// Credential issued at login/registration and presented as
/// `Authorization: Bearer <encoded>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub user_id: Uuid,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub signature: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Not decodable as base64url(JSON).
    #[error("Malformed token")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    #[error("Token signature is invalid")]
    BadSignature,
}

// payload = user_id bytes || role || expires_at (rfc3339)
fn signing_payload(user_id: &Uuid, role: Role, expires_at: &DateTime<Utc>) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(user_id.as_bytes());
    payload.extend_from_slice(role.as_str().as_bytes());
    payload.extend_from_slice(expires_at.to_rfc3339().as_bytes());
    payload
}

/// Sign a fresh token for `user_id` valid for `ttl` from now.
pub fn issue_token(user_id: Uuid, role: Role, ttl: Duration, key: &SigningKey) -> AuthToken {
    let expires_at = Utc::now() + ttl;
    let signature = key.sign(&signing_payload(&user_id, role, &expires_at));

    AuthToken {
        user_id,
        role,
        expires_at,
        signature: signature.to_bytes().to_vec(),
    }
}

/// Check expiry and signature against the server's verifying key.
pub fn verify_token(token: &AuthToken, key: &VerifyingKey) -> Result<(), TokenError> {
    if Utc::now() > token.expires_at {
        return Err(TokenError::Expired);
    }

    let signature =
        Signature::from_slice(&token.signature).map_err(|_| TokenError::BadSignature)?;

    let payload = signing_payload(&token.user_id, token.role, &token.expires_at);
    key.verify(&payload, &signature)
        .map_err(|_| TokenError::BadSignature)
}

impl AuthToken {
    /// Encode for the wire: base64url over the JSON representation.
    pub fn encode(&self) -> String {
        // Serialization of a plain struct with derived Serialize cannot fail.
        let json = serde_json::to_vec(self).expect("token serialization");
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(encoded: &str) -> Result<Self, TokenError> {
        let json = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|_| TokenError::Malformed)?;
        serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)
    }
}
