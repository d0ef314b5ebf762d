//! HS256 bearer tokens.
//!
//! Stands in for the external identity provider: `issue` is what sign-up and
//! sign-in hand to the client, `verify` is what the server runs on every
//! analysis request.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued for.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct IdentityProvider {
    secret: Vec<u8>,
    ttl: Duration,
}

impl IdentityProvider {
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        // capped at a century so the expiry never overflows
        let hours = ttl_hours.min(24 * 365 * 100) as i64;
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::hours(hours),
        }
    }

    pub fn issue(&self, user_id: &str, email: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let header_b64 = URL_SAFE_NO_PAD.encode(HEADER.as_bytes());
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&header_b64, &payload_b64)?);

        Ok(format!("{}.{}.{}", header_b64, payload_b64, signature))
    }

    /// Any failure (shape, signature, claims, expiry) is `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let parts: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = parts.as_slice() else {
            return Err(AppError::Unauthorized);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AppError::Unauthorized)?;
        let mut mac = self.mac()?;
        mac.update(format!("{}.{}", header, payload).as_bytes());
        // constant-time comparison
        mac.verify_slice(&signature)
            .map_err(|_| AppError::Unauthorized)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AppError::Unauthorized)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AppError::Unauthorized)?;

        if claims.sub.is_empty() || claims.exp <= Utc::now().timestamp() {
            return Err(AppError::Unauthorized);
        }

        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Config(format!("invalid auth secret: {}", e)))
    }

    fn sign(&self, header: &str, payload: &str) -> Result<Vec<u8>> {
        let mut mac = self.mac()?;
        mac.update(format!("{}.{}", header, payload).as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Extracts the token from an `Authorization` header value of the form `Bearer <token>`.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// User ids are the normalized email address.
pub fn user_id_for_email(email: &str) -> String {
    email.trim().to_lowercase()
}
