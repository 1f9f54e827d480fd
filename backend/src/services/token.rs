//! Access token signing and opaque refresh token generation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

use crate::error::{AppError, Result};

/// Length of an opaque refresh token
pub const REFRESH_TOKEN_LEN: usize = 24;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Account id
    pub sub: Ulid,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

/// HS256 signer for access tokens. The secret is injected at construction.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, access_ttl_hours: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::hours(i64::from(access_ttl_hours)),
        }
    }

    /// Sign a fresh access token, returning it with its expiry.
    pub fn sign(&self, account_id: Ulid, email: &str) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + self.access_ttl;
        let claims = AccessClaims {
            sub: account_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        Ok((self.encode_claims(&claims)?, expires_at))
    }

    pub(crate) fn encode_claims(&self, claims: &AccessClaims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> std::result::Result<AccessClaims, TokenError> {
        self.decode_with(token, true)
    }

    /// Like [`verify`](Self::verify) but an expired token still yields its
    /// claims. Any other failure is fatal.
    pub fn claims_allowing_expired(&self, token: &str) -> std::result::Result<AccessClaims, TokenError> {
        match self.verify(token) {
            Err(TokenError::Expired) => self.decode_with(token, false),
            other => other,
        }
    }

    fn decode_with(&self, token: &str, validate_exp: bool) -> std::result::Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = validate_exp;

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

/// Cryptographically random alphanumeric string.
pub fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
