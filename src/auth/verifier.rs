//! Bearer token verification
//!
//! A request passes through these checks in order, stopping at the first
//! failure:
//!
//! 1. the `Authorization` header splits on `"Bearer"` into exactly two parts
//! 2. the trimmed token is not empty
//! 3. the HS256 signature verifies against the shared secret
//! 4. `iss` and `aud` equal the configured values
//!
//! Expiration is a separate check. The gate only applies it when
//! `auth.enforce_expiration` is enabled.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use super::claims::Claims;
use crate::config::AuthConfig;

/// Why a bearer token was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("auth token incorrect or wasn't supplied")]
    MalformedHeader,

    #[error("bearer token is required")]
    EmptyToken,

    #[error("token is not parsable")]
    Unparsable,

    #[error("invalid token issuer")]
    InvalidIssuer,

    #[error("invalid token audience")]
    InvalidAudience,

    #[error("token expired")]
    Expired,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedHeader => "malformed_header",
            Self::EmptyToken => "empty_token",
            Self::Unparsable => "unparsable",
            Self::InvalidIssuer => "invalid_issuer",
            Self::InvalidAudience => "invalid_audience",
            Self::Expired => "expired",
        }
    }
}

/// Extract the token text from an `Authorization` header value
///
/// Anything may precede the `Bearer` keyword, but it must occur exactly once.
pub fn token_from_header(header: &str) -> Result<&str, Rejection> {
    let segments: Vec<&str> = header.split("Bearer").collect();
    if segments.len() != 2 {
        return Err(Rejection::MalformedHeader);
    }
    Ok(segments[1].trim())
}

/// Verifies bearer tokens against the configured secret, issuer and audience
pub struct ClaimsVerifier {
    key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    enforce_expiration: bool,
}

impl ClaimsVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        // Only the signature is checked while decoding; the registered
        // claims are compared afterwards so each mismatch has its own reason.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            enforce_expiration: config.enforce_expiration,
        }
    }

    /// Run the full check sequence over a raw `Authorization` header value
    pub fn verify_header(&self, header: &str) -> Result<Claims, Rejection> {
        let token = token_from_header(header)?;
        if token.is_empty() {
            return Err(Rejection::EmptyToken);
        }

        let claims = self.decode(token)?;
        self.verify_claims(&claims)?;

        if self.enforce_expiration && claims.is_expired_at(Utc::now()) {
            return Err(Rejection::Expired);
        }

        Ok(claims)
    }

    /// Decode a token, checking only its signature and structure
    pub fn decode(&self, token: &str) -> Result<Claims, Rejection> {
        jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| {
                tracing::debug!(%error, "Token decode failed");
                Rejection::Unparsable
            })
    }

    /// Compare issuer and audience; both are required
    pub fn verify_claims(&self, claims: &Claims) -> Result<(), Rejection> {
        if claims.iss.is_empty() || claims.iss != self.issuer {
            return Err(Rejection::InvalidIssuer);
        }
        if claims.aud.is_empty() || claims.aud != self.audience {
            return Err(Rejection::InvalidAudience);
        }
        Ok(())
    }

    /// True when the token decodes and its `expiration` has passed
    pub fn is_expired(&self, token: &str) -> bool {
        self.decode(token)
            .map(|claims| claims.is_expired_at(Utc::now()))
            .unwrap_or(false)
    }
}

/// Standalone expiration check for a raw token string
///
/// Undecodable tokens and tokens without an `expiration` claim report
/// `false`.
pub fn is_token_expired(token: &str, config: &AuthConfig) -> bool {
    ClaimsVerifier::new(config).is_expired(token)
}
