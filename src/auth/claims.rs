//! Token claims and issuance
//!
//! Tokens are HS256-signed JWTs. Besides the registered `aud`, `jti`,
//! `iat` and `iss` claims they carry the caller identity and an optional
//! explicit `expiration` timestamp that is independent of any `exp` claim.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::data::{EntityId, User};
use crate::error::AppError;

/// Scope granted to every logged-in account
pub const USER_SCOPE: &str = "user";
const DEFAULT_SUBSCRIBER_TYPE: &str = "free";
const DEFAULT_SUBSCRIPTION_LEVEL: &str = "none";

/// Verified payload of a bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub aud: String,
    #[serde(default)]
    pub jti: String,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user_id: String,
    /// Explicit expiry; `None` means the token never expires
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscriber_type: String,
    #[serde(default)]
    pub subscription_level: String,
}

impl Claims {
    /// Build the claim set for a freshly authenticated user
    pub fn for_user(user: &User, config: &AuthConfig) -> Self {
        let now = Utc::now();
        Self {
            aud: config.jwt_audience.clone(),
            jti: EntityId::new().0,
            iat: now.timestamp(),
            iss: config.jwt_issuer.clone(),
            scope: USER_SCOPE.to_string(),
            email: user.email.clone(),
            user_id: user.id.clone(),
            expiration: config
                .token_ttl_seconds
                .map(|ttl| now + Duration::seconds(ttl)),
            subscriber_type: DEFAULT_SUBSCRIBER_TYPE.to_string(),
            subscription_level: DEFAULT_SUBSCRIPTION_LEVEL.to_string(),
        }
    }

    /// True when the explicit expiration lies before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|expiration| expiration < now)
    }
}

/// Sign claims with the shared secret
pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, AppError> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.into()))
}
