//! Account service
//!
//! Registration and login for email/password accounts.

use std::sync::Arc;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{Claims, issue_token};
use crate::config::AuthConfig;
use crate::data::{Database, User};
use crate::error::AppError;
use crate::metrics::USERS_TOTAL;

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    auth: AuthConfig,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>, auth: AuthConfig) -> Self {
        Self { db, auth }
    }

    /// Register a new account
    ///
    /// # Errors
    /// - `Validation` if email or password is empty
    /// - `Conflict` if the email is already registered
    pub async fn signup(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "email and password are required".to_string(),
            ));
        }

        if self.db.get_user_by_email(email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let cost = self.auth.bcrypt_cost;
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

        // A concurrent signup can still win the race; the unique index reports it as Conflict
        let user = User::new(email.to_string(), password_hash);
        self.db.insert_user(&user).await?;

        USERS_TOTAL.set(self.db.count_users().await?);
        tracing::info!(user_id = %user.id, "Account created");

        Ok(user)
    }

    /// Check credentials and issue a signed token
    ///
    /// # Errors
    /// - `Validation` if email or password is empty
    /// - `InvalidCredentials` for an unknown email or a wrong password
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let user = self
            .db
            .get_user_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_string();
        let stored_hash = user.password.clone();
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
                .await
                .map_err(|e| AppError::Internal(e.into()))?;

        if !matches {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        let claims = Claims::for_user(&user, &self.auth);
        let token = issue_token(&claims, &self.auth.jwt_secret)?;

        tracing::info!(user_id = %user.id, jti = %claims.jti, "Token issued");
        Ok(token)
    }
}
