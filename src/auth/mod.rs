//! JWT authentication
//!
//! Handles:
//! - Token issuance on login
//! - Bearer token verification
//! - Password hashing
//! - Authentication middleware

pub mod claims;
mod middleware;
pub mod password;
pub mod verifier;

pub use claims::{Claims, issue_token};
pub use middleware::{CurrentUser, require_auth};
pub use verifier::{ClaimsVerifier, Rejection, is_token_expired, token_from_header};
