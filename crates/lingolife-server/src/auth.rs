//! Password hashing, bearer tokens, and the request extractors that read them.
//!
//! Tokens are HS256 JSON Web Tokens carrying the user id, username and
//! email. Passwords are hashed with Argon2id and a random salt.

use std::sync::LazyLock;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lingolife_core::model::{PublicUser, User};

use crate::state::AppState;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

const SALT_SIZE: usize = 16;

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    /// Unknown user and wrong password look the same to the caller.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    /// Whether the caller's input, not the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::Hashing(_) | AuthError::Signing(_))
    }
}

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

/// Hash a password with Argon2id into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| AuthError::Hashing(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// A hash no password is expected to match, for running the verifier when a
/// username does not exist.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hash_password("lingolife-no-such-user").unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to prepare dummy password hash");
        String::new()
    })
});

/// Spend the same Argon2 work as [`verify_password`] against a hash that
/// never belongs to a real user. Always false.
pub fn verify_dummy_password(password: &str) -> bool {
    verify_password(password, &DUMMY_HASH);
    false
}

/// Check a password against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("stored password hash is malformed");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// What a token asserts about its bearer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub email: String,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    pub fn user(&self) -> PublicUser {
        PublicUser {
            id: self.user_id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Signs and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("secret", &"***")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_days: u32) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: chrono::Duration::days(i64::from(ttl_days)),
        }
    }

    /// Issue a token for `user`, valid from now for the configured lifetime.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = chrono::Utc::now();
        self.sign(&Claims {
            user_id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature, algorithm and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::InvalidToken
            })
    }
}

/// The token from an `Authorization: Bearer <token>` header, if any.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.split_once(' ').map(|(_, t)| t.trim())?;
    (!token.is_empty()).then_some(token)
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// A request that must carry a valid token: 401 without one, 403 when it
/// does not verify.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        state.tokens.verify(token).map(AuthUser)
    }
}

/// A request that may carry a token. Absent is fine; present but invalid
/// is rejected with 403.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<Claims>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(OptionalUser(None)),
            Some(token) => state.tokens.verify(token).map(|c| OptionalUser(Some(c))),
        }
    }
}
