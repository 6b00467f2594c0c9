//! `/api/auth` handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use lingolife_core::model::{NewUser, PublicUser};

use crate::auth::{
    hash_password, verify_dummy_password, verify_password, AuthError, AuthUser, MIN_PASSWORD_LEN,
};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(body) = body?;
    let username = body.username.trim().to_string();
    let email = body.email.trim().to_string();
    if username.is_empty() || email.is_empty() || body.password.is_empty() {
        return Err(AuthError::Validation(
            "Username, email, and password are required".into(),
        )
        .into());
    }
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .into());
    }

    let password = body.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))??;

    let user = state
        .users
        .create_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to create user"))?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    let token = state.tokens.issue(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".into(),
            user: user.public(),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(body) = body?;
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AuthError::Validation("Username and password are required".into()).into());
    }

    let user = state
        .users
        .find_by_username(body.username.trim())
        .await
        .map_err(|e| ApiError::from_store(e, "Internal server error"))?;

    // Unknown users still pay for a full hash check.
    let password = body.password;
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let valid = tokio::task::spawn_blocking(move || match stored {
        Some(stored) => verify_password(&password, &stored),
        None => verify_dummy_password(&password),
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?;

    let user = match user {
        Some(user) if valid => user,
        Some(user) => {
            tracing::debug!(username = %user.username, "password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }
        None => return Err(AuthError::InvalidCredentials.into()),
    };

    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token: state.tokens.issue(&user)?,
        user: user.public(),
    }))
}

pub async fn me(AuthUser(claims): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: claims.user(),
    })
}
