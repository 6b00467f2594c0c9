//! `/api/words` handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use lingolife_core::model::{UserId, Word, WordDraft};

use crate::auth::OptionalUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWordBody {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub draft: WordDraft,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeBody {
    /// Kept loose so a non-boolean gets our own 400 message.
    #[serde(default)]
    pub known: serde_json::Value,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Whose words a request touches.
///
/// A verified token decides; an explicit `userId` naming someone else is
/// refused. Anonymous requests use `userId` or the default user.
pub fn resolve_user(auth: &OptionalUser, requested: Option<&str>) -> Result<UserId, ApiError> {
    let Some(claims) = &auth.0 else {
        return Ok(UserId::normalize(requested));
    };
    let own = UserId::normalize(Some(&claims.user_id));
    match requested.map(str::trim).filter(|r| !r.is_empty()) {
        Some(req) if UserId::normalize(Some(req)) != own => {
            tracing::warn!(token_user = %own, requested = req, "rejected cross-user word access");
            Err(ApiError::forbidden("Cannot access another user's words"))
        }
        _ => Ok(own),
    }
}

pub async fn list_words(
    State(state): State<AppState>,
    auth: OptionalUser,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<Vec<Word>>, ApiError> {
    let Query(query) = query?;
    let user = resolve_user(&auth, query.user_id.as_deref())?;
    let words = state
        .words
        .list_words(&user)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch words"))?;
    Ok(Json(words))
}

pub async fn create_word(
    State(state): State<AppState>,
    auth: OptionalUser,
    body: Result<Json<CreateWordBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Word>), ApiError> {
    let Json(body) = body?;
    let user = resolve_user(&auth, body.user_id.as_deref())?;
    let word = state
        .words
        .create_word(&user, body.draft)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to add word"))?;
    tracing::info!(word_id = %word.id, user = %user, term = %word.term, "word added");
    Ok((StatusCode::CREATED, Json(word)))
}

pub async fn record_outcome(
    State(state): State<AppState>,
    auth: OptionalUser,
    Path(word_id): Path<String>,
    body: Result<Json<OutcomeBody>, JsonRejection>,
) -> Result<Json<Word>, ApiError> {
    let Json(body) = body?;
    let Some(known) = body.known.as_bool() else {
        return Err(ApiError::bad_request("Known status is required (true/false)"));
    };
    let user = resolve_user(&auth, body.user_id.as_deref())?;
    let word = state
        .words
        .record_outcome(&user, &word_id, known)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to update word stats"))?;
    Ok(Json(word))
}

pub async fn review_candidates(
    State(state): State<AppState>,
    auth: OptionalUser,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<Vec<Word>>, ApiError> {
    let Query(query) = query?;
    let user = resolve_user(&auth, query.user_id.as_deref())?;
    let words = state
        .words
        .fetch_review_candidates(&user)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch words for review"))?;
    Ok(Json(words))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;

    fn signed_in(id: &str) -> OptionalUser {
        OptionalUser(Some(Claims {
            user_id: id.into(),
            username: "u".into(),
            email: "u@x".into(),
            iat: 0,
            exp: i64::MAX,
        }))
    }

    #[test]
    fn anonymous_uses_parameter_or_default() {
        let anon = OptionalUser(None);
        assert!(resolve_user(&anon, None).unwrap().is_default());
        assert!(resolve_user(&anon, Some("default_user")).unwrap().is_default());
        assert_eq!(resolve_user(&anon, Some("bob")).unwrap().as_str(), "bob");
    }

    #[test]
    fn token_identity_wins() {
        let alice = signed_in("alice");
        assert_eq!(resolve_user(&alice, None).unwrap().as_str(), "alice");
        assert_eq!(resolve_user(&alice, Some("alice")).unwrap().as_str(), "alice");
        assert_eq!(resolve_user(&alice, Some("  ")).unwrap().as_str(), "alice");
    }

    #[test]
    fn cross_user_access_is_forbidden() {
        let err = resolve_user(&signed_in("alice"), Some("bob")).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }
}
