//! HTTP client for the lingolife API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use lingolife_core::error::{StoreError, StoreResult};
use lingolife_core::model::{PublicUser, UserId, Word, WordDraft};
use lingolife_core::traits::{DictionaryEntry, WordRepository};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Failures talking to the API server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error body.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot reach server: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map onto the repository taxonomy, for use behind [`WordRepository`].
    fn into_store_error(self) -> StoreError {
        match self {
            ClientError::Api { status: 400, message } => StoreError::Validation(message),
            ClientError::Api { status: 409, message } => StoreError::Conflict(message),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Response of register and login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Deserialize)]
struct MeResponse {
    user: PublicUser,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateWordBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(flatten)]
    draft: &'a WordDraft,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeBody<'a> {
    known: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

/// A client for one server, optionally signed in.
///
/// Note: Custom Debug impl masks the bearer token to prevent accidental
/// exposure in logs.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// The `userId` to send: none when a token already identifies us.
    fn user_param<'a>(&self, user_id: &'a UserId) -> Option<&'a str> {
        if self.is_signed_in() {
            None
        } else {
            Some(user_id.as_str())
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(DEFAULT_TIMEOUT_SECS)
            } else {
                ClientError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("HTTP {}: {text}", status.as_u16()));
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    // -- Accounts --------------------------------------------------------

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ClientError> {
        let body = serde_json::json!({ "username": username, "email": email, "password": password });
        self.send(self.request(Method::POST, "/api/auth/register").json(&body))
            .await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = serde_json::json!({ "username": username, "password": password });
        self.send(self.request(Method::POST, "/api/auth/login").json(&body))
            .await
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        let me: MeResponse = self.send(self.request(Method::GET, "/api/auth/me")).await?;
        Ok(me.user)
    }

    // -- Dictionary ------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn lookup(&self, term: &str) -> Result<DictionaryEntry, ClientError> {
        self.send(
            self.request(Method::GET, "/api/dictionary/youdao")
                .query(&[("q", term)]),
        )
        .await
    }

    // -- Words -----------------------------------------------------------

    pub async fn words(&self, user_id: &UserId) -> Result<Vec<Word>, ClientError> {
        let mut req = self.request(Method::GET, "/api/words");
        if let Some(id) = self.user_param(user_id) {
            req = req.query(&[("userId", id)]);
        }
        self.send(req).await
    }

    pub async fn review_words(&self, user_id: &UserId) -> Result<Vec<Word>, ClientError> {
        let mut req = self.request(Method::GET, "/api/words/review");
        if let Some(id) = self.user_param(user_id) {
            req = req.query(&[("userId", id)]);
        }
        self.send(req).await
    }

    pub async fn add_word(&self, user_id: &UserId, draft: &WordDraft) -> Result<Word, ClientError> {
        let body = CreateWordBody {
            user_id: self.user_param(user_id),
            draft,
        };
        self.send(self.request(Method::POST, "/api/words").json(&body))
            .await
    }

    pub async fn update_word(
        &self,
        user_id: &UserId,
        word_id: &str,
        known: bool,
    ) -> Result<Word, ClientError> {
        let body = OutcomeBody {
            known,
            user_id: self.user_param(user_id),
        };
        self.send(
            self.request(Method::PUT, &format!("/api/words/{word_id}"))
                .json(&body),
        )
        .await
    }
}

#[async_trait]
impl WordRepository for ApiClient {
    fn backend(&self) -> &str {
        "http"
    }

    async fn list_words(&self, user_id: &UserId) -> StoreResult<Vec<Word>> {
        self.words(user_id)
            .await
            .map_err(ClientError::into_store_error)
    }

    async fn create_word(&self, user_id: &UserId, draft: WordDraft) -> StoreResult<Word> {
        self.add_word(user_id, &draft)
            .await
            .map_err(ClientError::into_store_error)
    }

    async fn record_outcome(
        &self,
        user_id: &UserId,
        word_id: &str,
        known: bool,
    ) -> StoreResult<Word> {
        self.update_word(user_id, word_id, known)
            .await
            .map_err(|e| match e.status() {
                Some(404) => StoreError::word_not_found(word_id),
                _ => e.into_store_error(),
            })
    }

    async fn fetch_review_candidates(&self, user_id: &UserId) -> StoreResult<Vec<Word>> {
        self.review_words(user_id)
            .await
            .map_err(ClientError::into_store_error)
    }
}
