//! Remote relational backend.
//!
//! Talks to a Postgres database through its PostgREST interface (the REST
//! layer Supabase exposes at `/rest/v1`). Tables and the
//! `record_word_outcome` function are defined in `migrations/001_init.sql`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use lingolife_core::error::{StoreError, StoreResult};
use lingolife_core::model::{NewUser, User, UserId, Word, WordDraft};
use lingolife_core::traits::{UserStore, WordRepository};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Postgres: unique_violation.
const PG_UNIQUE_VIOLATION: &str = "23505";
/// Postgres: invalid_text_representation (e.g. a malformed uuid).
const PG_INVALID_TEXT: &str = "22P02";

/// Shared HTTP plumbing for the PostgREST endpoints.
#[derive(Clone)]
pub struct PostgrestClient {
    rest_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for PostgrestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestClient")
            .field("rest_url", &self.rest_url)
            .field("api_key", &"***")
            .finish()
    }
}

/// Error body PostgREST returns on 4xx/5xx.
#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Failure of one PostgREST call, before it is given a store meaning.
#[derive(Debug)]
enum CallError {
    Network(String),
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

impl CallError {
    fn code(&self) -> Option<&str> {
        match self {
            CallError::Api { code, .. } => code.as_deref(),
            CallError::Network(_) => None,
        }
    }
}

impl From<CallError> for StoreError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Network(msg) => StoreError::Unavailable(msg),
            CallError::Api { code, message, .. }
                if code.as_deref() == Some(PG_UNIQUE_VIOLATION) =>
            {
                StoreError::Conflict(message)
            }
            CallError::Api {
                status, message, ..
            } => StoreError::Unavailable(format!("HTTP {status}: {message}")),
        }
    }
}

impl PostgrestClient {
    /// `base_url` is the project URL; `/rest/v1` is appended.
    pub fn new(base_url: &str, api_key: &str) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn get(&self, table: &str) -> RequestBuilder {
        self.authorized(self.client.get(format!("{}/{table}", self.rest_url)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.post(format!("{}/{path}", self.rest_url)))
            .header("Prefer", "return=representation")
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, CallError> {
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                CallError::Network(format!("request timed out after {DEFAULT_TIMEOUT_SECS}s"))
            } else {
                CallError::Network(e.to_string())
            }
        })?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CallError> {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            let body: PostgrestErrorBody = serde_json::from_str(&text).unwrap_or_default();
            return Err(CallError::Api {
                status: status.as_u16(),
                code: body.code,
                message: body.message.unwrap_or(text),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return serde_json::from_str("[]").map_err(|e| CallError::Network(e.to_string()));
        }
        response.json().await.map_err(|e| CallError::Api {
            status: 0,
            code: None,
            message: format!("failed to parse response: {e}"),
        })
    }
}

/// Quote a value for use inside a PostgREST `or=(...)` filter.
fn quote_filter_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[derive(Serialize)]
struct WordInsert<'a> {
    user_id: &'a str,
    term: &'a str,
    translation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phonetic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    part_of_speech: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    definition: Option<&'a str>,
    known_count: u32,
    unknown_count: u32,
}

impl<'a> WordInsert<'a> {
    fn new(user_id: &'a UserId, draft: &'a WordDraft) -> Self {
        Self {
            user_id: user_id.as_str(),
            term: &draft.term,
            translation: &draft.translation,
            phonetic: draft.phonetic.as_deref(),
            part_of_speech: draft.part_of_speech.as_deref(),
            definition: draft.definition.as_deref(),
            known_count: 0,
            unknown_count: 0,
        }
    }
}

#[derive(Serialize)]
struct OutcomeCall<'a> {
    p_word_id: &'a str,
    p_user_id: &'a str,
    p_known: bool,
}

/// Words stored in the `words` table.
#[derive(Debug, Clone)]
pub struct PostgrestWordStore {
    client: PostgrestClient,
}

impl PostgrestWordStore {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }

    /// Insert the sample words for the default user if the table is empty.
    /// Returns how many were inserted.
    pub async fn seed_if_empty(&self, samples: Vec<WordDraft>) -> StoreResult<usize> {
        let existing: Vec<serde_json::Value> = PostgrestClient::send(
            self.client
                .get("words")
                .query(&[("select", "id"), ("limit", "1")]),
        )
        .await?;
        if !existing.is_empty() {
            tracing::info!("words table already has data, skipping sample data");
            return Ok(0);
        }

        let user = UserId::default_user();
        let mut inserted = 0;
        for draft in samples {
            match self.create_word(&user, draft.clone()).await {
                Ok(_) => {
                    inserted += 1;
                    tracing::info!(term = %draft.term, "added sample word");
                }
                Err(e) => tracing::warn!(term = %draft.term, error = %e, "failed to add sample word"),
            }
        }
        Ok(inserted)
    }
}

#[async_trait]
impl WordRepository for PostgrestWordStore {
    fn backend(&self) -> &str {
        "postgrest"
    }

    #[instrument(skip(self), fields(user = %user_id))]
    async fn list_words(&self, user_id: &UserId) -> StoreResult<Vec<Word>> {
        let user_filter = format!("eq.{}", user_id.as_str());
        let words: Vec<Word> = PostgrestClient::send(self.client.get("words").query(&[
            ("select", "*"),
            ("user_id", user_filter.as_str()),
            ("order", "created_at.desc"),
        ]))
        .await?;
        Ok(words)
    }

    #[instrument(skip(self, draft), fields(user = %user_id))]
    async fn create_word(&self, user_id: &UserId, draft: WordDraft) -> StoreResult<Word> {
        let draft = draft.validate()?;
        let rows: Vec<Word> = PostgrestClient::send(
            self.client
                .post("words")
                .json(&WordInsert::new(user_id, &draft)),
        )
        .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Unavailable("insert returned no row".into()))
    }

    #[instrument(skip(self), fields(user = %user_id))]
    async fn record_outcome(
        &self,
        user_id: &UserId,
        word_id: &str,
        known: bool,
    ) -> StoreResult<Word> {
        let call = OutcomeCall {
            p_word_id: word_id,
            p_user_id: user_id.as_str(),
            p_known: known,
        };
        let rows: Vec<Word> =
            match PostgrestClient::send(self.client.post("rpc/record_word_outcome").json(&call))
                .await
            {
                Ok(rows) => rows,
                // A malformed id cannot name an existing word.
                Err(e) if e.code() == Some(PG_INVALID_TEXT) => {
                    return Err(StoreError::word_not_found(word_id))
                }
                Err(e) => return Err(e.into()),
            };
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::word_not_found(word_id))
    }
}

#[derive(Serialize)]
struct UserInsert<'a> {
    username: &'a str,
    email: &'a str,
    password_hash: &'a str,
}

/// Accounts stored in the `users` table.
#[derive(Debug, Clone)]
pub struct PostgrestUserStore {
    client: PostgrestClient,
}

impl PostgrestUserStore {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserStore for PostgrestUserStore {
    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let filter = format!("eq.{username}");
        let users: Vec<User> = PostgrestClient::send(self.client.get("users").query(&[
            ("select", "*"),
            ("username", filter.as_str()),
            ("limit", "1"),
        ]))
        .await?;
        Ok(users.into_iter().next())
    }

    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let or_filter = format!(
            "(username.eq.{},email.eq.{})",
            quote_filter_value(&new_user.username),
            quote_filter_value(&new_user.email)
        );
        let existing: Vec<serde_json::Value> = PostgrestClient::send(
            self.client
                .get("users")
                .query(&[("select", "id"), ("or", or_filter.as_str())]),
        )
        .await?;
        if !existing.is_empty() {
            return Err(StoreError::Conflict("Username or email already exists".into()));
        }

        let insert = UserInsert {
            username: &new_user.username,
            email: &new_user.email,
            password_hash: &new_user.password_hash,
        };
        let rows: Vec<User> =
            match PostgrestClient::send(self.client.post("users").json(&insert)).await {
                Ok(rows) => rows,
                // Lost a race with a concurrent registration.
                Err(e) if e.code() == Some(PG_UNIQUE_VIOLATION) => {
                    return Err(StoreError::Conflict("Username or email already exists".into()))
                }
                Err(e) => return Err(e.into()),
            };
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Unavailable("insert returned no row".into()))
    }
}
