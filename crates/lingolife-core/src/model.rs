//! Core data model types for lingolife.
//!
//! Words are exchanged in the snake_case row shape used by the relational
//! store, so the same type serves the database, the HTTP API, and the client.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{StoreError, StoreResult};

/// Identifier clients send when they have no account.
pub const DEFAULT_USER_SENTINEL: &str = "default_user";

/// Canonical id the sentinel is stored under.
pub const DEFAULT_USER_ID: &str = "12345678-1234-1234-1234-123456789012";

/// Maximum number of words handed out for one review session.
pub const REVIEW_CANDIDATE_CAP: usize = 10;

/// A vocabulary entry owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Opaque unique id assigned at creation.
    pub id: String,
    /// Owner.
    pub user_id: String,
    /// Display form of the word.
    pub term: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub phonetic: Option<String>,
    pub translation: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub part_of_speech: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub definition: Option<String>,
    #[serde(default)]
    pub known_count: u32,
    #[serde(default)]
    pub unknown_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl Word {
    /// Build a fresh record from a validated draft.
    pub fn from_draft(
        id: String,
        user_id: &UserId,
        draft: WordDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: user_id.as_str().to_string(),
            term: draft.term,
            phonetic: draft.phonetic,
            translation: draft.translation,
            part_of_speech: draft.part_of_speech,
            definition: draft.definition,
            known_count: 0,
            unknown_count: 0,
            created_at,
            last_reviewed_at: None,
        }
    }

    /// Apply one review outcome: exactly one counter moves by one.
    pub fn apply_outcome(&mut self, known: bool, at: DateTime<Utc>) {
        if known {
            self.known_count += 1;
        } else {
            self.unknown_count += 1;
        }
        self.last_reviewed_at = Some(at);
    }

    /// Total number of recorded outcomes.
    pub fn review_count(&self) -> u32 {
        self.known_count + self.unknown_count
    }
}

/// Input for creating a word. Only `term` and `translation` are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDraft {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub phonetic: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub part_of_speech: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub definition: Option<String>,
}

impl WordDraft {
    pub fn new(term: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            translation: translation.into(),
            ..Default::default()
        }
    }

    pub fn with_phonetic(mut self, phonetic: impl Into<String>) -> Self {
        self.phonetic = non_empty(phonetic.into());
        self
    }

    pub fn with_part_of_speech(mut self, pos: impl Into<String>) -> Self {
        self.part_of_speech = non_empty(pos.into());
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = non_empty(definition.into());
        self
    }

    /// Trim fields and reject drafts without a term or translation.
    pub fn validate(mut self) -> StoreResult<Self> {
        self.term = self.term.trim().to_string();
        self.translation = self.translation.trim().to_string();
        if self.term.is_empty() || self.translation.is_empty() {
            return Err(StoreError::Validation(
                "Term and translation are required".into(),
            ));
        }
        self.phonetic = self.phonetic.and_then(non_empty);
        self.part_of_speech = self.part_of_speech.and_then(non_empty);
        self.definition = self.definition.and_then(non_empty);
        Ok(self)
    }
}

/// A user id after sentinel normalization.
///
/// Absent ids and the `default_user` sentinel both map to
/// [`DEFAULT_USER_ID`], so data written under the sentinel is read back
/// under the sentinel regardless of backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some(DEFAULT_USER_SENTINEL) => Self::default_user(),
            Some(id) => Self(id.to_string()),
        }
    }

    pub fn default_user() -> Self {
        Self(DEFAULT_USER_ID.to_string())
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_USER_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self::normalize(Some(raw))
    }
}

/// A registered account, including its password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The fields safe to send to clients.
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// User fields exposed over the API and saved client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Input for creating a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The relational store keeps `''` for missing optional columns.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(non_empty))
}
