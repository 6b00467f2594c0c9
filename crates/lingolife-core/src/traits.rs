//! Core trait definitions for stores, dictionaries, and client-local state.
//!
//! These async traits are implemented by the `lingolife-store`,
//! `lingolife-dictionary`, and `lingolife-cli` crates respectively.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::model::{NewUser, User, UserId, Word, WordDraft, REVIEW_CANDIDATE_CAP};

// ---------------------------------------------------------------------------
// Word repository
// ---------------------------------------------------------------------------

/// Per-user storage of vocabulary words.
///
/// Every backend must honour the same contract: `list_words` is newest-first
/// by creation time, `create_word` validates and zeroes the counters, and
/// `record_outcome` increments exactly one counter by exactly one.
#[async_trait]
pub trait WordRepository: Send + Sync {
    /// Backend name for logs (e.g. "memory").
    fn backend(&self) -> &str;

    /// All words owned by the user, newest first.
    async fn list_words(&self, user_id: &UserId) -> StoreResult<Vec<Word>>;

    /// Validate and persist a new word.
    async fn create_word(&self, user_id: &UserId, draft: WordDraft) -> StoreResult<Word>;

    /// Record one review outcome and stamp `last_reviewed_at`.
    async fn record_outcome(&self, user_id: &UserId, word_id: &str, known: bool)
        -> StoreResult<Word>;

    /// Up to [`REVIEW_CANDIDATE_CAP`] words in `list_words` order.
    ///
    /// No review-history filtering happens here; that belongs to the
    /// review session.
    async fn fetch_review_candidates(&self, user_id: &UserId) -> StoreResult<Vec<Word>> {
        let mut words = self.list_words(user_id).await?;
        words.truncate(REVIEW_CANDIDATE_CAP);
        Ok(words)
    }
}

#[async_trait]
impl<T: WordRepository + ?Sized> WordRepository for Arc<T> {
    fn backend(&self) -> &str {
        (**self).backend()
    }

    async fn list_words(&self, user_id: &UserId) -> StoreResult<Vec<Word>> {
        (**self).list_words(user_id).await
    }

    async fn create_word(&self, user_id: &UserId, draft: WordDraft) -> StoreResult<Word> {
        (**self).create_word(user_id, draft).await
    }

    async fn record_outcome(
        &self,
        user_id: &UserId,
        word_id: &str,
        known: bool,
    ) -> StoreResult<Word> {
        (**self).record_outcome(user_id, word_id, known).await
    }

    async fn fetch_review_candidates(&self, user_id: &UserId) -> StoreResult<Vec<Word>> {
        (**self).fetch_review_candidates(user_id).await
    }
}

// ---------------------------------------------------------------------------
// User store
// ---------------------------------------------------------------------------

/// Account storage used by the auth service.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look a user up by exact username.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Create a user; fails with `Conflict` if the username or email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
}

// ---------------------------------------------------------------------------
// Dictionary lookup
// ---------------------------------------------------------------------------

/// A dictionary service that turns a term into one normalized entry.
#[async_trait]
pub trait DictionaryLookup: Send + Sync {
    /// Human-readable provider name (e.g. "youdao").
    fn name(&self) -> &str;

    /// Look up a term. Every call is a fresh round trip; nothing is cached.
    async fn lookup(&self, term: &str) -> anyhow::Result<DictionaryEntry>;
}

/// Where a dictionary entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// The free dictionary query.
    Dictionary,
    /// The signed translation API fallback.
    Translation,
}

/// Normalized dictionary result, independent of the provider's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// The query with its first letter capitalised.
    pub term: String,
    pub phonetic: String,
    pub uk_phonetic: String,
    pub us_phonetic: String,
    pub part_of_speech: String,
    pub translation: String,
    pub definition: String,
    #[serde(default)]
    pub examples: Vec<WebExample>,
    pub source: EntrySource,
}

impl DictionaryEntry {
    /// Whether the entry carries anything worth saving.
    pub fn is_usable(&self) -> bool {
        !self.translation.is_empty() || !self.definition.is_empty()
    }

    /// The draft a client would save for this entry.
    pub fn to_draft(&self) -> WordDraft {
        WordDraft::new(self.term.clone(), self.translation.clone())
            .with_phonetic(self.phonetic.clone())
            .with_part_of_speech(self.part_of_speech.clone())
            .with_definition(self.definition.clone())
    }
}

/// A web phrase and its translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebExample {
    pub key: String,
    pub value: Vec<String>,
}

// ---------------------------------------------------------------------------
// Client-local key-value state
// ---------------------------------------------------------------------------

/// Durable client-local string storage (the browser's localStorage, a file).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    fn delete(&self, key: &str) -> anyhow::Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        (**self).delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(translation: &str, definition: &str) -> DictionaryEntry {
        DictionaryEntry {
            term: "Ephemeral".into(),
            phonetic: "[ɪˈfemərəl]".into(),
            uk_phonetic: String::new(),
            us_phonetic: String::new(),
            part_of_speech: "adj".into(),
            translation: translation.into(),
            definition: definition.into(),
            examples: vec![],
            source: EntrySource::Dictionary,
        }
    }

    #[test]
    fn usable_needs_translation_or_definition() {
        assert!(entry("短暂的", "").is_usable());
        assert!(entry("", "adj. 短暂的").is_usable());
        assert!(!entry("", "").is_usable());
    }

    #[test]
    fn entry_to_draft() {
        let draft = entry("短暂的", "adj. 短暂的；朝生暮死的").to_draft();
        assert_eq!(draft.term, "Ephemeral");
        assert_eq!(draft.translation, "短暂的");
        assert_eq!(draft.part_of_speech.as_deref(), Some("adj"));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn source_serializes_lowercase() {
        let json = serde_json::to_string(&EntrySource::Translation).unwrap();
        assert_eq!(json, "\"translation\"");
    }
}
