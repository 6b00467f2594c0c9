//! In-memory fallback backend.
//!
//! Used when no relational store is configured. Words live in a map keyed by
//! id and are seeded with two sample words for the default user; everything
//! is lost when the process exits.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use lingolife_core::error::{StoreError, StoreResult};
use lingolife_core::model::{NewUser, User, UserId, Word, WordDraft};
use lingolife_core::traits::{UserStore, WordRepository};

/// The sample words every fresh store starts with, in creation order.
pub fn sample_words() -> Vec<WordDraft> {
    vec![
        WordDraft::new("word", "词；话语；诺言")
            .with_phonetic("/wɜːrd/")
            .with_part_of_speech("noun")
            .with_definition(
                "A single distinct meaningful element of speech or writing, used with others to form a sentence.",
            ),
        WordDraft::new("super", "超级的；极好的")
            .with_phonetic("/ˈsuːpər/")
            .with_part_of_speech("adjective")
            .with_definition("Better, greater, or larger than average or standard."),
    ]
}

struct StoredWord {
    /// Insertion order, breaks ties between equal timestamps.
    seq: u64,
    word: Word,
}

#[derive(Default)]
struct WordTable {
    words: HashMap<String, StoredWord>,
    next_seq: u64,
}

impl WordTable {
    fn insert(&mut self, word: Word) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.words.insert(word.id.clone(), StoredWord { seq, word });
    }
}

/// Word storage in process memory.
#[derive(Default)]
pub struct InMemoryWordStore {
    table: RwLock<WordTable>,
}

impl InMemoryWordStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the sample words under the default user, with ids
    /// `"1"` and `"2"` and some review history.
    pub fn seeded() -> Self {
        let store = Self::new();
        let user = UserId::default_user();
        let now = Utc::now();
        let history = [(5, 1), (3, 0)];
        {
            let mut table = store.write();
            for (i, (draft, (known, unknown))) in
                sample_words().into_iter().zip(history).enumerate()
            {
                let mut word = Word::from_draft((i + 1).to_string(), &user, draft, now);
                word.known_count = known;
                word.unknown_count = unknown;
                table.insert(word);
            }
        }
        store
    }

    /// Total number of words across all users.
    pub fn len(&self) -> usize {
        self.read().words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, WordTable> {
        self.table.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, WordTable> {
        self.table.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl WordRepository for InMemoryWordStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn list_words(&self, user_id: &UserId) -> StoreResult<Vec<Word>> {
        let table = self.read();
        let mut owned: Vec<&StoredWord> = table
            .words
            .values()
            .filter(|s| s.word.user_id == user_id.as_str())
            .collect();
        owned.sort_by(|a, b| {
            b.word
                .created_at
                .cmp(&a.word.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(owned.into_iter().map(|s| s.word.clone()).collect())
    }

    async fn create_word(&self, user_id: &UserId, draft: WordDraft) -> StoreResult<Word> {
        let draft = draft.validate()?;
        let word = Word::from_draft(Uuid::new_v4().to_string(), user_id, draft, Utc::now());
        self.write().insert(word.clone());
        tracing::debug!(word_id = %word.id, user = %user_id, "word created");
        Ok(word)
    }

    async fn record_outcome(
        &self,
        user_id: &UserId,
        word_id: &str,
        known: bool,
    ) -> StoreResult<Word> {
        let mut table = self.write();
        let stored = table
            .words
            .get_mut(word_id)
            .filter(|s| s.word.user_id == user_id.as_str())
            .ok_or_else(|| StoreError::word_not_found(word_id))?;
        stored.word.apply_outcome(known, Utc::now());
        Ok(stored.word.clone())
    }
}

/// Account storage in process memory.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        if users
            .iter()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(StoreError::Conflict("Username or email already exists".into()));
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_store_serves_default_user() {
        let store = InMemoryWordStore::seeded();
        let words = store.list_words(&UserId::from("default_user")).await.unwrap();
        let terms: Vec<&str> = words.iter().map(|w| w.term.as_str()).collect();
        assert_eq!(terms, vec!["super", "word"]);
        assert_eq!(words[1].id, "1");
        assert_eq!((words[1].known_count, words[1].unknown_count), (5, 1));

        let other = store.list_words(&UserId::from("someone")).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn outcome_is_scoped_to_owner() {
        let store = InMemoryWordStore::seeded();
        let err = store
            .record_outcome(&UserId::from("intruder"), "1", true)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let word = store
            .record_outcome(&UserId::default_user(), "1", true)
            .await
            .unwrap();
        assert_eq!(word.known_count, 6);
    }

    #[tokio::test]
    async fn concurrent_outcomes_are_not_lost() {
        let store = std::sync::Arc::new(InMemoryWordStore::seeded());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .record_outcome(&UserId::default_user(), "2", i % 2 == 0)
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let words = store.list_words(&UserId::default_user()).await.unwrap();
        let super_word = words.iter().find(|w| w.id == "2").unwrap();
        assert_eq!(super_word.review_count(), 3 + 50);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let users = InMemoryUserStore::new();
        let new = |u: &str, e: &str| NewUser {
            username: u.into(),
            email: e.into(),
            password_hash: "hash".into(),
        };
        users.create_user(new("alice", "a@x.io")).await.unwrap();
        assert!(matches!(
            users.create_user(new("alice", "other@x.io")).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            users.create_user(new("bob", "a@x.io")).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(users.find_by_username("alice").await.unwrap().is_some());
        assert!(users.find_by_username("carol").await.unwrap().is_none());
    }
}
