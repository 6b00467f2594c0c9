//! Mock dictionary for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use lingolife_core::traits::{DictionaryEntry, DictionaryLookup, EntrySource};

use crate::error::DictionaryError;

/// A dictionary that answers from a fixed table, for exercising callers
/// without network access.
#[derive(Default)]
pub struct MockDictionary {
    /// Lowercased term → entry.
    entries: HashMap<String, DictionaryEntry>,
    call_count: AtomicU32,
    last_query: Mutex<Option<String>>,
}

impl MockDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry with the given translation and definition.
    pub fn with_entry(mut self, term: &str, translation: &str, definition: &str) -> Self {
        let entry = DictionaryEntry {
            term: term.to_string(),
            phonetic: String::new(),
            uk_phonetic: String::new(),
            us_phonetic: String::new(),
            part_of_speech: String::new(),
            translation: translation.to_string(),
            definition: definition.to_string(),
            examples: Vec::new(),
            source: EntrySource::Dictionary,
        };
        self.entries.insert(term.to_lowercase(), entry);
        self
    }

    /// Number of lookups made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last query received, trimmed.
    pub fn last_query(&self) -> Option<String> {
        self.last_query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl DictionaryLookup for MockDictionary {
    fn name(&self) -> &str {
        "youdao"
    }

    async fn lookup(&self, term: &str) -> anyhow::Result<DictionaryEntry> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let q = term.trim();
        *self.last_query.lock().unwrap_or_else(|e| e.into_inner()) = Some(q.to_string());

        if q.is_empty() {
            return Err(DictionaryError::MissingQuery.into());
        }
        self.entries
            .get(&q.to_lowercase())
            .cloned()
            .ok_or_else(|| DictionaryError::NoResult.into())
    }
}
