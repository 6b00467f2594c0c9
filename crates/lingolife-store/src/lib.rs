//! lingolife-store: persistence backends.
//!
//! Two interchangeable word/user backends: a remote relational store reached
//! through PostgREST, and an in-memory fallback seeded with sample words.
//! Also provides the file-backed key-value store used by the client.

pub mod file_kv;
pub mod memory;
pub mod postgrest;

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use lingolife_core::traits::{UserStore, WordRepository};

pub use file_kv::JsonFileKvStore;
pub use memory::{sample_words, InMemoryUserStore, InMemoryWordStore};
pub use postgrest::{PostgrestClient, PostgrestUserStore, PostgrestWordStore};

/// Connection settings for the relational backend.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: Option<String>,
    /// Service-role or anon key sent as `apikey` and bearer token.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Insert the sample words when the remote table is empty.
    #[serde(default = "default_true")]
    pub seed_samples: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            seed_samples: true,
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("seed_samples", &self.seed_samples)
            .finish()
    }
}

impl StoreConfig {
    /// URL and key, when both are set and non-empty.
    pub fn remote(&self) -> Option<(&str, &str)> {
        let url = self.url.as_deref().filter(|s| !s.trim().is_empty())?;
        let key = self.api_key.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((url, key))
    }
}

/// Which backend ended up serving requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Remote,
    Memory,
}

/// The word and user stores of one backend.
#[derive(Clone)]
pub struct Backend {
    pub kind: BackendKind,
    pub words: Arc<dyn WordRepository>,
    pub users: Arc<dyn UserStore>,
}

impl Backend {
    /// Seeded in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            kind: BackendKind::Memory,
            words: Arc::new(InMemoryWordStore::seeded()),
            users: Arc::new(InMemoryUserStore::new()),
        }
    }
}

/// Pick a backend from configuration.
///
/// Uses the relational store when URL and key are configured, otherwise the
/// in-memory fallback. Seeding failures on the remote store are logged and do
/// not prevent startup.
pub async fn open_backend(config: &StoreConfig) -> Result<Backend> {
    let Some((url, key)) = config.remote() else {
        tracing::warn!("no database credentials configured, using in-memory storage");
        return Ok(Backend::in_memory());
    };

    let client = PostgrestClient::new(url, key)?;
    let words = PostgrestWordStore::new(client.clone());
    if config.seed_samples {
        match words.seed_if_empty(sample_words()).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(inserted = n, "seeded sample words"),
            Err(e) => tracing::warn!(error = %e, "could not seed sample words"),
        }
    }
    tracing::info!(url, "using remote database");

    Ok(Backend {
        kind: BackendKind::Remote,
        words: Arc::new(words),
        users: Arc::new(PostgrestUserStore::new(client)),
    })
}
