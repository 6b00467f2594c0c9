//! Shared request state.

use std::sync::Arc;

use lingolife_core::traits::{DictionaryLookup, UserStore, WordRepository};
use lingolife_store::Backend;

use crate::auth::TokenKeys;

/// Everything a handler needs, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub words: Arc<dyn WordRepository>,
    pub users: Arc<dyn UserStore>,
    pub dictionary: Arc<dyn DictionaryLookup>,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(backend: Backend, dictionary: Arc<dyn DictionaryLookup>, tokens: TokenKeys) -> Self {
        Self {
            words: backend.words,
            users: backend.users,
            dictionary,
            tokens: Arc::new(tokens),
        }
    }
}
