//! Subcommand implementations.

pub mod account;
pub mod init;
pub mod lookup;
pub mod review;
pub mod serve;
pub mod stats;
pub mod words;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use lingolife_core::model::UserId;
use lingolife_store::JsonFileKvStore;

use crate::client::ApiClient;
use crate::session::{SavedSession, SessionStore};

const STATE_FILE: &str = "state.json";

/// `~/.config/lingolife/state.json`, or `./.lingolife-state.json` without a home.
pub fn default_state_path() -> PathBuf {
    lingolife_server::config::config_dir()
        .map(|dir| dir.join(STATE_FILE))
        .unwrap_or_else(|| PathBuf::from(".lingolife-state.json"))
}

/// What every client command needs: the server and local state.
pub struct ClientContext {
    pub api_url: String,
    pub state: Arc<JsonFileKvStore>,
}

impl ClientContext {
    pub fn open(api_url: String, state_path: Option<PathBuf>) -> Result<Self> {
        let path = state_path.unwrap_or_else(default_state_path);
        let state = JsonFileKvStore::open(&path)?;
        tracing::debug!(state = %path.display(), api_url = %api_url, "client context ready");
        Ok(Self {
            api_url,
            state: Arc::new(state),
        })
    }

    pub fn sessions(&self) -> SessionStore<Arc<JsonFileKvStore>> {
        SessionStore::new(Arc::clone(&self.state))
    }

    pub fn saved_session(&self) -> Result<Option<SavedSession>> {
        self.sessions().load()
    }

    /// A client signed in as the saved user, or an anonymous one acting as
    /// the default user.
    pub fn client(&self) -> Result<(ApiClient, UserId)> {
        match self.saved_session()? {
            Some(session) => {
                let user = session.user_id();
                Ok((ApiClient::new(&self.api_url, Some(session.token))?, user))
            }
            None => Ok((ApiClient::new(&self.api_url, None)?, UserId::default_user())),
        }
    }
}
