//! The signed-in account, remembered between invocations.

use anyhow::Result;

use lingolife_core::model::{PublicUser, UserId};
use lingolife_core::traits::KeyValueStore;

pub const TOKEN_KEY: &str = "lingolife_token";
pub const USER_KEY: &str = "lingolife_user";

/// A token and the user it was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSession {
    pub token: String,
    pub user: PublicUser,
}

impl SavedSession {
    pub fn user_id(&self) -> UserId {
        UserId::normalize(Some(&self.user.id))
    }
}

/// Reads and writes the saved session in client-local storage.
pub struct SessionStore<K> {
    store: K,
}

impl<K: KeyValueStore> SessionStore<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    pub fn save(&self, token: &str, user: &PublicUser) -> Result<()> {
        self.store.set(TOKEN_KEY, token)?;
        self.store.set(USER_KEY, &serde_json::to_string(user)?)?;
        Ok(())
    }

    /// The saved session, if both halves are present.
    ///
    /// A saved user that no longer parses clears the whole session.
    pub fn load(&self) -> Result<Option<SavedSession>> {
        let (Some(token), Some(raw_user)) = (self.store.get(TOKEN_KEY)?, self.store.get(USER_KEY)?)
        else {
            return Ok(None);
        };
        match serde_json::from_str::<PublicUser>(&raw_user) {
            Ok(user) => Ok(Some(SavedSession { token, user })),
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupt saved session");
                self.clear()?;
                Ok(None)
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.delete(TOKEN_KEY)?;
        self.store.delete(USER_KEY)?;
        Ok(())
    }
}
