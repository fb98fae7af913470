use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    domain::UserId,
    store::{from_document, to_document, Document, DocumentStore, Lookup, USERS},
    Result,
};

/// Persisted bookkeeping for anyone who has issued a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_moderator: bool,
    #[serde(default)]
    pub num_commands: u64,
}

impl UserRecord {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
            is_moderator: false,
            num_commands: 0,
        }
    }
}

/// Tracks users in the `users` collection.
///
/// `ensure_user`, `set_moderator` and `ensure_admin` are find-then-write.
/// Two concurrent callers can both miss and both insert; callers that need a
/// single record per user must not run them concurrently for the same id.
#[derive(Clone)]
pub struct UserRegistry {
    store: Arc<dyn DocumentStore>,
}

fn key(user_id: UserId) -> Document {
    let mut q = Document::new();
    q.insert("user_id".to_string(), Value::from(user_id.0));
    q
}

impl UserRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        self.store
            .find_one(USERS, &Lookup::Match(key(user_id)))
            .await?
            .map(from_document::<UserRecord>)
            .transpose()
    }

    /// Return the user's record, creating a default one on first sight.
    pub async fn ensure_user(&self, user_id: UserId) -> Result<UserRecord> {
        if let Some(existing) = self.find(user_id).await? {
            return Ok(existing);
        }
        let record = UserRecord::new(user_id);
        self.store.insert(USERS, to_document(&record)?).await?;
        debug!(user_id = user_id.0, "created user record");
        Ok(record)
    }

    /// Bump `num_commands` by one, leaving every other field alone.
    pub async fn record_command_usage(&self, user_id: UserId) -> Result<u64> {
        self.store
            .increment_field(USERS, &key(user_id), "num_commands", 1)
            .await
    }

    /// Set or clear the moderator flag, creating the user if needed.
    pub async fn set_moderator(&self, user_id: UserId, is_moderator: bool) -> Result<()> {
        if self.find(user_id).await?.is_none() {
            let record = UserRecord {
                is_moderator,
                ..UserRecord::new(user_id)
            };
            return self.store.insert(USERS, to_document(&record)?).await;
        }

        let mut updates = Document::new();
        updates.insert("is_moderator".to_string(), Value::Bool(is_moderator));
        self.store
            .replace_fields(USERS, &key(user_id), updates)
            .await
    }

    /// Mark a configured admin, creating the user if needed.
    pub async fn ensure_admin(&self, user_id: UserId) -> Result<()> {
        match self.find(user_id).await? {
            Some(u) if u.is_admin => Ok(()),
            Some(_) => {
                let mut updates = Document::new();
                updates.insert("is_admin".to_string(), Value::Bool(true));
                self.store
                    .replace_fields(USERS, &key(user_id), updates)
                    .await?;
                info!(user_id = user_id.0, "promoted configured admin");
                Ok(())
            }
            None => {
                let record = UserRecord {
                    is_admin: true,
                    ..UserRecord::new(user_id)
                };
                self.store.insert(USERS, to_document(&record)?).await?;
                info!(user_id = user_id.0, "created configured admin");
                Ok(())
            }
        }
    }
}
