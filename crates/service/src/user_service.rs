use std::sync::Arc;

use tracing::{debug, instrument};

use models::user::{NewUser, User};
use crate::{errors::ServiceError, store::StoreClient};

/// Namespace for user records, composed after the store client's own prefix.
pub const USER_KEY_PREFIX: &str = "user:";

/// CRUD access to user records stored as JSON strings.
#[derive(Clone)]
pub struct UserService {
    store: Arc<StoreClient>,
}

impl UserService {
    pub fn new(store: Arc<StoreClient>) -> Self { Self { store } }

    /// Store key for a user id, relative to the client prefix.
    pub fn user_key(id: &str) -> String {
        format!("{USER_KEY_PREFIX}{id}")
    }

    /// Create and persist a user with a fresh id. The entry never expires.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewUser) -> Result<User, ServiceError> {
        let user = User::create(input);
        let raw = user.to_json()?;
        self.store.set(&Self::user_key(&user.id.to_string()), &raw, None).await?;
        debug!(user_id = %user.id, "user_created");
        Ok(user)
    }

    /// Get a user by id; `None` when no record is stored under it.
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        let Some(raw) = self.store.get(&Self::user_key(id)).await? else {
            return Ok(None);
        };
        Ok(Some(User::from_json(&raw)?))
    }

    /// Delete a user; returns whether a record was removed.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: &str) -> Result<bool, ServiceError> {
        let removed = self.store.delete(&Self::user_key(id)).await?;
        Ok(removed > 0)
    }
}
