use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::entities::oauth_states::{InsertOAuthStateEntity, OAuthStateEntity};

#[async_trait]
#[automock]
pub trait OAuthStateRepository {
    async fn insert_state(&self, state: InsertOAuthStateEntity) -> Result<()>;

    async fn find_state(&self, state: String) -> Result<Option<OAuthStateEntity>>;

    /// Returns whether a row was removed.
    async fn delete_state(&self, state: String) -> Result<bool>;

    /// Deletes rows whose `expires_at` is at or before `cutoff`, oldest first.
    async fn delete_expired(&self, cutoff: DateTime<Utc>, limit: Option<i64>) -> Result<usize>;
}
