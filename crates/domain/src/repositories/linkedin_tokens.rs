use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::linkedin_tokens::{
    InsertLinkedInTokenEntity, LinkedInTokenEntity, RotateLinkedInTokenEntity,
};

#[async_trait]
#[automock]
pub trait LinkedInTokenRepository {
    /// Fails with `StoreError::UniqueViolation` when the user already has a record.
    async fn insert_token(&self, token: InsertLinkedInTokenEntity) -> Result<()>;

    /// Inserts or replaces the user's record, keeping `created_at` of an existing one.
    async fn upsert_token(&self, token: InsertLinkedInTokenEntity) -> Result<LinkedInTokenEntity>;

    async fn rotate_token(
        &self,
        user_id: Uuid,
        changes: RotateLinkedInTokenEntity,
    ) -> Result<Option<LinkedInTokenEntity>>;

    async fn find_token(&self, user_id: Uuid) -> Result<Option<LinkedInTokenEntity>>;

    async fn delete_token(&self, user_id: Uuid) -> Result<bool>;
}
