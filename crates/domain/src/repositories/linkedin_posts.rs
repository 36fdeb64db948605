use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::linkedin_posts::{InsertLinkedInPostEntity, LinkedInPostEntity};

#[async_trait]
#[automock]
pub trait LinkedInPostRepository {
    /// Fails with `StoreError::UniqueViolation` when the URN was already recorded.
    async fn insert_post(&self, post: InsertLinkedInPostEntity) -> Result<Uuid>;

    async fn find_by_urn(&self, post_urn: String) -> Result<Option<LinkedInPostEntity>>;

    /// Newest first. `None` or a non-positive limit returns every post.
    async fn list_by_user(&self, user_id: Uuid, limit: Option<i64>)
    -> Result<Vec<LinkedInPostEntity>>;
}
