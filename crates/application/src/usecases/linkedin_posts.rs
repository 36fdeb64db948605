use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use domain::{
    entities::linkedin_posts::{InsertLinkedInPostEntity, LinkedInPostEntity},
    repositories::linkedin_posts::LinkedInPostRepository,
    value_objects::linkedin::PostUrn,
};

const DEFAULT_LIST_LIMIT: i64 = 50;

pub struct LinkedInPostsUseCase<T>
where
    T: LinkedInPostRepository + Send + Sync,
{
    linkedin_post_repository: Arc<T>,
}

impl<T> LinkedInPostsUseCase<T>
where
    T: LinkedInPostRepository + Send + Sync,
{
    pub fn new(linkedin_post_repository: Arc<T>) -> Self {
        Self {
            linkedin_post_repository,
        }
    }

    /// Records a post right after the external publish call succeeded. Recording the
    /// same URN twice fails with `StoreError::UniqueViolation`.
    pub async fn record_published_post(
        &self,
        user_id: Uuid,
        post_urn: &str,
        posted_at: Option<DateTime<Utc>>,
    ) -> Result<Uuid> {
        let post_urn = PostUrn::parse(post_urn)?;

        let post_id = self
            .linkedin_post_repository
            .insert_post(InsertLinkedInPostEntity {
                user_id,
                post_urn: post_urn.to_string(),
                posted_at: posted_at.unwrap_or_else(Utc::now),
            })
            .await?;

        info!(post_id = %post_id, user_id = %user_id, post_urn = %post_urn, "linkedin_posts: post recorded");
        Ok(post_id)
    }

    pub async fn find_by_urn(&self, post_urn: &str) -> Result<Option<LinkedInPostEntity>> {
        let post_urn = PostUrn::parse(post_urn)?;
        self.linkedin_post_repository
            .find_by_urn(post_urn.into_inner())
            .await
    }

    pub async fn list_user_posts(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<LinkedInPostEntity>> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIST_LIMIT);
        self.linkedin_post_repository
            .list_by_user(user_id, Some(limit))
            .await
    }
}
