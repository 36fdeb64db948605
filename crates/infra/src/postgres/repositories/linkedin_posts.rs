use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::postgres::{
    error_mapping::{pool_error, store_error},
    postgres_connection::PgPoolSquad,
    schema::linkedin_posts,
};
use domain::{
    entities::linkedin_posts::{InsertLinkedInPostEntity, LinkedInPostEntity},
    repositories::linkedin_posts::LinkedInPostRepository,
};

pub struct LinkedInPostPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LinkedInPostPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LinkedInPostRepository for LinkedInPostPostgres {
    async fn insert_post(&self, post: InsertLinkedInPostEntity) -> Result<Uuid> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Uuid> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let post_id = insert_into(linkedin_posts::table)
                .values(&post)
                .returning(linkedin_posts::id)
                .get_result::<Uuid>(&mut conn)
                .map_err(store_error)?;

            Ok(post_id)
        })
        .await??)
    }

    async fn find_by_urn(&self, post_urn: String) -> Result<Option<LinkedInPostEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<LinkedInPostEntity>> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let post = linkedin_posts::table
                .filter(linkedin_posts::post_urn.eq(&post_urn))
                .select(LinkedInPostEntity::as_select())
                .first::<LinkedInPostEntity>(&mut conn)
                .optional()
                .map_err(store_error)?;

            Ok(post)
        })
        .await??)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<LinkedInPostEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<LinkedInPostEntity>> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let mut query = linkedin_posts::table
                .select(LinkedInPostEntity::as_select())
                .filter(linkedin_posts::user_id.eq(user_id))
                .order(linkedin_posts::posted_at.desc())
                .into_boxed();

            if let Some(limit) = limit.filter(|l| *l > 0) {
                query = query.limit(limit);
            }

            let posts = query
                .load::<LinkedInPostEntity>(&mut conn)
                .map_err(store_error)?;
            Ok(posts)
        })
        .await??)
    }
}
