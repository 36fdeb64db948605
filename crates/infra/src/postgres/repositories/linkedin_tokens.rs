use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::postgres::{
    error_mapping::{pool_error, store_error},
    postgres_connection::PgPoolSquad,
    schema::linkedin_tokens,
};
use domain::{
    entities::linkedin_tokens::{
        InsertLinkedInTokenEntity, LinkedInTokenEntity, RotateLinkedInTokenEntity,
    },
    repositories::linkedin_tokens::LinkedInTokenRepository,
};

pub struct LinkedInTokenPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LinkedInTokenPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LinkedInTokenRepository for LinkedInTokenPostgres {
    async fn insert_token(&self, token: InsertLinkedInTokenEntity) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            insert_into(linkedin_tokens::table)
                .values(&token)
                .execute(&mut conn)
                .map_err(store_error)?;

            Ok(())
        })
        .await??)
    }

    async fn upsert_token(&self, token: InsertLinkedInTokenEntity) -> Result<LinkedInTokenEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<LinkedInTokenEntity> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            // The conflict branch is an UPDATE, so the table trigger refreshes `updated_at`.
            let stored = insert_into(linkedin_tokens::table)
                .values(&token)
                .on_conflict(linkedin_tokens::user_id)
                .do_update()
                .set(&RotateLinkedInTokenEntity::from(&token))
                .returning(LinkedInTokenEntity::as_returning())
                .get_result::<LinkedInTokenEntity>(&mut conn)
                .map_err(store_error)?;

            Ok(stored)
        })
        .await??)
    }

    async fn rotate_token(
        &self,
        user_id: Uuid,
        changes: RotateLinkedInTokenEntity,
    ) -> Result<Option<LinkedInTokenEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<LinkedInTokenEntity>> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let rotated = update(linkedin_tokens::table.filter(linkedin_tokens::user_id.eq(user_id)))
                .set(&changes)
                .returning(LinkedInTokenEntity::as_returning())
                .get_result::<LinkedInTokenEntity>(&mut conn)
                .optional()
                .map_err(store_error)?;

            Ok(rotated)
        })
        .await??)
    }

    async fn find_token(&self, user_id: Uuid) -> Result<Option<LinkedInTokenEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<LinkedInTokenEntity>> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let token = linkedin_tokens::table
                .filter(linkedin_tokens::user_id.eq(user_id))
                .select(LinkedInTokenEntity::as_select())
                .first::<LinkedInTokenEntity>(&mut conn)
                .optional()
                .map_err(store_error)?;

            Ok(token)
        })
        .await??)
    }

    async fn delete_token(&self, user_id: Uuid) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let deleted = delete(linkedin_tokens::table.filter(linkedin_tokens::user_id.eq(user_id)))
                .execute(&mut conn)
                .map_err(store_error)?;

            Ok(deleted > 0)
        })
        .await??)
    }
}
