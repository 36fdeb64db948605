use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, OptionalExtension, RunQueryDsl, delete, insert_into, prelude::*};
use std::sync::Arc;
use tokio::task;

use crate::postgres::{
    error_mapping::{pool_error, store_error},
    postgres_connection::PgPoolSquad,
    schema::oauth_states,
};
use domain::{
    entities::oauth_states::{InsertOAuthStateEntity, OAuthStateEntity},
    repositories::oauth_states::OAuthStateRepository,
};

pub struct OAuthStatePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OAuthStatePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OAuthStateRepository for OAuthStatePostgres {
    async fn insert_state(&self, state: InsertOAuthStateEntity) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            insert_into(oauth_states::table)
                .values(&state)
                .execute(&mut conn)
                .map_err(store_error)?;

            Ok(())
        })
        .await??)
    }

    async fn find_state(&self, state: String) -> Result<Option<OAuthStateEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<OAuthStateEntity>> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let found = oauth_states::table
                .filter(oauth_states::state.eq(&state))
                .select(OAuthStateEntity::as_select())
                .first::<OAuthStateEntity>(&mut conn)
                .optional()
                .map_err(store_error)?;

            Ok(found)
        })
        .await??)
    }

    async fn delete_state(&self, state: String) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let deleted = delete(oauth_states::table.filter(oauth_states::state.eq(&state)))
                .execute(&mut conn)
                .map_err(store_error)?;

            Ok(deleted > 0)
        })
        .await??)
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>, limit: Option<i64>) -> Result<usize> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let Some(limit) = limit else {
                let deleted = delete(oauth_states::table.filter(oauth_states::expires_at.le(cutoff)))
                    .execute(&mut conn)
                    .map_err(store_error)?;
                return Ok(deleted);
            };

            // Bounded batch: lock the oldest expired rows, skipping ones another sweeper holds.
            let deleted = conn
                .transaction::<usize, diesel::result::Error, _>(|conn| {
                    let expired = oauth_states::table
                        .filter(oauth_states::expires_at.le(cutoff))
                        .order(oauth_states::expires_at.asc())
                        .select(oauth_states::state)
                        .limit(limit)
                        .for_update()
                        .skip_locked()
                        .load::<String>(conn)?;

                    if expired.is_empty() {
                        return Ok(0);
                    }

                    delete(oauth_states::table.filter(oauth_states::state.eq_any(&expired)))
                        .execute(conn)
                })
                .map_err(store_error)?;

            Ok(deleted)
        })
        .await??)
    }
}
