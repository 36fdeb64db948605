use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::postgres::{
    error_mapping::{pool_error, store_error},
    postgres_connection::PgPoolSquad,
    schema::payments,
};
use domain::{
    entities::payments::{InsertPaymentEntity, PaymentEntity, UpdatePaymentStatusEntity},
    repositories::payments::PaymentRepository,
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

// Diesel is synchronous; every statement runs on the blocking threadpool.
#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn insert_payment(&self, payment: InsertPaymentEntity) -> Result<Uuid> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Uuid> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let payment_id = insert_into(payments::table)
                .values(&payment)
                .returning(payments::id)
                .get_result::<Uuid>(&mut conn)
                .map_err(store_error)?;

            Ok(payment_id)
        })
        .await??)
    }

    async fn find_by_payment_intent_id(
        &self,
        stripe_payment_intent_id: String,
    ) -> Result<Option<PaymentEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<PaymentEntity>> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let payment = payments::table
                .filter(payments::stripe_payment_intent_id.eq(&stripe_payment_intent_id))
                .select(PaymentEntity::as_select())
                .first::<PaymentEntity>(&mut conn)
                .optional()
                .map_err(store_error)?;

            Ok(payment)
        })
        .await??)
    }

    async fn list_by_customer_email(&self, customer_email: String) -> Result<Vec<PaymentEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<PaymentEntity>> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let results = payments::table
                .filter(payments::customer_email.eq(&customer_email))
                .order(payments::created_at.desc())
                .select(PaymentEntity::as_select())
                .load::<PaymentEntity>(&mut conn)
                .map_err(store_error)?;

            Ok(results)
        })
        .await??)
    }

    async fn update_status(
        &self,
        stripe_payment_intent_id: String,
        changes: UpdatePaymentStatusEntity,
    ) -> Result<Option<PaymentEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<PaymentEntity>> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let updated = update(
                payments::table
                    .filter(payments::stripe_payment_intent_id.eq(&stripe_payment_intent_id)),
            )
            .set(&changes)
            .returning(PaymentEntity::as_returning())
            .get_result::<PaymentEntity>(&mut conn)
            .optional()
            .map_err(store_error)?;

            Ok(updated)
        })
        .await??)
    }
}
