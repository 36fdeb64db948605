use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::payments::{InsertPaymentEntity, PaymentEntity, UpdatePaymentStatusEntity};

#[async_trait]
#[automock]
pub trait PaymentRepository {
    /// Fails with `StoreError::UniqueViolation` when the intent id is already stored.
    async fn insert_payment(&self, payment: InsertPaymentEntity) -> Result<Uuid>;

    async fn find_by_payment_intent_id(
        &self,
        stripe_payment_intent_id: String,
    ) -> Result<Option<PaymentEntity>>;

    async fn list_by_customer_email(&self, customer_email: String) -> Result<Vec<PaymentEntity>>;

    /// Returns `None` when no payment has that intent id.
    async fn update_status(
        &self,
        stripe_payment_intent_id: String,
        changes: UpdatePaymentStatusEntity,
    ) -> Result<Option<PaymentEntity>>;
}
