use anyhow::{Result, anyhow};
use std::sync::Arc;
use tracing::{info, warn};

use domain::{
    entities::payments::{PaymentEntity, UpdatePaymentStatusEntity},
    errors::{StoreError, is_unique_violation},
    repositories::payments::PaymentRepository,
    value_objects::{
        enums::payment_record_statuses::PaymentRecordStatus,
        payments::{CheckoutPaymentModel, RecordPaymentOutcome},
    },
};

pub struct PaymentsUseCase<T>
where
    T: PaymentRepository + Send + Sync,
{
    payment_repository: Arc<T>,
}

impl<T> PaymentsUseCase<T>
where
    T: PaymentRepository + Send + Sync,
{
    pub fn new(payment_repository: Arc<T>) -> Self {
        Self { payment_repository }
    }

    /// Stores a completed checkout once. Replays of the same webhook resolve to the
    /// row that is already there.
    pub async fn record_checkout_payment(
        &self,
        checkout: CheckoutPaymentModel,
    ) -> Result<RecordPaymentOutcome> {
        let insert_entity = checkout.into_insert_entity()?;
        let intent_id = insert_entity.stripe_payment_intent_id.clone();

        if let Some(existing) = self
            .payment_repository
            .find_by_payment_intent_id(intent_id.clone())
            .await?
        {
            info!(
                payment_id = %existing.id,
                stripe_payment_intent_id = %intent_id,
                "payments: checkout already recorded; skipping insert"
            );
            return Ok(RecordPaymentOutcome::AlreadyRecorded(existing.id));
        }

        match self.payment_repository.insert_payment(insert_entity).await {
            Ok(payment_id) => {
                info!(
                    payment_id = %payment_id,
                    stripe_payment_intent_id = %intent_id,
                    "payments: checkout recorded"
                );
                Ok(RecordPaymentOutcome::Recorded(payment_id))
            }
            Err(err) if is_unique_violation(&err) => {
                // A concurrent delivery of the same event won the insert.
                warn!(
                    stripe_payment_intent_id = %intent_id,
                    "payments: concurrent insert for the same payment intent"
                );
                let existing = self
                    .payment_repository
                    .find_by_payment_intent_id(intent_id)
                    .await?
                    .ok_or(err)?;
                Ok(RecordPaymentOutcome::AlreadyRecorded(existing.id))
            }
            Err(err) => Err(err),
        }
    }

    pub async fn find_by_payment_intent_id(
        &self,
        stripe_payment_intent_id: &str,
    ) -> Result<Option<PaymentEntity>> {
        self.payment_repository
            .find_by_payment_intent_id(stripe_payment_intent_id.to_string())
            .await
    }

    pub async fn list_by_customer_email(&self, customer_email: &str) -> Result<Vec<PaymentEntity>> {
        let customer_email = customer_email.trim();
        if customer_email.is_empty() {
            return Ok(Vec::new());
        }
        self.payment_repository
            .list_by_customer_email(customer_email.to_string())
            .await
    }

    /// Applies a later gateway event (refund, dispute, ...) to a recorded payment.
    pub async fn update_status(
        &self,
        stripe_payment_intent_id: &str,
        payment_status: Option<String>,
        status: Option<PaymentRecordStatus>,
    ) -> Result<PaymentEntity> {
        let changes = UpdatePaymentStatusEntity {
            payment_status: payment_status
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            status: status.map(|s| s.to_string()),
        };

        if changes == UpdatePaymentStatusEntity::default() {
            return Err(anyhow!("No payment status change supplied"));
        }

        let updated = self
            .payment_repository
            .update_status(stripe_payment_intent_id.to_string(), changes)
            .await?
            .ok_or(StoreError::NotFound)?;

        info!(
            payment_id = %updated.id,
            stripe_payment_intent_id = %updated.stripe_payment_intent_id,
            payment_status = %updated.payment_status,
            status = %updated.status,
            "payments: status updated"
        );

        Ok(updated)
    }
}
