use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::payments;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub stripe_payment_intent_id: String,
    pub stripe_customer_id: Option<String>,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub amount_total: BigDecimal,
    pub amount_subtotal: BigDecimal,
    pub currency: String,
    pub payment_status: String,
    pub product_id: String,
    pub product_name: String,
    pub payment_method: Option<String>,
    pub metadata: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// `created_at`/`updated_at` are left to the column defaults so a fresh row has both equal.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub stripe_payment_intent_id: String,
    pub stripe_customer_id: Option<String>,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub amount_total: BigDecimal,
    pub amount_subtotal: BigDecimal,
    pub currency: String,
    pub payment_status: String,
    pub product_id: String,
    pub product_name: String,
    pub payment_method: Option<String>,
    pub metadata: Value,
    pub status: String,
}

/// Status change applied after the checkout was recorded (refund, dispute, ...).
/// `None` fields are left untouched; `updated_at` is maintained by the table trigger.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = payments)]
pub struct UpdatePaymentStatusEntity {
    pub payment_status: Option<String>,
    pub status: Option<String>,
}
