use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    entities::payments::InsertPaymentEntity, errors::PaymentValidationError,
    value_objects::enums::payment_record_statuses::PaymentRecordStatus,
};

/// Largest minor-unit amount that fits `numeric(10,2)`.
pub const MAX_AMOUNT_MINOR: i64 = 9_999_999_999;

/// A completed checkout as reported by the payment gateway webhook.
/// Amounts are in minor units (cents), the way the gateway sends them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutPaymentModel {
    pub stripe_payment_intent_id: String,
    pub stripe_customer_id: Option<String>,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub amount_total_minor: i64,
    pub amount_subtotal_minor: i64,
    pub currency: String,
    pub payment_status: String,
    pub product_id: String,
    pub product_name: String,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

impl CheckoutPaymentModel {
    pub fn into_insert_entity(self) -> Result<InsertPaymentEntity, PaymentValidationError> {
        let stripe_payment_intent_id =
            required("stripe_payment_intent_id", self.stripe_payment_intent_id)?;
        let customer_email = required("customer_email", self.customer_email)?;
        let currency = required("currency", self.currency)?.to_uppercase();
        let payment_status = required("payment_status", self.payment_status)?;
        let product_id = required("product_id", self.product_id)?;
        let product_name = required("product_name", self.product_name)?;

        let metadata = match self.metadata {
            Value::Null => Value::Object(Map::new()),
            Value::Object(map) => Value::Object(map),
            _ => return Err(PaymentValidationError::MetadataNotObject),
        };

        Ok(InsertPaymentEntity {
            stripe_payment_intent_id,
            stripe_customer_id: non_empty(self.stripe_customer_id),
            customer_email,
            customer_name: non_empty(self.customer_name),
            amount_total: amount_from_minor("amount_total", self.amount_total_minor)?,
            amount_subtotal: amount_from_minor("amount_subtotal", self.amount_subtotal_minor)?,
            currency,
            payment_status,
            product_id,
            product_name,
            payment_method: non_empty(self.payment_method),
            metadata,
            status: PaymentRecordStatus::Completed.to_string(),
        })
    }
}

/// Converts a minor-unit amount into the two-fraction-digit decimal stored in the table.
pub fn amount_from_minor(
    field: &'static str,
    minor: i64,
) -> Result<BigDecimal, PaymentValidationError> {
    if minor < 0 {
        return Err(PaymentValidationError::NegativeAmount {
            field,
            value: minor,
        });
    }
    if minor > MAX_AMOUNT_MINOR {
        return Err(PaymentValidationError::AmountOutOfRange {
            field,
            value: minor,
        });
    }
    Ok(BigDecimal::new(minor.into(), 2))
}

fn required(field: &'static str, value: String) -> Result<String, PaymentValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PaymentValidationError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPaymentOutcome {
    Recorded(Uuid),
    /// The intent id was already stored; webhook replays land here.
    AlreadyRecorded(Uuid),
}

impl RecordPaymentOutcome {
    pub fn payment_id(&self) -> Uuid {
        match self {
            RecordPaymentOutcome::Recorded(id) | RecordPaymentOutcome::AlreadyRecorded(id) => *id,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, RecordPaymentOutcome::AlreadyRecorded(_))
    }
}
