use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Internal lifecycle of a recorded checkout, independent of the gateway's own
/// `payment_status` vocabulary.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentRecordStatus {
    #[default]
    Completed,
    Refunded,
    PartiallyRefunded,
    Disputed,
    Failed,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Completed => "completed",
            PaymentRecordStatus::Refunded => "refunded",
            PaymentRecordStatus::PartiallyRefunded => "partially_refunded",
            PaymentRecordStatus::Disputed => "disputed",
            PaymentRecordStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(PaymentRecordStatus::Completed),
            "refunded" => Some(PaymentRecordStatus::Refunded),
            "partially_refunded" => Some(PaymentRecordStatus::PartiallyRefunded),
            "disputed" => Some(PaymentRecordStatus::Disputed),
            "failed" => Some(PaymentRecordStatus::Failed),
            _ => None,
        }
    }
}

impl Display for PaymentRecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
