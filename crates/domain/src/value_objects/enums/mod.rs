pub mod access_policies;
pub mod payment_record_statuses;
