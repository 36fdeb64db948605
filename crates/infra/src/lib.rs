pub mod observability;
pub mod postgres;
