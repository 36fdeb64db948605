pub mod error_mapping;
pub mod postgres_connection;
pub mod repositories;

pub use domain::schema;
