//! Maps Diesel and pool failures onto the store error taxonomy.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use domain::errors::StoreError;
use tracing::debug;

pub fn store_error(error: DieselError) -> StoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => StoreError::NotFound,
        DieselError::DatabaseError(kind, info) => {
            let constraint = || info.constraint_name().unwrap_or("unknown").to_string();
            match kind {
                DatabaseErrorKind::UniqueViolation => StoreError::UniqueViolation {
                    constraint: constraint(),
                },
                DatabaseErrorKind::CheckViolation => StoreError::CheckViolation {
                    constraint: constraint(),
                },
                DatabaseErrorKind::NotNullViolation => StoreError::NotNullViolation {
                    column: info.column_name().unwrap_or("unknown").to_string(),
                },
                DatabaseErrorKind::ClosedConnection => StoreError::Connection {
                    message: info.message().to_string(),
                },
                _ => StoreError::Query {
                    message: info.message().to_string(),
                },
            }
        }
        DieselError::SerializationError(err) | DieselError::DeserializationError(err) => {
            StoreError::InvalidValue {
                message: err.to_string(),
            }
        }
        other => StoreError::Query {
            message: other.to_string(),
        },
    }
}

pub fn pool_error(error: diesel::r2d2::PoolError) -> StoreError {
    StoreError::Connection {
        message: error.to_string(),
    }
}
