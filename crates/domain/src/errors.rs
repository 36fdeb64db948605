use thiserror::Error;

/// Store-native failures, surfaced to callers instead of being swallowed.
///
/// Repositories return `anyhow::Result`; callers that need to branch on the kind
/// use `error.downcast_ref::<StoreError>()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
    #[error("required column is null: {column}")]
    NotNullViolation { column: String },
    #[error("check constraint violated: {constraint}")]
    CheckViolation { constraint: String },
    #[error("value rejected by the store: {message}")]
    InvalidValue { message: String },
    #[error("record not found")]
    NotFound,
    #[error("table `{table}` does not match the expected shape: {detail}")]
    SchemaMismatch { table: String, detail: String },
    #[error("database connection error: {message}")]
    Connection { message: String },
    #[error("database error: {message}")]
    Query { message: String },
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }

    pub fn schema_mismatch(table: impl Into<String>, detail: impl Into<String>) -> Self {
        StoreError::SchemaMismatch {
            table: table.into(),
            detail: detail.into(),
        }
    }
}

/// True when `error` wraps a [`StoreError::UniqueViolation`].
pub fn is_unique_violation(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<StoreError>()
        .is_some_and(StoreError::is_unique_violation)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OAuthFlowError {
    #[error("Invalid or expired state parameter")]
    InvalidState,
    #[error("State parameter expired")]
    ExpiredState,
    #[error("LinkedIn tokens not found")]
    TokenNotFound,
    #[error("LinkedIn token expired")]
    TokenExpired,
    #[error("Access token is required")]
    MissingAccessToken,
    #[error("Expiry of {seconds} seconds is out of range")]
    ExpiryOutOfRange { seconds: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentValidationError {
    #[error("Invalid amount for {field}: {value} (must be non-negative)")]
    NegativeAmount { field: &'static str, value: i64 },
    #[error("Amount for {field} does not fit numeric(10,2): {value}")]
    AmountOutOfRange { field: &'static str, value: i64 },
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("metadata must be a JSON object")]
    MetadataNotObject,
}
