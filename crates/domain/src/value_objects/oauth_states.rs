use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use crate::errors::OAuthFlowError;

/// Seconds an issued state stays usable.
pub const DEFAULT_OAUTH_STATE_TTL_SECONDS: i64 = 600;

const STATE_BYTES: usize = 32;

/// Generates an unpredictable, URL-safe state value (32 random bytes, base64url, no padding).
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Negative TTLs expire immediately; TTLs past chrono's range are rejected.
pub fn state_expires_at(
    now: DateTime<Utc>,
    ttl_seconds: i64,
) -> Result<DateTime<Utc>, OAuthFlowError> {
    Duration::try_seconds(ttl_seconds.max(0))
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(OAuthFlowError::ExpiryOutOfRange {
            seconds: ttl_seconds,
        })
}

/// Result of one expired-state sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthStateSweepResult {
    pub deleted: usize,
    pub cutoff: Option<DateTime<Utc>>,
}
