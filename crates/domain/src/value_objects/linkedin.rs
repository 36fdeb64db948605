use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::OAuthFlowError;

/// Lifetime assumed when the provider omits `expires_in`.
pub const DEFAULT_TOKEN_EXPIRES_IN_SECONDS: i64 = 3600;

const LINKEDIN_URN_PREFIX: &str = "urn:li:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostUrnError {
    #[error("post URN is empty")]
    Empty,
    #[error("not a LinkedIn URN: {0}")]
    NotLinkedIn(String),
}

/// External identifier of a published LinkedIn post, e.g. `urn:li:share:7123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostUrn(String);

impl PostUrn {
    pub fn parse(raw: &str) -> Result<Self, PostUrnError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PostUrnError::Empty);
        }
        if !trimmed.starts_with(LINKEDIN_URN_PREFIX) || trimmed.len() == LINKEDIN_URN_PREFIX.len()
        {
            return Err(PostUrnError::NotLinkedIn(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for PostUrn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tokens returned by the provider's code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrantModel {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl TokenGrantModel {
    /// Unix-seconds expiry computed from `now` and `expires_in`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Result<i64, OAuthFlowError> {
        let expires_in = self.expires_in.unwrap_or(DEFAULT_TOKEN_EXPIRES_IN_SECONDS);
        now.timestamp()
            .checked_add(expires_in)
            .ok_or(OAuthFlowError::ExpiryOutOfRange {
                seconds: expires_in,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedInConnectionStatus {
    pub connected: bool,
    pub expired: bool,
    pub has_token: bool,
}

impl LinkedInConnectionStatus {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            expired: false,
            has_token: false,
        }
    }
}
