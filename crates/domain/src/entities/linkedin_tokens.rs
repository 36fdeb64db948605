use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::linkedin_tokens;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = linkedin_tokens, primary_key(user_id))]
pub struct LinkedInTokenEntity {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub expires_at: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkedInTokenEntity {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = linkedin_tokens)]
pub struct InsertLinkedInTokenEntity {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

// `treat_none_as_null` so a rotation without a refresh token clears the stale one.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = linkedin_tokens, treat_none_as_null = true)]
pub struct RotateLinkedInTokenEntity {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

impl From<&InsertLinkedInTokenEntity> for RotateLinkedInTokenEntity {
    fn from(value: &InsertLinkedInTokenEntity) -> Self {
        Self {
            access_token: value.access_token.clone(),
            refresh_token: value.refresh_token.clone(),
            expires_at: value.expires_at,
        }
    }
}
