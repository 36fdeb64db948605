use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::oauth_states;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = oauth_states, primary_key(state))]
pub struct OAuthStateEntity {
    pub state: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OAuthStateEntity {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = oauth_states)]
pub struct InsertOAuthStateEntity {
    pub state: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
