use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::linkedin_posts;

/// A post published to LinkedIn. `user_id` is an owner reference validated by the
/// calling service; there is no foreign key behind it.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = linkedin_posts)]
pub struct LinkedInPostEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_urn: String,
    pub posted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = linkedin_posts)]
pub struct InsertLinkedInPostEntity {
    pub user_id: Uuid,
    pub post_urn: String,
    pub posted_at: DateTime<Utc>,
}
