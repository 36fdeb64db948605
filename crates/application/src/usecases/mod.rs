pub mod linkedin_oauth;
pub mod linkedin_posts;
pub mod oauth_state_cleanup;
pub mod payments;
pub mod schema_migration;
