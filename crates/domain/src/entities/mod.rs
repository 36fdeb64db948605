pub mod linkedin_posts;
pub mod linkedin_tokens;
pub mod oauth_states;
pub mod payments;
