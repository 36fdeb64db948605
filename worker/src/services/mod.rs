pub mod oauth_state_sweeper;
