pub mod enums;
pub mod linkedin;
pub mod oauth_states;
pub mod payments;
pub mod table_catalog;
