pub mod entities;
pub mod errors;
pub mod repositories;
pub mod schema;
pub mod value_objects;
