mod app;
pub mod core;
pub mod filters;
pub mod schema;
pub mod sql;
pub mod utils;
