//! SQL generation
//!
//! The compiler output is backend-agnostic; this module turns it into
//! parameterized SQL text through a [`SqlDialect`].

mod dialect;
mod postgres_dialect;
mod render;

pub use dialect::SqlDialect;
pub use postgres_dialect::PostgresDialect;
pub use render::{SqlParams, render_select};
