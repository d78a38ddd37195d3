//! Filter DSL compiler
//!
//! Turns a portable filter description (`where`, `order`, `fields`,
//! `include`, pagination) into a predicate tree, order expressions, a
//! projection map and a relation inclusion map. Update payloads compile to
//! flat assignments plus one JSON merge expression per JSON column.
//!
//! ```
//! use filterql::filters::{FilterCompiler, parse_filter};
//! use filterql::core::CompilerConfig;
//! use filterql::schema::{Catalog, Column, DataType, TableSchema};
//!
//! let users = TableSchema::new(
//!     "users",
//!     vec![Column::new("id", DataType::Integer), Column::new("name", DataType::Text)],
//! );
//! let catalog = Catalog::new().with_table(users.clone());
//! let compiler = FilterCompiler::new(&catalog);
//!
//! let filter = parse_filter(r#"{"where":{"name":"Ann"},"limit":1}"#, &CompilerConfig::default()).unwrap();
//! let options = compiler.compile(&users, &filter).unwrap();
//! let (sql, params) = compiler.render_select(&users, &options).unwrap();
//! assert_eq!(sql, r#"SELECT * FROM "users" WHERE "name" = $1 LIMIT 1"#);
//! assert_eq!(params.len(), 1);
//! ```

mod compiler;
mod error;
mod expr;
mod include;
mod json_path;
mod operators;
mod order;
mod parser;
mod projection;
mod types;
mod update;
mod where_clause;


pub use compiler::FilterCompiler;
pub use error::{ErrorBody, FilterError, Stage};
pub use expr::{CompareOp, Direction, Expr, OrderExpr, Predicate};
pub use include::Inclusion;
pub use json_path::{JsonPath, is_json_path};
pub use operators::Operator;
pub use order::compile_order;
pub use parser::{parse_filter, parse_update_payload};
pub use projection::compile_fields;
pub use types::{Filter, QueryOptions, RelationQuery, WhereClause};
pub use update::{UpdateCompileResult, compile_update};
pub use where_clause::compile_where;
