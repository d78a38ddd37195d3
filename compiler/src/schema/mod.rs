//! Table schema descriptors supplied by the caller
//!
//! - `column` - column and table declarations
//! - `resolver` - process-wide column map cache
//! - `relations` - relation registry and hidden property lookup

mod column;
mod relations;
mod resolver;

pub use column::{Column, DataType, TableSchema};
pub use relations::{Catalog, HiddenProperties, JoinMetadata, RelationConfig, RelationKind};
pub use resolver::{ColumnResolver, ResolvedColumns};
