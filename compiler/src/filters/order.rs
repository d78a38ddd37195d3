//! Order compilation
//!
//! Entries are `"field"` or `"field ASC|DESC"`. JSON paths order by native
//! extraction so JSONB type ordering is preserved; `json` values are cast to
//! JSONB first.

use super::error::{FilterError, KeyContext, Stage};
use super::expr::{Direction, Expr, OrderExpr};
use super::json_path::{JsonPath, is_json_path};
use crate::schema::ResolvedColumns;

pub fn compile_order(
    columns: &ResolvedColumns,
    order: &[String],
) -> Result<Vec<OrderExpr>, FilterError> {
    let mut exprs = Vec::with_capacity(order.len());

    for entry in order {
        let mut tokens = entry.split_whitespace();
        let Some(key) = tokens.next() else {
            tracing::warn!(table = columns.table(), "Blank order entry ignored");
            continue;
        };
        let rest: Vec<&str> = tokens.collect();

        let direction = match rest.as_slice() {
            [] => Direction::Asc,
            [dir] => Direction::parse(dir).ok_or_else(|| invalid_direction(columns, key, dir))?,
            _ => return Err(invalid_direction(columns, key, &rest.join(" "))),
        };

        let expr = if is_json_path(key) {
            JsonPath::resolve(key, columns, Stage::Order)?.native_expr()
        } else if let Some(column) = columns.get(key) {
            Expr::comparable_column(column)
        } else {
            return Err(KeyContext::new(Stage::Order, columns.table(), key).column_not_found(key));
        };

        exprs.push(OrderExpr { expr, direction });
    }

    Ok(exprs)
}

fn invalid_direction(columns: &ResolvedColumns, key: &str, direction: &str) -> FilterError {
    FilterError::InvalidDirection {
        table: columns.table().to_string(),
        key: key.to_string(),
        direction: direction.to_string(),
    }
}
