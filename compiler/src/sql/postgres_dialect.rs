//! PostgreSQL SQL dialect implementation

use serde_json::Value as JsonValue;

use super::SqlDialect;
use crate::utils::json::to_json_text;
use crate::utils::sql::quote_literal;

/// Signed decimal guard for the safe numeric cast
const NUMERIC_PATTERN: &str = r"^[-+]?[0-9]+(\.[0-9]+)?$";

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn json_path_literal(&self, path: &[String]) -> String {
        // Quoted elements keep `null` from reading as an array NULL
        let elements: Vec<String> = path.iter().map(|s| format!("\"{}\"", s)).collect();
        quote_literal(&format!("{{{}}}", elements.join(",")))
    }

    fn json_extract_text(&self, col: &str, path: &[String]) -> String {
        format!("({} #>> {})", col, self.json_path_literal(path))
    }

    fn json_extract(&self, col: &str, path: &[String]) -> String {
        format!("({} #> {})", col, self.json_path_literal(path))
    }

    fn safe_numeric(&self, text_expr: &str) -> String {
        format!(
            "(CASE WHEN {} ~ {} THEN ({})::numeric END)",
            text_expr,
            quote_literal(NUMERIC_PATTERN),
            text_expr
        )
    }

    fn cast_to_json(&self, expr: &str) -> String {
        format!("{}::jsonb", expr)
    }

    fn json_literal(&self, value: &JsonValue) -> String {
        self.cast_to_json(&quote_literal(&to_json_text(value)))
    }

    fn json_set_expr(&self, target: &str, path: &[String], value: &str) -> String {
        format!(
            "jsonb_set({}, {}, {}, true)",
            target,
            self.json_path_literal(path),
            value
        )
    }

    fn json_bind(&self, value: &str, alias: &str, body: &str) -> String {
        format!(
            "(SELECT {} FROM (SELECT {} AS {}) AS {})",
            body,
            value,
            self.quote_identifier(alias),
            self.quote_identifier("src")
        )
    }

    fn like_operator(&self, case_insensitive: bool, negated: bool) -> &'static str {
        match (case_insensitive, negated) {
            (false, false) => "LIKE",
            (false, true) => "NOT LIKE",
            (true, false) => "ILIKE",
            (true, true) => "NOT ILIKE",
        }
    }

    fn regex_operator(&self, case_insensitive: bool) -> &'static str {
        if case_insensitive { "~*" } else { "~" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_placeholder() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.placeholder(1), "$1");
        assert_eq!(dialect.placeholder(5), "$5");
    }

    #[test]
    fn test_json_extract() {
        let dialect = PostgresDialect;
        assert_eq!(
            dialect.json_extract_text("\"metadata\"", &path(&["tags", "0"])),
            r#"("metadata" #>> '{"tags","0"}')"#
        );
        assert_eq!(
            dialect.json_extract("\"metadata\"", &path(&["score"])),
            r#"("metadata" #> '{"score"}')"#
        );
    }

    #[test]
    fn test_safe_numeric() {
        let dialect = PostgresDialect;
        assert_eq!(
            dialect.safe_numeric("(\"m\" #>> '{p}')"),
            r#"(CASE WHEN ("m" #>> '{p}') ~ '^[-+]?[0-9]+(\.[0-9]+)?$' THEN (("m" #>> '{p}'))::numeric END)"#
        );
    }

    #[test]
    fn test_json_literal_escapes_quotes() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.json_literal(&json!("it's")), r#"'"it''s"'::jsonb"#);
        assert_eq!(dialect.json_literal(&JsonValue::Null), "'null'::jsonb");
        assert_eq!(
            dialect.json_literal(&json!({"a": [1, 2]})),
            r#"'{"a":[1,2]}'::jsonb"#
        );
    }

    #[test]
    fn test_json_set() {
        let dialect = PostgresDialect;
        assert_eq!(
            dialect.json_set("\"metadata\"", &path(&["theme"]), &json!("dark")),
            r#"jsonb_set("metadata", '{"theme"}', '"dark"'::jsonb, true)"#
        );
    }

    #[test]
    fn test_json_path_null_segment_stays_a_key() {
        let dialect = PostgresDialect;
        assert_eq!(
            dialect.json_path_literal(&path(&["null", "NULL"])),
            r#"'{"null","NULL"}'"#
        );
        assert_eq!(
            dialect.json_set("\"metadata\"", &path(&["NULL"]), &json!(1)),
            r#"jsonb_set("metadata", '{"NULL"}', '1'::jsonb, true)"#
        );
    }

    #[test]
    fn test_json_bind() {
        let dialect = PostgresDialect;
        assert_eq!(
            dialect.json_bind("COALESCE(\"m\", '{}'::jsonb)", "doc", "\"doc\""),
            r#"(SELECT "doc" FROM (SELECT COALESCE("m", '{}'::jsonb) AS "doc") AS "src")"#
        );
    }

    #[test]
    fn test_json_or_empty() {
        let dialect = PostgresDialect;
        assert_eq!(
            dialect.json_or_empty("\"metadata\""),
            "COALESCE(\"metadata\", '{}'::jsonb)"
        );
        assert_eq!(
            dialect.json_coalesce("\"tags\"", &json!([])),
            "COALESCE(\"tags\", '[]'::jsonb)"
        );
    }

    #[test]
    fn test_operators() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.like_operator(true, true), "NOT ILIKE");
        assert_eq!(dialect.like_operator(false, false), "LIKE");
        assert_eq!(dialect.regex_operator(true), "~*");
    }

    #[test]
    fn test_limit_offset() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.limit_offset(Some(10), Some(20)), "LIMIT 10 OFFSET 20");
        assert_eq!(dialect.limit_offset(None, Some(5)), "OFFSET 5");
        assert_eq!(dialect.limit_offset(None, None), "");
    }
}
