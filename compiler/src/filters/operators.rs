//! Operator registry
//!
//! Operators are a closed enum; the name → operator table is only consulted
//! at the DSL boundary, where untrusted keys decide whether a value is an
//! operator object or a literal.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::error::{FilterError, KeyContext};
use super::expr::{CompareOp, Expr, Predicate};
use super::json_path::JsonPath;
use crate::schema::Column;
use crate::utils::json::{is_scalar, scalar_to_text};

static REGISTRY: LazyLock<HashMap<&'static str, Operator>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for op in Operator::ALL {
        map.insert(op.canonical_name(), op);
        for alias in op.aliases() {
            map.insert(*alias, op);
        }
    }
    map
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NLike,
    ILike,
    NILike,
    Is,
    Isn,
    In,
    Nin,
    Between,
    Regexp,
    IRegexp,
    And,
    Or,
}

impl Operator {
    pub const ALL: [Operator; 19] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Like,
        Self::NLike,
        Self::ILike,
        Self::NILike,
        Self::Is,
        Self::Isn,
        Self::In,
        Self::Nin,
        Self::Between,
        Self::Regexp,
        Self::IRegexp,
        Self::And,
        Self::Or,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::NLike => "nlike",
            Self::ILike => "ilike",
            Self::NILike => "nilike",
            Self::Is => "is",
            Self::Isn => "isn",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Between => "between",
            Self::Regexp => "regexp",
            Self::IRegexp => "iregexp",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Ne => &["neq"],
            Self::In => &["inq"],
            _ => &[],
        }
    }

    /// Look up a canonical name or alias
    pub fn from_name(name: &str) -> Option<Self> {
        REGISTRY.get(name).copied()
    }

    /// O(1) membership check used to tell operator objects from literals
    pub fn is_valid(name: &str) -> bool {
        REGISTRY.contains_key(name)
    }

    /// `and` / `or` only combine whole clauses
    pub fn is_structural(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Exact operand count, where the operator demands one
    pub fn expected_operands(self) -> Option<usize> {
        match self {
            Self::Between => Some(2),
            _ => None,
        }
    }

    pub fn operand_description(self) -> &'static str {
        match self {
            Self::Eq | Self::Is | Self::Ne | Self::Isn => "value or null",
            Self::Gt | Self::Gte | Self::Lt | Self::Lte => "string, number or boolean",
            Self::Like | Self::NLike | Self::ILike | Self::NILike => "pattern string",
            Self::Regexp | Self::IRegexp => "regular expression string",
            Self::In | Self::Nin => "array of values",
            Self::Between => "array of exactly 2 values",
            Self::And | Self::Or => "array of where clauses",
        }
    }

    /// Build the predicate for `target <op> operand`.
    ///
    /// `name` is the spelling the caller used and appears in errors.
    pub(crate) fn build(
        self,
        name: &str,
        target: &Target<'_>,
        operand: &JsonValue,
        ctx: &KeyContext<'_>,
    ) -> Result<Predicate, FilterError> {
        match self {
            Self::Eq | Self::Is => Ok(if operand.is_null() {
                Predicate::IsNull {
                    expr: target.text_expr(),
                }
            } else {
                target.compare(CompareOp::Eq, operand)
            }),
            Self::Ne | Self::Isn => Ok(if operand.is_null() {
                Predicate::IsNotNull {
                    expr: target.text_expr(),
                }
            } else {
                target.compare(CompareOp::Ne, operand)
            }),
            Self::Gt | Self::Gte | Self::Lt | Self::Lte => {
                if !is_scalar(operand) {
                    return Err(ctx.invalid_operand(name, "expected a string, number or boolean"));
                }
                let op = match self {
                    Self::Gt => CompareOp::Gt,
                    Self::Gte => CompareOp::Gte,
                    Self::Lt => CompareOp::Lt,
                    _ => CompareOp::Lte,
                };
                Ok(target.compare(op, operand))
            }
            Self::Like | Self::NLike | Self::ILike | Self::NILike => {
                let pattern = operand
                    .as_str()
                    .ok_or_else(|| ctx.invalid_operand(name, "expected a pattern string"))?;
                Ok(Predicate::Like {
                    expr: target.text_expr(),
                    pattern: pattern.to_string(),
                    case_insensitive: matches!(self, Self::ILike | Self::NILike),
                    negated: matches!(self, Self::NLike | Self::NILike),
                })
            }
            Self::Regexp | Self::IRegexp => {
                let pattern = operand
                    .as_str()
                    .ok_or_else(|| ctx.invalid_operand(name, "expected a regular expression string"))?;
                Ok(Predicate::Regex {
                    expr: target.text_expr(),
                    pattern: pattern.to_string(),
                    case_insensitive: self == Self::IRegexp,
                })
            }
            Self::In | Self::Nin => {
                let negated = self == Self::Nin;
                let values = match operand {
                    JsonValue::Array(values) => values.as_slice(),
                    v if is_scalar(v) => std::slice::from_ref(v),
                    _ => return Err(ctx.invalid_operand(name, "expected an array of values")),
                };
                // Empty IN matches nothing, empty NOT IN matches everything
                if values.is_empty() {
                    return Ok(Predicate::Constant { value: negated });
                }
                if !values.iter().all(is_scalar) {
                    return Err(ctx.invalid_operand(
                        name,
                        "list elements must be strings, numbers or booleans",
                    ));
                }
                let (expr, values) = target.list_operands(values);
                Ok(Predicate::InList {
                    expr,
                    values,
                    negated,
                })
            }
            Self::Between => {
                let expected = self.expected_operands().unwrap_or(2);
                let bounds = match operand {
                    JsonValue::Array(values) if values.len() == expected => values,
                    other => {
                        let actual = match other {
                            JsonValue::Array(values) => values.len(),
                            JsonValue::Null => 0,
                            _ => 1,
                        };
                        return Err(FilterError::InvalidOperatorArity {
                            stage: ctx.stage,
                            table: ctx.table.to_string(),
                            key: ctx.key.to_string(),
                            operator: name.to_string(),
                            expected,
                            actual,
                        });
                    }
                };
                if !bounds.iter().all(is_scalar) {
                    return Err(ctx.invalid_operand(
                        name,
                        "bounds must be strings, numbers or booleans",
                    ));
                }
                let (expr, mut values) = target.list_operands(bounds);
                let high = values.pop().unwrap_or(JsonValue::Null);
                let low = values.pop().unwrap_or(JsonValue::Null);
                Ok(Predicate::Between { expr, low, high })
            }
            Self::And | Self::Or => Err(ctx.invalid_operator(name)),
        }
    }
}

/// Left-hand side of a condition: a plain column or a JSON path inside one
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target<'a> {
    Column(&'a Column),
    Path(&'a JsonPath),
}

impl Target<'_> {
    /// Expression for null checks and pattern matching
    fn text_expr(&self) -> Expr {
        match self {
            Self::Column(column) => Expr::column(&column.name),
            Self::Path(path) => path.text_expr(),
        }
    }

    /// Comparison against one operand.
    ///
    /// On JSON paths a number compares through the safe numeric cast, other
    /// scalars compare as extracted text, and objects/arrays compare as
    /// native JSON. Objects/arrays against a `json` column compare as JSONB.
    fn compare(&self, op: CompareOp, operand: &JsonValue) -> Predicate {
        let (expr, value) = match self {
            Self::Column(column) if operand.is_object() || operand.is_array() => {
                (Expr::comparable_column(column), operand.clone())
            }
            Self::Column(column) => (Expr::column(&column.name), operand.clone()),
            Self::Path(path) => match operand {
                JsonValue::Number(_) => (path.numeric_expr(), operand.clone()),
                JsonValue::Array(_) | JsonValue::Object(_) => (path.native_expr(), operand.clone()),
                _ => (
                    path.text_expr(),
                    scalar_to_text(operand).map_or(JsonValue::Null, JsonValue::String),
                ),
            },
        };
        Predicate::Compare { expr, op, value }
    }

    /// Expression and operands for IN / BETWEEN.
    ///
    /// On JSON paths the numeric cast is used only when every operand is a
    /// number; otherwise all operands become text.
    fn list_operands(&self, values: &[JsonValue]) -> (Expr, Vec<JsonValue>) {
        match self {
            Self::Column(column) => (Expr::column(&column.name), values.to_vec()),
            Self::Path(path) => {
                if values.iter().all(JsonValue::is_number) {
                    (path.numeric_expr(), values.to_vec())
                } else {
                    let texts = values
                        .iter()
                        .map(|v| scalar_to_text(v).map_or(JsonValue::Null, JsonValue::String))
                        .collect();
                    (path.text_expr(), texts)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::error::Stage;
    use crate::schema::DataType;
    use serde_json::json;

    fn ctx() -> KeyContext<'static> {
        KeyContext::new(Stage::Where, "tasks", "field")
    }

    fn build_col(name: &str, operand: JsonValue) -> Result<Predicate, FilterError> {
        let column = Column::new("field", DataType::Text);
        let op = Operator::from_name(name).unwrap();
        op.build(name, &Target::Column(&column), &operand, &ctx())
    }

    fn build_path(name: &str, operand: JsonValue) -> Result<Predicate, FilterError> {
        let path = JsonPath::parse("metadata.priority");
        let op = Operator::from_name(name).unwrap();
        op.build(name, &Target::Path(&path), &operand, &ctx())
    }

    #[test]
    fn test_registry_names_and_aliases() {
        assert_eq!(Operator::from_name("neq"), Some(Operator::Ne));
        assert_eq!(Operator::from_name("inq"), Some(Operator::In));
        assert_eq!(Operator::from_name("iregexp"), Some(Operator::IRegexp));
        assert_eq!(Operator::from_name("contains"), None);
        for op in Operator::ALL {
            assert!(Operator::is_valid(op.canonical_name()));
        }
        assert!(Operator::is_valid("and"));
        assert!(!Operator::is_valid("theme"));
    }

    #[test]
    fn test_structural() {
        assert!(Operator::And.is_structural());
        assert!(!Operator::Eq.is_structural());
    }

    #[test]
    fn test_eq_null_is_null() {
        assert_eq!(
            build_col("eq", JsonValue::Null).unwrap(),
            Predicate::IsNull {
                expr: Expr::column("field")
            }
        );
        assert!(matches!(
            build_col("is", JsonValue::Null).unwrap(),
            Predicate::IsNull { .. }
        ));
    }

    #[test]
    fn test_ne_null_is_not_null() {
        for name in ["ne", "neq", "isn"] {
            assert!(matches!(
                build_col(name, JsonValue::Null).unwrap(),
                Predicate::IsNotNull { .. }
            ));
        }
    }

    #[test]
    fn test_comparison_on_column() {
        assert_eq!(
            build_col("gte", json!(18)).unwrap(),
            Predicate::Compare {
                expr: Expr::column("field"),
                op: CompareOp::Gte,
                value: json!(18)
            }
        );
    }

    #[test]
    fn test_comparison_rejects_non_scalar() {
        let err = build_col("gt", json!([1])).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperand { ref operator, .. } if operator == "gt"));
        assert!(build_col("lt", JsonValue::Null).is_err());
    }

    #[test]
    fn test_in_empty_matches_nothing() {
        assert_eq!(
            build_col("in", json!([])).unwrap(),
            Predicate::Constant { value: false }
        );
        assert_eq!(
            build_col("inq", json!([])).unwrap(),
            Predicate::Constant { value: false }
        );
    }

    #[test]
    fn test_nin_empty_matches_everything() {
        assert_eq!(
            build_col("nin", json!([])).unwrap(),
            Predicate::Constant { value: true }
        );
    }

    #[test]
    fn test_in_scalar_coerced() {
        assert_eq!(
            build_col("in", json!("a")).unwrap(),
            Predicate::InList {
                expr: Expr::column("field"),
                values: vec![json!("a")],
                negated: false
            }
        );
    }

    #[test]
    fn test_in_rejects_nested_values() {
        assert!(build_col("in", json!([{"a": 1}])).is_err());
        assert!(build_col("nin", json!({"a": 1})).is_err());
    }

    #[test]
    fn test_between_arity() {
        let err = build_col("between", json!([1, 2, 3])).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidOperatorArity { expected: 2, actual: 3, .. }
        ));
        let err = build_col("between", json!(5)).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidOperatorArity { actual: 1, .. }
        ));
        assert_eq!(
            build_col("between", json!([1, 10])).unwrap(),
            Predicate::Between {
                expr: Expr::column("field"),
                low: json!(1),
                high: json!(10)
            }
        );
    }

    #[test]
    fn test_like_family() {
        assert_eq!(
            build_col("nilike", json!("%x%")).unwrap(),
            Predicate::Like {
                expr: Expr::column("field"),
                pattern: "%x%".to_string(),
                case_insensitive: true,
                negated: true
            }
        );
        assert!(build_col("like", json!(3)).is_err());
    }

    #[test]
    fn test_regexp() {
        assert_eq!(
            build_col("iregexp", json!("^a")).unwrap(),
            Predicate::Regex {
                expr: Expr::column("field"),
                pattern: "^a".to_string(),
                case_insensitive: true
            }
        );
    }

    #[test]
    fn test_structural_inside_operator_object_rejected() {
        let err = build_col("and", json!([])).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperator { ref operator, .. } if operator == "and"));
    }

    #[test]
    fn test_path_numeric_comparison_uses_safe_cast() {
        let path = JsonPath::parse("metadata.priority");
        assert_eq!(
            build_path("gt", json!(3)).unwrap(),
            Predicate::Compare {
                expr: path.numeric_expr(),
                op: CompareOp::Gt,
                value: json!(3)
            }
        );
    }

    #[test]
    fn test_path_text_comparison() {
        let path = JsonPath::parse("metadata.priority");
        assert_eq!(
            build_path("eq", json!(true)).unwrap(),
            Predicate::Compare {
                expr: path.text_expr(),
                op: CompareOp::Eq,
                value: json!("true")
            }
        );
    }

    #[test]
    fn test_path_object_equality_uses_native() {
        let path = JsonPath::parse("metadata.priority");
        assert_eq!(
            build_path("eq", json!({"level": 1})).unwrap(),
            Predicate::Compare {
                expr: path.native_expr(),
                op: CompareOp::Eq,
                value: json!({"level": 1})
            }
        );
    }

    #[test]
    fn test_path_mixed_list_is_text() {
        let path = JsonPath::parse("metadata.priority");
        assert_eq!(
            build_path("in", json!([1, "high"])).unwrap(),
            Predicate::InList {
                expr: path.text_expr(),
                values: vec![json!("1"), json!("high")],
                negated: false
            }
        );
        assert!(matches!(
            build_path("between", json!([1, 5])).unwrap(),
            Predicate::Between { expr: Expr::SafeNumeric { .. }, .. }
        ));
    }
}
