// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filter DSL: boolean conditions over data rows.
//
// Conditions arrive as JSON and are parsed into `FilterCondition` before any
// row is looked at:
//
//   "RIC=GOOGL.O"                          legacy equality
//   {"RIC": "GOOGL.O"}                     equality
//   {"Ask": {">": 100}}                    operator comparison
//   {"and": [...]} / {"or": [...]}         combinators (checked before fields)
//   {"not": {...}}                         negation
//
// Only the first field of a condition object is consulted; further fields are
// ignored rather than AND-ed.

use std::cmp::Ordering;

use satzwerk_core::{DataRow, DataSet, GroupData, Result, SatzwerkError};
use serde_json::Value;
use tracing::debug;

static NULL: Value = Value::Null;

/// A parsed filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Equality {
        field: String,
        value: Value,
    },
    Comparison {
        field: String,
        op: ComparisonOp,
        operand: Value,
    },
    /// True when every sub-condition holds (true when empty).
    And(Vec<FilterCondition>),
    /// True when any sub-condition holds (false when empty).
    Or(Vec<FilterCondition>),
    Not(Box<FilterCondition>),
}

/// Operators usable in `{"field": {"<op>": operand}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    /// An operator this engine does not know. Never matches.
    Unsupported(String),
}

impl ComparisonOp {
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "=" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "<" => Self::Lt,
            "<=" => Self::Le,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            "contains" => Self::Contains,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Unsupported(symbol) => symbol,
        }
    }

    /// Apply the operator to a field value. Absent fields arrive as null.
    fn evaluate(&self, actual: &Value, operand: &Value) -> bool {
        match self {
            Self::Eq => loosely_equal(actual, operand),
            Self::Ne => !loosely_equal(actual, operand),
            Self::Gt => compare(actual, operand) == Some(Ordering::Greater),
            Self::Ge => matches!(
                compare(actual, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt => compare(actual, operand) == Some(Ordering::Less),
            Self::Le => matches!(
                compare(actual, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::In => contained_in(actual, operand).unwrap_or(false),
            Self::NotIn => contained_in(actual, operand).is_some_and(|found| !found),
            Self::Contains => match (actual, operand) {
                (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
                _ => false,
            },
            Self::StartsWith => match (actual, operand) {
                (Value::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
                _ => false,
            },
            Self::EndsWith => match (actual, operand) {
                (Value::String(s), Value::String(suffix)) => s.ends_with(suffix.as_str()),
                _ => false,
            },
            Self::Unsupported(_) => false,
        }
    }
}

impl FilterCondition {
    /// Parse a condition from its JSON form.
    pub fn parse(value: &Value) -> Result<Self> {
        match value {
            Value::String(text) => Self::parse_legacy(text),
            Value::Object(object) => {
                if let Some(subs) = object.get("or") {
                    return Ok(Self::Or(parse_list("or", subs)?));
                }
                if let Some(subs) = object.get("and") {
                    return Ok(Self::And(parse_list("and", subs)?));
                }
                if let Some(inner) = object.get("not") {
                    return Ok(Self::Not(Box::new(Self::parse(inner)?)));
                }

                let Some((field, expected)) = object.iter().next() else {
                    // An empty condition object matches nothing.
                    return Ok(Self::Or(Vec::new()));
                };

                match expected {
                    Value::Object(spec) => {
                        let (op, operand) = match spec.iter().next() {
                            Some((symbol, operand)) => {
                                (ComparisonOp::from_symbol(symbol), operand.clone())
                            }
                            None => (ComparisonOp::Unsupported(String::new()), Value::Null),
                        };
                        if matches!(op, ComparisonOp::Unsupported(_)) {
                            debug!(
                                field = %field,
                                op = op.symbol(),
                                "unknown operator never matches"
                            );
                        }
                        Ok(Self::Comparison {
                            field: field.clone(),
                            op,
                            operand,
                        })
                    }
                    other => Ok(Self::Equality {
                        field: field.clone(),
                        value: other.clone(),
                    }),
                }
            }
            other => Err(SatzwerkError::Filter(format!(
                "expected a condition object or \"field=value\" string, found {other}"
            ))),
        }
    }

    /// Parse the legacy `"field=value"` form. Splits on the first `=`.
    pub fn parse_legacy(text: &str) -> Result<Self> {
        let (field, value) = text.split_once('=').ok_or_else(|| {
            SatzwerkError::Filter(format!("legacy condition '{text}' has no '='"))
        })?;
        Ok(Self::Equality {
            field: field.trim().to_string(),
            value: Value::String(value.trim().to_string()),
        })
    }

    /// Whether `row` satisfies this condition. Never fails.
    pub fn matches(&self, row: &DataRow) -> bool {
        match self {
            Self::And(subs) => subs.iter().all(|sub| sub.matches(row)),
            Self::Or(subs) => subs.iter().any(|sub| sub.matches(row)),
            Self::Not(inner) => !inner.matches(row),
            Self::Equality { field, value } => loosely_equal(field_value(row, field), value),
            Self::Comparison { field, op, operand } => {
                let actual = field_value(row, field);
                if actual.is_null() && !matches!(op, ComparisonOp::Eq | ComparisonOp::Ne) {
                    return false;
                }
                op.evaluate(actual, operand)
            }
        }
    }
}

fn parse_list(keyword: &str, value: &Value) -> Result<Vec<FilterCondition>> {
    match value {
        Value::Array(items) => items.iter().map(FilterCondition::parse).collect(),
        other => Err(SatzwerkError::Filter(format!(
            "'{keyword}' expects a list of conditions, found {other}"
        ))),
    }
}

fn field_value<'a>(row: &'a DataRow, field: &str) -> &'a Value {
    row.get(field).unwrap_or(&NULL)
}

/// Equality that treats `1` and `1.0` as the same number.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loosely_equal(x, y))
        }
        _ => a == b,
    }
}

/// Ordering between two numbers or two strings; `None` for anything else.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Membership of `needle` in a list, substring of a string, or key of a record.
fn contained_in(needle: &Value, haystack: &Value) -> Option<bool> {
    match (needle, haystack) {
        (_, Value::Array(items)) => Some(items.iter().any(|item| loosely_equal(needle, item))),
        (Value::String(n), Value::String(h)) => Some(h.contains(n.as_str())),
        (Value::String(n), Value::Object(record)) => Some(record.contains_key(n)),
        _ => None,
    }
}

// -- Shape-preserving application ---------------------------------------------

/// Rows matching `condition`, in their original order.
pub fn filter_rows(rows: &[DataRow], condition: &FilterCondition) -> DataSet {
    let matched: DataSet = rows
        .iter()
        .filter(|row| condition.matches(row))
        .cloned()
        .collect();
    debug!(input = rows.len(), matched = matched.len(), "filter applied");
    matched
}

/// Indices of the rows matching `condition`.
pub fn matching_indices(rows: &[DataRow], condition: &FilterCondition) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| condition.matches(row))
        .map(|(idx, _)| idx)
        .collect()
}

/// Filter list- or record-shaped data, returning the same shape.
///
/// A record that does not match yields an empty record.
pub fn apply_filter(data: &GroupData, condition: &Value) -> Result<GroupData> {
    let condition = FilterCondition::parse(condition)?;
    Ok(match data {
        GroupData::List(rows) => GroupData::List(filter_rows(rows, &condition)),
        GroupData::Record(row) if condition.matches(row) => GroupData::Record(row.clone()),
        GroupData::Record(_) => GroupData::empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> DataSet {
        serde_json::from_value(value).expect("rows")
    }

    fn quotes() -> DataSet {
        rows(json!([
            {"RIC": "AAPL.O", "Exchange": "NASDAQ", "Currency": "USD", "Ask": 175.25, "Volume1": 12500000},
            {"RIC": "MSFT.O", "Exchange": "NASDAQ", "Currency": "USD", "Ask": 420.10, "Volume1": 890000},
            {"RIC": "GOOGL.O", "Exchange": "NASDAQ", "Currency": "USD", "Ask": 95, "Volume1": null},
            {"RIC": "GC=F", "Exchange": "COMEX", "Currency": "USD", "Ask": 2350.0},
            {"RIC": "VOD.L", "Exchange": "LSE", "Currency": "GBP"}
        ]))
    }

    fn run(condition: Value) -> DataSet {
        let parsed = FilterCondition::parse(&condition).expect("parse condition");
        filter_rows(&quotes(), &parsed)
    }

    fn rics(rows: &[DataRow]) -> Vec<&str> {
        rows.iter()
            .map(|row| row["RIC"].as_str().expect("RIC"))
            .collect()
    }

    #[test]
    fn legacy_and_object_equality_agree() {
        let legacy = run(json!("RIC=GOOGL.O"));
        let object = run(json!({"RIC": "GOOGL.O"}));
        assert_eq!(rics(&legacy), ["GOOGL.O"]);
        assert_eq!(legacy, object);
    }

    #[test]
    fn legacy_splits_on_first_equals_only() {
        let parsed = FilterCondition::parse(&json!("RIC = GC=F")).expect("parse");
        assert_eq!(
            parsed,
            FilterCondition::Equality {
                field: "RIC".into(),
                value: json!("GC=F"),
            }
        );
        assert_eq!(rics(&filter_rows(&quotes(), &parsed)), ["GC=F"]);
    }

    #[test]
    fn legacy_without_equals_is_a_format_error() {
        let err = FilterCondition::parse(&json!("RIC")).expect_err("must fail");
        assert!(matches!(err, SatzwerkError::Filter(_)));
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        assert!(FilterCondition::parse(&json!(42)).is_err());
        assert!(FilterCondition::parse(&json!({"and": {"RIC": "A"}})).is_err());
        assert!(FilterCondition::parse(&json!({"or": [{"RIC": "A"}, "broken"]})).is_err());
    }

    #[test]
    fn and_or_combinators() {
        let both = run(json!({"and": [{"Exchange": "NASDAQ"}, {"Currency": "USD"}]}));
        assert_eq!(rics(&both), ["AAPL.O", "MSFT.O", "GOOGL.O"]);

        let either = run(json!({"or": [{"Exchange": "COMEX"}, {"Exchange": "LSE"}]}));
        assert_eq!(rics(&either), ["GC=F", "VOD.L"]);

        assert_eq!(run(json!({"and": []})).len(), 5);
        assert!(run(json!({"or": []})).is_empty());
    }

    #[test]
    fn single_equality_matches_singleton_or() {
        assert_eq!(
            run(json!({"Exchange": "NASDAQ"})),
            run(json!({"or": [{"Exchange": "NASDAQ"}]}))
        );
    }

    #[test]
    fn double_negation_is_identity() {
        for condition in [
            json!({"Exchange": "NASDAQ"}),
            json!({"Ask": {">": 100}}),
            json!({"or": [{"RIC": "VOD.L"}, {"Currency": "GBP"}]}),
        ] {
            assert_eq!(run(json!({"not": {"not": condition.clone()}})), run(condition));
        }
    }

    #[test]
    fn numeric_comparisons_skip_missing_fields() {
        assert_eq!(rics(&run(json!({"Ask": {">": 100}}))), ["AAPL.O", "MSFT.O", "GC=F"]);
        assert_eq!(rics(&run(json!({"Ask": {"<=": 95}}))), ["GOOGL.O"]);
        assert_eq!(rics(&run(json!({"Volume1": {"<": 1000000}}))), ["MSFT.O"]);
        // Integer and float forms of the same number are equal.
        assert_eq!(rics(&run(json!({"Ask": {"=": 95.0}}))), ["GOOGL.O"]);
    }

    #[test]
    fn membership_operators() {
        assert_eq!(
            rics(&run(json!({"Exchange": {"in": ["COMEX", "LSE"]}}))),
            ["GC=F", "VOD.L"]
        );
        assert_eq!(
            rics(&run(json!({"Exchange": {"not_in": ["NASDAQ"]}}))),
            ["GC=F", "VOD.L"]
        );
        // Missing fields never satisfy a membership test.
        assert!(run(json!({"Sector": {"not_in": ["tech"]}})).is_empty());
    }

    #[test]
    fn string_operators_require_string_fields() {
        assert_eq!(rics(&run(json!({"RIC": {"starts_with": "GOOG"}}))), ["GOOGL.O"]);
        assert_eq!(rics(&run(json!({"RIC": {"ends_with": ".L"}}))), ["VOD.L"]);
        assert_eq!(run(json!({"RIC": {"contains": "O"}})).len(), 4);
        assert!(run(json!({"Ask": {"contains": "1"}})).is_empty());
    }

    #[test]
    fn unknown_operator_matches_nothing() {
        assert!(run(json!({"invalid": {"$invalid": "value"}})).is_empty());
        assert!(run(json!({"RIC": {"~=": "AAPL.O"}})).is_empty());
    }

    #[test]
    fn operator_symbols_round_trip() {
        let symbols = [
            "=", "!=", ">", ">=", "<", "<=", "in", "not_in", "contains", "starts_with", "ends_with",
            "~=",
        ];
        for symbol in symbols {
            assert_eq!(ComparisonOp::from_symbol(symbol).symbol(), symbol);
        }
        assert_eq!(ComparisonOp::from_symbol("~="), ComparisonOp::Unsupported("~=".into()));
    }

    #[test]
    fn only_first_field_is_consulted() {
        // The second field would exclude GOOGL.O if it were honoured.
        let matched = run(json!({"RIC": "GOOGL.O", "Exchange": "LSE"}));
        assert_eq!(rics(&matched), ["GOOGL.O"]);
    }

    #[test]
    fn inputs_are_not_mutated_and_order_is_kept() {
        let data = quotes();
        let before = data.clone();
        let condition = FilterCondition::parse(&json!({"Currency": "USD"})).expect("parse");
        let matched = filter_rows(&data, &condition);
        assert_eq!(data, before);
        assert_eq!(rics(&matched), ["AAPL.O", "MSFT.O", "GOOGL.O", "GC=F"]);
        assert_eq!(matching_indices(&data, &condition), [0, 1, 2, 3]);
    }

    #[test]
    fn record_shape_is_preserved() {
        let record = quotes().remove(4);
        let hit = apply_filter(&GroupData::Record(record.clone()), &json!({"Currency": "GBP"}))
            .expect("filter");
        assert_eq!(hit, GroupData::Record(record.clone()));

        let miss = apply_filter(&GroupData::Record(record), &json!({"Currency": "USD"}))
            .expect("filter");
        assert!(miss.is_empty());

        let list = apply_filter(&GroupData::List(quotes()), &json!("Exchange=LSE")).expect("filter");
        assert!(matches!(list, GroupData::List(ref rows) if rows.len() == 1));
    }

    #[test]
    fn empty_data_yields_empty_match() {
        let condition = FilterCondition::parse(&json!({"RIC": "GOOGL.O"})).expect("parse");
        assert!(filter_rows(&[], &condition).is_empty());
    }
}
