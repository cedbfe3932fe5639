// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data model shared by the filter, transform and layout stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single record: field name to scalar or nested value.
pub type DataRow = serde_json::Map<String, Value>;

/// An ordered sequence of records.
pub type DataSet = Vec<DataRow>;

/// Group name to the data resolved for it at the top of a render pass.
pub type GroupContext = BTreeMap<String, GroupData>;

/// Data bound to a named layout group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupData {
    /// List-shaped data (the filtered match set).
    List(DataSet),
    /// A single record. Empty when a filter matched nothing.
    Record(DataRow),
}

impl GroupData {
    /// An empty record, bound when resolution fails or matches nothing.
    pub fn empty() -> Self {
        Self::Record(DataRow::new())
    }

    /// The record a variable reads from: the first element of a list, or the
    /// record itself.
    pub fn first_record(&self) -> Option<&DataRow> {
        match self {
            Self::List(rows) => rows.first(),
            Self::Record(row) => Some(row),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(rows) => rows.is_empty(),
            Self::Record(row) => row.is_empty(),
        }
    }
}

/// A (possibly composite) field key.
///
/// `"Volume1|Volume2"` addresses two fields whose values are gathered into one
/// ordered sequence for a single column or variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    raw: String,
    parts: Vec<String>,
}

impl FieldKey {
    pub fn parse(raw: &str) -> Self {
        let parts = if raw.contains('|') {
            raw.split('|').map(|part| part.trim().to_string()).collect()
        } else {
            vec![raw.to_string()]
        };
        Self {
            raw: raw.to_string(),
            parts,
        }
    }

    /// The key as written in the field map.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_composite(&self) -> bool {
        self.parts.len() > 1
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Fetch this key from a row. Missing fields read as null.
    pub fn lookup(&self, row: &DataRow) -> FieldValue {
        if self.is_composite() {
            FieldValue::Composite(
                self.parts
                    .iter()
                    .map(|part| row.get(part).cloned().unwrap_or(Value::Null))
                    .collect(),
            )
        } else {
            FieldValue::Single(row.get(&self.raw).cloned().unwrap_or(Value::Null))
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// What a row lookup of a field key yields.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Single(Value),
    Composite(Vec<Value>),
}

impl FieldValue {
    /// Plain display text: single values as-is, composite values joined with
    /// `separator`.
    pub fn display(&self, separator: &str) -> String {
        match self {
            Self::Single(value) => display_value(value),
            Self::Composite(values) => values
                .iter()
                .map(display_value)
                .collect::<Vec<_>>()
                .join(separator),
        }
    }

    /// The values as a slice, one element for a single value.
    pub fn values(&self) -> &[Value] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Composite(values) => values,
        }
    }
}

/// Display form of a raw JSON value: strings unquoted, null empty.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
