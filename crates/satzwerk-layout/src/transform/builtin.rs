// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in named transforms.

use chrono::DateTime;
use satzwerk_core::{FieldValue, Result, SatzwerkError, display_value};
use serde_json::Value;

/// Names and functions of every built-in transform.
pub const BUILTINS: &[(&str, fn(&FieldValue) -> Result<String>)] = &[
    ("price", price),
    ("dollarize", dollarize),
    ("volume_millions", volume_millions),
    ("abbreviate", abbreviate),
    ("format_time_dd", format_time_dd),
    ("dash_if_none", dash_if_none),
    ("join_lines", join_lines),
    ("join_pipes", join_pipes),
];

/// `175.2` -> `$175.20`; null -> `-`.
pub fn price(value: &FieldValue) -> Result<String> {
    match single(value, "price")? {
        Value::Null => Ok("-".into()),
        v => Ok(format!("${:.2}", number(v, "price")?)),
    }
}

pub fn dollarize(value: &FieldValue) -> Result<String> {
    Ok(format!("${}", display_value(single(value, "dollarize")?)))
}

/// `12_500_000` -> `12.5M`; null -> `-`.
pub fn volume_millions(value: &FieldValue) -> Result<String> {
    match single(value, "volume_millions")? {
        Value::Null => Ok("-".into()),
        v => Ok(format!("{:.1}M", number(v, "volume_millions")? / 1_000_000.0)),
    }
}

/// Largest fitting K/M/B/T suffix with one decimal; small values unchanged.
pub fn abbreviate(value: &FieldValue) -> Result<String> {
    const SUFFIXES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let v = single(value, "abbreviate")?;
    if v.is_null() {
        return Ok("-".into());
    }
    let n = number(v, "abbreviate")?;
    let Some(mut idx) = SUFFIXES.iter().position(|(scale, _)| n.abs() >= *scale) else {
        return Ok(display_value(v));
    };
    let scaled = |idx: usize| (n / SUFFIXES[idx].0 * 10.0).round() / 10.0;
    // Rounding can carry into the next suffix: 999_950 is 1.0M, not 1000.0K.
    while idx > 0 && scaled(idx).abs() >= 1000.0 {
        idx -= 1;
    }
    Ok(format!("{:.1}{}", scaled(idx), SUFFIXES[idx].1))
}

/// Unix seconds -> `HH:MM DD` in UTC; falsy -> `-`.
pub fn format_time_dd(value: &FieldValue) -> Result<String> {
    let v = single(value, "format_time_dd")?;
    let falsy = match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    };
    if falsy {
        return Ok("-".into());
    }

    let secs = number(v, "format_time_dd")?;
    let time = DateTime::from_timestamp(secs.trunc() as i64, 0).ok_or_else(|| {
        SatzwerkError::Transform(format!("timestamp {secs} is out of range"))
    })?;
    Ok(time.format("%H:%M %d").to_string())
}

pub fn dash_if_none(value: &FieldValue) -> Result<String> {
    match single(value, "dash_if_none")? {
        Value::Null => Ok("-".into()),
        v => Ok(display_value(v)),
    }
}

pub fn join_lines(value: &FieldValue) -> Result<String> {
    Ok(joined(value, "\n"))
}

pub fn join_pipes(value: &FieldValue) -> Result<String> {
    Ok(joined(value, " | "))
}

fn joined(value: &FieldValue, separator: &str) -> String {
    value
        .values()
        .iter()
        .map(display_value)
        .collect::<Vec<_>>()
        .join(separator)
}

fn single<'a>(value: &'a FieldValue, name: &str) -> Result<&'a Value> {
    match value {
        FieldValue::Single(v) => Ok(v),
        FieldValue::Composite(_) => Err(SatzwerkError::Transform(format!(
            "'{name}' expects a single value, got a composite"
        ))),
    }
}

fn number(value: &Value, name: &str) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        SatzwerkError::Transform(format!("'{name}' expects a number, got {value}"))
    })
}
