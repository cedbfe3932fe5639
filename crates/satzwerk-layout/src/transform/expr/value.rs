// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runtime values of the expression language and number formatting.

use serde_json::Value;

use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Scalar>),
}

impl From<&Value> for Scalar {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Value::String(s) => Self::Str(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            Value::Object(_) => Self::Str(value.to_string()),
        }
    }
}

impl Scalar {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "None",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Str(_) => "str",
            Self::List(_) => "list",
        }
    }

    /// Display text, matching how raw cell values are shown.
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => render_number(*n),
            Self::Str(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Scalar::render)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn as_number(&self) -> Result<f64, ExprError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(ExprError::Type(format!(
                "expected a number, found {}",
                other.type_name()
            ))),
        }
    }

    /// Numeric conversion used by `float()` / `int()`: numbers, booleans and
    /// numeric strings.
    pub fn coerce_number(&self) -> Result<f64, ExprError> {
        match self {
            Self::Str(s) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .map_err(|_| ExprError::Type(format!("cannot convert '{s}' to a number"))),
            other => other.as_number(),
        }
    }
}

/// Integral values print without a fractional part.
pub fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Largest `.N` precision accepted by [`format_number`].
pub const MAX_PRECISION: usize = 20;

/// Format a number with a spec of the form `[,][.N][f|%|d]`.
///
/// `,` groups thousands, `.N` sets the precision (default 6 for `f` and `%`,
/// at most [`MAX_PRECISION`]),
/// `%` multiplies by 100 and appends a percent sign, `d` requires an
/// integral value. An empty spec renders the number plainly.
pub fn format_number(value: f64, spec: &str) -> Result<String, ExprError> {
    let bad_spec = || ExprError::Format(format!("unsupported format spec '{spec}'"));

    let (grouping, rest) = match spec.strip_prefix(',') {
        Some(rest) => (true, rest),
        None => (false, spec),
    };
    let (body, kind) = match rest.chars().last() {
        Some(c @ ('f' | '%' | 'd')) => (&rest[..rest.len() - 1], Some(c)),
        _ => (rest, None),
    };
    let precision = match body.strip_prefix('.') {
        Some(digits) => match digits.parse::<usize>() {
            Ok(p) if p <= MAX_PRECISION => Some(p),
            Ok(p) => {
                return Err(ExprError::Format(format!(
                    "precision {p} exceeds the maximum of {MAX_PRECISION}"
                )));
            }
            Err(_) => return Err(bad_spec()),
        },
        None if body.is_empty() => None,
        None => return Err(bad_spec()),
    };

    let text = match kind {
        Some('d') => {
            if precision.is_some() || value.fract() != 0.0 {
                return Err(bad_spec());
            }
            format!("{}", value as i64)
        }
        Some('%') => format!("{:.*}", precision.unwrap_or(6), value * 100.0),
        Some(_) => format!("{:.*}", precision.unwrap_or(6), value),
        None => match precision {
            Some(p) => format!("{value:.p$}"),
            None => render_number(value),
        },
    };

    let text = if grouping { group_thousands(&text) } else { text };
    Ok(if kind == Some('%') { text + "%" } else { text })
}

/// Insert `,` between thousands of the integer part.
pub fn group_thousands(text: &str) -> String {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match unsigned.find('.') {
        Some(idx) => unsigned.split_at(idx),
        None => (unsigned, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conversion_from_json() {
        assert_eq!(Scalar::from(&json!(null)), Scalar::Null);
        assert_eq!(Scalar::from(&json!(3)), Scalar::Number(3.0));
        assert_eq!(
            Scalar::from(&json!(["a", 1])),
            Scalar::List(vec![Scalar::Str("a".into()), Scalar::Number(1.0)])
        );
    }

    #[test]
    fn truthiness() {
        assert!(!Scalar::Null.is_truthy());
        assert!(!Scalar::Number(0.0).is_truthy());
        assert!(!Scalar::Str(String::new()).is_truthy());
        assert!(Scalar::Str("0".into()).is_truthy());
        assert!(!Scalar::List(Vec::new()).is_truthy());
    }

    #[test]
    fn numbers_render_like_cells() {
        assert_eq!(render_number(12500000.0), "12500000");
        assert_eq!(render_number(175.22), "175.22");
        assert_eq!(render_number(-3.5), "-3.5");
    }

    #[test]
    fn format_specs() {
        assert_eq!(format_number(1234567.891, ",.2f").unwrap(), "1,234,567.89");
        assert_eq!(format_number(-1234.5, ",.1f").unwrap(), "-1,234.5");
        assert_eq!(format_number(0.1234, ".1%").unwrap(), "12.3%");
        assert_eq!(format_number(42.0, ",d").unwrap(), "42");
        assert_eq!(format_number(1000000.0, ",d").unwrap(), "1,000,000");
        assert_eq!(format_number(2.6, ".0f").unwrap(), "3");
        assert_eq!(format_number(7.0, "").unwrap(), "7");
        assert!(format_number(1.5, "d").is_err());
        assert!(format_number(1.5, "x").is_err());
        assert!(format_number(1.5, ".zf").is_err());
    }

    #[test]
    fn precision_is_bounded() {
        assert_eq!(format_number(0.5, ".20f").unwrap().len(), "0.".len() + 20);
        assert!(matches!(format_number(0.5, ".21f"), Err(ExprError::Format(_))));
        assert!(matches!(format_number(0.5, ".999999999f"), Err(ExprError::Format(_))));
        let overflow = format_number(0.5, ".99999999999999999999999f");
        assert!(matches!(overflow, Err(ExprError::Format(_))));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands("999"), "999");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("-123456.78"), "-123,456.78");
    }
}
