// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tree-walking evaluator for compiled transform expressions.

use super::ExprError;
use super::ast::{BinaryOp, Expr, Function, LogicalOp};
use super::value::{Scalar, format_number};

/// Evaluates an expression tree against a bound parameter value.
pub struct Evaluator<'a> {
    param: &'a Scalar,
}

impl<'a> Evaluator<'a> {
    pub fn new(param: &'a Scalar) -> Self {
        Self { param }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Scalar, ExprError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Param => Ok(self.param.clone()),
            Expr::Negate(inner) => Ok(Scalar::Number(-self.eval(inner)?.as_number()?)),
            Expr::Not(inner) => Ok(Scalar::Bool(!self.eval(inner)?.is_truthy())),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, left, right)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                match (op, left.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                index_into(target, &index)
            }
            Expr::Call { func, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                call(*func, args)
            }
        }
    }
}

fn binary(op: BinaryOp, left: Scalar, right: Scalar) -> Result<Scalar, ExprError> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Subtract => Ok(Scalar::Number(left.as_number()? - right.as_number()?)),
        BinaryOp::Multiply => Ok(Scalar::Number(left.as_number()? * right.as_number()?)),
        BinaryOp::Divide => {
            let divisor = right.as_number()?;
            if divisor == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            Ok(Scalar::Number(left.as_number()? / divisor))
        }
        BinaryOp::Modulo => {
            let (a, b) = (left.as_number()?, right.as_number()?);
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            // Result takes the sign of the divisor.
            Ok(Scalar::Number(a - b * (a / b).floor()))
        }
        BinaryOp::Equal => Ok(Scalar::Bool(loosely_equal(&left, &right))),
        BinaryOp::NotEqual => Ok(Scalar::Bool(!loosely_equal(&left, &right))),
        BinaryOp::Less => compare(&left, &right).map(|o| Scalar::Bool(o.is_lt())),
        BinaryOp::Greater => compare(&left, &right).map(|o| Scalar::Bool(o.is_gt())),
        BinaryOp::LessEqual => compare(&left, &right).map(|o| Scalar::Bool(o.is_le())),
        BinaryOp::GreaterEqual => compare(&left, &right).map(|o| Scalar::Bool(o.is_ge())),
    }
}

fn add(left: Scalar, right: Scalar) -> Result<Scalar, ExprError> {
    match (left, right) {
        (Scalar::List(mut a), Scalar::List(b)) => {
            a.extend(b);
            Ok(Scalar::List(a))
        }
        (left @ Scalar::Str(_), right) | (left, right @ Scalar::Str(_)) => {
            Ok(Scalar::Str(left.render() + &right.render()))
        }
        (left, right) => Ok(Scalar::Number(left.as_number()? + right.as_number()?)),
    }
}

fn loosely_equal(left: &Scalar, right: &Scalar) -> bool {
    match (left, right) {
        (Scalar::Number(_) | Scalar::Bool(_), Scalar::Number(_) | Scalar::Bool(_)) => {
            matches!((left.as_number(), right.as_number()), (Ok(a), Ok(b)) if a == b)
        }
        (Scalar::List(a), Scalar::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loosely_equal(x, y))
        }
        _ => left == right,
    }
}

fn compare(left: &Scalar, right: &Scalar) -> Result<std::cmp::Ordering, ExprError> {
    match (left, right) {
        (Scalar::Str(a), Scalar::Str(b)) => Ok(a.cmp(b)),
        _ => {
            let (a, b) = (left.as_number()?, right.as_number()?);
            a.partial_cmp(&b)
                .ok_or_else(|| ExprError::Type("cannot order NaN".into()))
        }
    }
}

fn index_into(target: Scalar, index: &Scalar) -> Result<Scalar, ExprError> {
    let raw = index.as_number()?;
    if raw.fract() != 0.0 {
        return Err(ExprError::Type(format!("index must be an integer, found {raw}")));
    }
    let raw = raw as i64;

    let resolve = |len: usize| -> Result<usize, ExprError> {
        let len = len as i64;
        let idx = if raw < 0 { raw + len } else { raw };
        if (0..len).contains(&idx) {
            Ok(idx as usize)
        } else {
            Err(ExprError::Index(format!("index {raw} out of range for length {len}")))
        }
    };

    match target {
        Scalar::List(mut items) => {
            let idx = resolve(items.len())?;
            Ok(items.swap_remove(idx))
        }
        Scalar::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = resolve(chars.len())?;
            Ok(Scalar::Str(chars[idx].to_string()))
        }
        other => Err(ExprError::Type(format!(
            "{} is not indexable",
            other.type_name()
        ))),
    }
}

fn call(func: Function, args: Vec<Scalar>) -> Result<Scalar, ExprError> {
    let mut args = args.into_iter();
    // Arity was checked at compile time.
    let first = args.next().unwrap_or(Scalar::Null);
    let second = args.next();

    match func {
        Function::Float => Ok(Scalar::Number(first.coerce_number()?)),
        Function::Int => Ok(Scalar::Number(first.coerce_number()?.trunc())),
        Function::Str => Ok(Scalar::Str(first.render())),
        Function::Abs => Ok(Scalar::Number(first.as_number()?.abs())),
        Function::Round => {
            let value = first.as_number()?;
            let digits = match second {
                Some(d) => d.as_number()?,
                None => 0.0,
            };
            if digits.fract() != 0.0 {
                return Err(ExprError::Type("round() digits must be an integer".into()));
            }
            let factor = 10f64.powi(digits as i32);
            Ok(Scalar::Number((value * factor).round() / factor))
        }
        Function::Len => match first {
            Scalar::Str(s) => Ok(Scalar::Number(s.chars().count() as f64)),
            Scalar::List(items) => Ok(Scalar::Number(items.len() as f64)),
            other => Err(ExprError::Type(format!(
                "{} has no length",
                other.type_name()
            ))),
        },
        Function::Upper => text_arg(func, first).map(|s| Scalar::Str(s.to_uppercase())),
        Function::Lower => text_arg(func, first).map(|s| Scalar::Str(s.to_lowercase())),
        Function::Join => {
            let sep = match second {
                Some(sep) => text_arg(func, sep)?,
                None => ", ".to_string(),
            };
            match first {
                Scalar::List(items) => Ok(Scalar::Str(
                    items
                        .iter()
                        .map(Scalar::render)
                        .collect::<Vec<_>>()
                        .join(&sep),
                )),
                other => Err(ExprError::Type(format!(
                    "join() expects a list, found {}",
                    other.type_name()
                ))),
            }
        }
        Function::Format => {
            let spec = text_arg(func, second.unwrap_or(Scalar::Null))?;
            format_number(first.coerce_number()?, &spec).map(Scalar::Str)
        }
    }
}

fn text_arg(func: Function, value: Scalar) -> Result<String, ExprError> {
    match value {
        Scalar::Str(s) => Ok(s),
        other => Err(ExprError::Type(format!(
            "{}() expects a string, found {}",
            func.name(),
            other.type_name()
        ))),
    }
}
