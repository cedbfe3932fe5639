// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sandboxed single-parameter expression language for ad hoc transforms.
//
// Pipeline: source -> Lexer -> Parser -> Expr -> Evaluator. Only the bound
// parameter and a fixed set of functions are reachable from an expression.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;

use satzwerk_core::SatzwerkError;
use thiserror::Error;

use ast::Expr;
use eval::Evaluator;
use parser::Parser;
pub use value::Scalar;

/// Compile-time and runtime failures of a transform expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unknown name '{0}'")]
    UnknownName(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{function}() does not take {found} argument(s)")]
    Arity { function: &'static str, found: usize },

    #[error("type error: {0}")]
    Type(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("index error: {0}")]
    Index(String),

    #[error("format error: {0}")]
    Format(String),
}

impl From<ExprError> for SatzwerkError {
    fn from(err: ExprError) -> Self {
        SatzwerkError::Transform(err.to_string())
    }
}

/// A parsed and checked expression, ready to evaluate any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    source: String,
    param: String,
    body: Expr,
}

impl CompiledExpr {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Name the expression binds its input to.
    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn evaluate(&self, input: &Scalar) -> Result<Scalar, ExprError> {
        Evaluator::new(input).eval(&self.body)
    }

    /// Evaluate and render the result as display text.
    pub fn render(&self, input: &Scalar) -> Result<String, ExprError> {
        self.evaluate(input).map(|value| value.render())
    }
}

/// Parse `source`, binding the `lambda` parameter (default `x`).
pub fn compile(source: &str) -> Result<CompiledExpr, ExprError> {
    let source = source.trim();
    let (param, body) = Parser::new(source).parse()?;
    Ok(CompiledExpr {
        source: source.to_string(),
        param,
        body,
    })
}
