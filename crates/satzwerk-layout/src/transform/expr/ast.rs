// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Syntax tree of the transform expression language.

use super::value::Scalar;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Scalar),
    /// The transform's single parameter.
    Param,
    Negate(Box<Expr>),
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Short-circuit `and` / `or`, yielding one of the operands.
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `then if cond else otherwise`
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        func: Function,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// The whitelisted functions. Nothing else is callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Float,
    Int,
    Str,
    Abs,
    Round,
    Len,
    Upper,
    Lower,
    Join,
    Format,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "float" => Self::Float,
            "int" => Self::Int,
            "str" => Self::Str,
            "abs" => Self::Abs,
            "round" => Self::Round,
            "len" => Self::Len,
            "upper" => Self::Upper,
            "lower" => Self::Lower,
            "join" => Self::Join,
            "format" => Self::Format,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Str => "str",
            Self::Abs => "abs",
            Self::Round => "round",
            Self::Len => "len",
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Join => "join",
            Self::Format => "format",
        }
    }

    /// Accepted argument counts (inclusive).
    pub fn arity(self) -> (usize, usize) {
        match self {
            Self::Round | Self::Join => (1, 2),
            Self::Format => (2, 2),
            _ => (1, 1),
        }
    }
}
