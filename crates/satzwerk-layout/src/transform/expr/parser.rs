// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recursive descent parser for transform expressions.
//
// GRAMMAR:
//   transform      --> [ "lambda" IDENT ":" ] expression
//   expression     --> conditional
//   conditional    --> or_expr [ "if" or_expr "else" conditional ]
//   or_expr        --> and_expr ( "or" and_expr )*
//   and_expr       --> not_expr ( "and" not_expr )*
//   not_expr       --> "not" not_expr | comparison
//   comparison     --> additive [ ("==" | "!=" | "<" | ">" | "<=" | ">=") additive ]
//   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//   multiplicative --> unary ( ("*" | "/" | "%") unary )*
//   unary          --> "-" unary | postfix
//   postfix        --> primary ( "[" expression "]" )*
//   primary        --> NUMBER | STRING | True | False | None | IDENT
//                    | IDENT "(" [ expression ( "," expression )* ] ")"
//                    | "(" expression ")"
//
// The only identifier that resolves is the parameter. Calls are checked
// against the function whitelist and its arity here, so a compiled
// expression can only fail at evaluation time on its input.

use super::ExprError;
use super::ast::{BinaryOp, Expr, Function, LogicalOp};
use super::lexer::Lexer;
use super::token::Token;
use super::value::Scalar;

/// Default parameter name when no `lambda` header is given.
pub const DEFAULT_PARAM: &str = "x";

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    param: String,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            param: DEFAULT_PARAM.to_string(),
        }
    }

    /// Parse the whole input. Returns the parameter name and the body.
    pub fn parse(mut self) -> Result<(String, Expr), ExprError> {
        if self.current == Token::Lambda {
            self.advance();
            self.param = match self.current.clone() {
                Token::Ident(name) => name,
                other => {
                    return Err(ExprError::Syntax(format!(
                        "expected a parameter name after 'lambda', found {other}"
                    )));
                }
            };
            self.advance();
            self.expect(Token::Colon)?;
        }

        if self.current == Token::Eof {
            return Err(ExprError::Syntax("empty expression".into()));
        }

        let body = self.parse_conditional()?;
        if self.current != Token::Eof {
            return Err(ExprError::Syntax(format!(
                "unexpected {} after expression",
                self.current
            )));
        }
        Ok((self.param, body))
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        if self.current == expected {
            self.advance();
            Ok(())
        } else {
            Err(ExprError::Syntax(format!(
                "expected {expected}, found {}",
                self.current
            )))
        }
    }

    fn parse_conditional(&mut self) -> Result<Expr, ExprError> {
        let then = self.parse_or()?;
        if self.current != Token::If {
            return Ok(then);
        }
        self.advance();
        let cond = self.parse_or()?;
        self.expect(Token::Else)?;
        let otherwise = self.parse_conditional()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.current == Token::Or {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_not()?;
        while self.current == Token::And {
            self.advance();
            let right = self.parse_not()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ExprError> {
        if self.current == Token::Not {
            self.advance();
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_additive()?;
        let op = match self.current {
            Token::EqEq => BinaryOp::Equal,
            Token::NotEq => BinaryOp::NotEqual,
            Token::Less => BinaryOp::Less,
            Token::Greater => BinaryOp::Greater,
            Token::LessEq => BinaryOp::LessEqual,
            Token::GreaterEq => BinaryOp::GreaterEqual,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(binary(op, left, right))
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                Token::Percent => BinaryOp::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.current == Token::Minus {
            self.advance();
            return Ok(Expr::Negate(Box::new(self.parse_unary()?)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        while self.current == Token::LBracket {
            self.advance();
            let index = self.parse_conditional()?;
            self.expect(Token::RBracket)?;
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.current.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Scalar::Number(n)))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Scalar::Str(s)))
            }
            Token::True => {
                self.advance();
                Ok(Expr::Literal(Scalar::Bool(true)))
            }
            Token::False => {
                self.advance();
                Ok(Expr::Literal(Scalar::Bool(false)))
            }
            Token::None => {
                self.advance();
                Ok(Expr::Literal(Scalar::Null))
            }
            Token::Ident(name) => {
                self.advance();
                if self.current == Token::LParen {
                    return self.parse_call(&name);
                }
                if name == self.param {
                    Ok(Expr::Param)
                } else {
                    Err(ExprError::UnknownName(name))
                }
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_conditional()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::Eof => Err(ExprError::Syntax("unexpected end of expression".into())),
            other => Err(ExprError::Syntax(format!("unexpected {other}"))),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr, ExprError> {
        let func = Function::from_name(name)
            .ok_or_else(|| ExprError::UnknownFunction(name.to_string()))?;
        // Consume '('
        self.advance();

        let mut args = Vec::new();
        if self.current != Token::RParen {
            args.push(self.parse_conditional()?);
            while self.current == Token::Comma {
                self.advance();
                args.push(self.parse_conditional()?);
            }
        }
        self.expect(Token::RParen)?;

        let (min, max) = func.arity();
        if args.len() < min || args.len() > max {
            return Err(ExprError::Arity {
                function: func.name(),
                found: args.len(),
            });
        }
        Ok(Expr::Call { func, args })
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<(String, Expr), ExprError> {
        Parser::new(input).parse()
    }

    #[test]
    fn lambda_header_names_the_parameter() {
        let (param, body) = parse("lambda price: price").expect("parse");
        assert_eq!(param, "price");
        assert_eq!(body, Expr::Param);
    }

    #[test]
    fn default_parameter_is_x() {
        let (param, body) = parse("x * 2").expect("parse");
        assert_eq!(param, "x");
        assert_eq!(
            body,
            binary(BinaryOp::Multiply, Expr::Param, Expr::Literal(Scalar::Number(2.0)))
        );
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let (_, body) = parse("1 + x * 2").expect("parse");
        assert_eq!(
            body,
            binary(
                BinaryOp::Add,
                Expr::Literal(Scalar::Number(1.0)),
                binary(BinaryOp::Multiply, Expr::Param, Expr::Literal(Scalar::Number(2.0)))
            )
        );
    }

    #[test]
    fn conditional_is_right_associative() {
        let (_, body) = parse("'a' if x > 1 else 'b' if x > 0 else 'c'").expect("parse");
        let Expr::Conditional { otherwise, .. } = body else {
            panic!("expected conditional");
        };
        assert!(matches!(*otherwise, Expr::Conditional { .. }));
    }

    #[test]
    fn free_names_are_rejected() {
        assert_eq!(
            parse("y + 1").expect_err("must fail"),
            ExprError::UnknownName("y".into())
        );
        assert_eq!(
            parse("lambda v: x").expect_err("must fail"),
            ExprError::UnknownName("x".into())
        );
    }

    #[test]
    fn only_whitelisted_functions_are_callable() {
        assert_eq!(
            parse("__import__('os')").expect_err("must fail"),
            ExprError::UnknownFunction("__import__".into())
        );
        assert!(matches!(
            parse("format(x)").expect_err("must fail"),
            ExprError::Arity { function: "format", found: 1 }
        ));
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(parse(""), Err(ExprError::Syntax(_))));
        assert!(matches!(parse("lambda: 1"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse("(x + 1"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse("x 1"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse("x if x"), Err(ExprError::Syntax(_))));
    }

    #[test]
    fn indexing_and_calls() {
        let (_, body) = parse("join(x, ' / ')[0]").expect("parse");
        assert!(matches!(body, Expr::Index { .. }));
    }
}
