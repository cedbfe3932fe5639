// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lexer: turns an expression string into tokens.
//
// Strings take single or double quotes with `\n`, `\t`, `\\` and quote
// escapes. Numbers may use `_` as a digit separator (`1_000_000`).

use std::iter::Peekable;
use std::str::Chars;

use super::token::Token;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    /// Advances the lexer and returns the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.input.next() {
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => Token::Star,
            Some('/') => Token::Slash,
            Some('%') => Token::Percent,
            Some('(') => Token::LParen,
            Some(')') => Token::RParen,
            Some('[') => Token::LBracket,
            Some(']') => Token::RBracket,
            Some(',') => Token::Comma,
            Some(':') => Token::Colon,
            Some('=') => self.followed_by_equals(Token::EqEq, Token::Illegal('=')),
            Some('!') => self.followed_by_equals(Token::NotEq, Token::Illegal('!')),
            Some('<') => self.followed_by_equals(Token::LessEq, Token::Less),
            Some('>') => self.followed_by_equals(Token::GreaterEq, Token::Greater),
            Some(quote @ ('"' | '\'')) => self.read_string(quote),
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.read_number(ch),
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.read_identifier(ch),
            None => Token::Eof,
            Some(ch) => Token::Illegal(ch),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.input.next_if(|ch| ch.is_whitespace()).is_some() {}
    }

    fn followed_by_equals(&mut self, with_equals: Token, alone: Token) -> Token {
        if self.input.next_if_eq(&'=').is_some() {
            with_equals
        } else {
            alone
        }
    }

    fn read_string(&mut self, quote: char) -> Token {
        let mut result = String::new();
        while let Some(ch) = self.input.next() {
            match ch {
                c if c == quote => return Token::Str(result),
                '\\' => match self.input.next() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some(other) => result.push(other),
                    None => break,
                },
                c => result.push(c),
            }
        }
        // Unterminated string: the parser reports it via the illegal quote.
        Token::Illegal(quote)
    }

    fn read_number(&mut self, first: char) -> Token {
        let mut text = String::from(first);
        let mut has_dot = first == '.';

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
            } else if ch == '_' {
                // digit separator
            } else if ch == '.' && !has_dot {
                has_dot = true;
                text.push(ch);
            } else {
                break;
            }
            self.input.next();
        }

        text.parse::<f64>()
            .map(Token::Number)
            .unwrap_or(Token::Illegal(first))
    }

    fn read_identifier(&mut self, first: char) -> Token {
        let mut ident = String::from(first);
        while let Some(ch) = self.input.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
            ident.push(ch);
        }
        Token::keyword(&ident).unwrap_or(Token::Ident(ident))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn lambda_header_and_conditional() {
        assert_eq!(
            tokens("lambda v: v if v else '-'"),
            vec![
                Token::Lambda,
                Token::Ident("v".into()),
                Token::Colon,
                Token::Ident("v".into()),
                Token::If,
                Token::Ident("v".into()),
                Token::Else,
                Token::Str("-".into()),
            ]
        );
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(
            tokens("< <= > >= == !="),
            vec![
                Token::Less,
                Token::LessEq,
                Token::Greater,
                Token::GreaterEq,
                Token::EqEq,
                Token::NotEq,
            ]
        );
        assert_eq!(tokens("x = 1")[1], Token::Illegal('='));
    }

    #[test]
    fn numbers_with_separators() {
        assert_eq!(tokens("1_000_000 .5 2.25"), vec![
            Token::Number(1_000_000.0),
            Token::Number(0.5),
            Token::Number(2.25),
        ]);
    }

    #[test]
    fn strings_with_escapes() {
        assert_eq!(
            tokens(r#""a\nb" 'it\'s'"#),
            vec![Token::Str("a\nb".into()), Token::Str("it's".into())]
        );
        assert_eq!(tokens("'open"), vec![Token::Illegal('\'')]);
    }

    #[test]
    fn keywords_accept_json_spellings() {
        assert_eq!(tokens("None null True false"), vec![
            Token::None,
            Token::None,
            Token::True,
            Token::False,
        ]);
    }
}
