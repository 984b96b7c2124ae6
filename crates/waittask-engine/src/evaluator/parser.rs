use waittask_types::{ErrorKind, WaitTaskError};

use super::ast::{BinaryOp, Expr, Literal, UnaryOp};
use super::lexer::Token;

/// Recursive-descent, precedence-climbing parser over the token stream
/// produced by [`super::lexer::lex`].
///
/// Precedence, loosest to tightest: `||` > `&&` > `==`/`!=` >
/// `<`/`<=`/`>`/`>=` > `+`/`-` > `*`/`/` > unary `!`/`-` > primary. This
/// mirrors ordinary C-family expression precedence, which is what a
/// workflow author authoring `signal.payload.score > 0.5 && processor.output.valid == true`
/// expects.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

pub fn parse(tokens: &[Token]) -> Result<Expr, WaitTaskError> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    parser.expect_eof()?;
    Ok(expr)
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect_eof(&self) -> Result<(), WaitTaskError> {
        if *self.peek() == Token::Eof {
            Ok(())
        } else {
            Err(WaitTaskError::new(
                ErrorKind::InvalidConfig,
                format!("unexpected trailing token {:?} in condition", self.peek()),
            ))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, WaitTaskError> {
        let mut lhs = self.parse_and()?;
        while *self.peek() == Token::OrOr {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, WaitTaskError> {
        let mut lhs = self.parse_equality()?;
        while *self.peek() == Token::AndAnd {
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary {
                op: BinaryOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, WaitTaskError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, WaitTaskError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, WaitTaskError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, WaitTaskError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, WaitTaskError> {
        match self.peek() {
            Token::Bang => {
                self.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(expr),
                })
            }
            Token::Minus => {
                self.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    expr: Box::new(expr),
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, WaitTaskError> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Literal(Literal::Number(n))),
            Token::String(s) => Ok(Expr::Literal(Literal::String(s))),
            Token::LParen => {
                let expr = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Literal::Bool(true))),
                "false" => Ok(Expr::Literal(Literal::Bool(false))),
                "null" => Ok(Expr::Literal(Literal::Null)),
                "matches" if *self.peek() == Token::LParen => self.parse_matches_call(),
                _ => self.parse_field_path(name),
            },
            other => Err(WaitTaskError::new(
                ErrorKind::InvalidConfig,
                format!("unexpected token {other:?} in condition"),
            )),
        }
    }

    fn parse_field_path(&mut self, first: String) -> Result<Expr, WaitTaskError> {
        let mut segments = vec![first];
        while *self.peek() == Token::Dot {
            self.advance();
            match self.advance() {
                Token::Ident(seg) => segments.push(seg),
                other => {
                    return Err(WaitTaskError::new(
                        ErrorKind::InvalidConfig,
                        format!("expected field name after '.', got {other:?}"),
                    ));
                }
            }
        }
        Ok(Expr::Field(segments))
    }

    fn parse_matches_call(&mut self) -> Result<Expr, WaitTaskError> {
        self.expect(Token::LParen)?;
        let field = match self.advance() {
            Token::Ident(name) => self.parse_field_path(name)?,
            other => {
                return Err(WaitTaskError::new(
                    ErrorKind::InvalidConfig,
                    format!("matches() expects a field path as its first argument, got {other:?}"),
                ));
            }
        };
        self.expect(Token::Comma)?;
        let pattern = match self.advance() {
            Token::String(s) => s,
            other => {
                return Err(WaitTaskError::new(
                    ErrorKind::InvalidConfig,
                    format!(
                        "matches() expects a string regex literal as its second argument, got {other:?}"
                    ),
                ));
            }
        };
        self.expect(Token::RParen)?;
        Ok(Expr::Matches {
            field: Box::new(field),
            pattern,
        })
    }

    fn expect(&mut self, expected: Token) -> Result<(), WaitTaskError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(WaitTaskError::new(
                ErrorKind::InvalidConfig,
                format!("expected {expected:?}, got {:?} in condition", self.peek()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::lex;
    use super::*;

    fn parse_source(src: &str) -> Expr {
        parse(&lex(src).unwrap()).unwrap()
    }

    #[test]
    fn parses_field_equality() {
        let expr = parse_source("signal.payload.status == 'approved'");
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Eq,
                lhs: Box::new(Expr::Field(vec![
                    "signal".into(),
                    "payload".into(),
                    "status".into(),
                ])),
                rhs: Box::new(Expr::Literal(Literal::String("approved".into()))),
            }
        );
    }

    #[test]
    fn respects_and_over_or_precedence() {
        let expr = parse_source("a == 1 || b == 2 && c == 3");
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(Expr::Binary {
                    op: BinaryOp::Eq,
                    lhs: Box::new(Expr::Field(vec!["a".into()])),
                    rhs: Box::new(Expr::Literal(Literal::Number(1.0))),
                }),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::And,
                    lhs: Box::new(Expr::Binary {
                        op: BinaryOp::Eq,
                        lhs: Box::new(Expr::Field(vec!["b".into()])),
                        rhs: Box::new(Expr::Literal(Literal::Number(2.0))),
                    }),
                    rhs: Box::new(Expr::Binary {
                        op: BinaryOp::Eq,
                        lhs: Box::new(Expr::Field(vec!["c".into()])),
                        rhs: Box::new(Expr::Literal(Literal::Number(3.0))),
                    }),
                }),
            }
        );
    }

    #[test]
    fn parses_matches_call() {
        let expr = parse_source("matches(signal.payload.email, \"^a.*\")");
        assert_eq!(
            expr,
            Expr::Matches {
                field: Box::new(Expr::Field(vec![
                    "signal".into(),
                    "payload".into(),
                    "email".into(),
                ])),
                pattern: "^a.*".into(),
            }
        );
    }

    #[test]
    fn rejects_trailing_garbage() {
        let tokens = lex("a == 1 )").unwrap();
        assert!(parse(&tokens).is_err());
    }
}
