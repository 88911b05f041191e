//! The expression grammar: precedence climbing from OR down to atoms.
//!
//! Precedence, loosest first: `OR`, `AND`, comparisons (non-associative),
//! `+ -`, `* /`, prefix `-`/`NOT`, atoms. Function application binds
//! tightest and is only recognized for the fixed function set — any other
//! identifier directly followed by `(` is a parse error, not a deferred
//! runtime failure.

use crate::ast::{BinaryOp, CompareOp, Expr, Func, LogicalOp, UnaryOp};
use crate::error::{ParseError, ParseErrorKind};
use crate::token::TokenType;

use super::{ParseResult, Parser};

impl<'a, 'int> Parser<'a, 'int> {
    /// Entry point: parses at the loosest precedence.
    pub(crate) fn parse_expr(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.parse_or()
    }

    pub(crate) fn parse_or(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenType::Or) {
            let right = self.parse_and()?;
            let span = left.span().merge(right.span());
            left = self.ctx.alloc(Expr::Logical {
                op: LogicalOp::Or,
                left,
                right,
                span,
            });
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut left = self.parse_comparison()?;
        while self.eat(&TokenType::And) {
            let right = self.parse_comparison()?;
            let span = left.span().merge(right.span());
            left = self.ctx.alloc(Expr::Logical {
                op: LogicalOp::And,
                left,
                right,
                span,
            });
        }
        Ok(left)
    }

    /// One optional comparison; `a < b < c` does not parse.
    pub(crate) fn parse_comparison(&mut self) -> ParseResult<&'a Expr<'a>> {
        let left = self.parse_additive()?;
        if let Some(op) = self.compare_op() {
            self.advance();
            let right = self.parse_additive()?;
            let span = left.span().merge(right.span());
            return Ok(self.ctx.alloc(Expr::Compare {
                op,
                left,
                right,
                span,
            }));
        }
        Ok(left)
    }

    /// A subcondition in `EXCEPT WHEN` lists: comparisons joined by `OR`,
    /// leaving top-level `AND` to separate list entries.
    pub(crate) fn parse_subcondition(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut left = self.parse_comparison()?;
        while self.eat(&TokenType::Or) {
            let right = self.parse_comparison()?;
            let span = left.span().merge(right.span());
            left = self.ctx.alloc(Expr::Logical {
                op: LogicalOp::Or,
                left,
                right,
                span,
            });
        }
        Ok(left)
    }

    pub(crate) fn compare_op(&self) -> Option<CompareOp> {
        match self.current().token_type {
            TokenType::LtEq => Some(CompareOp::LtEq),
            TokenType::GtEq => Some(CompareOp::GtEq),
            TokenType::Lt => Some(CompareOp::Lt),
            TokenType::Gt => Some(CompareOp::Gt),
            TokenType::Eq => Some(CompareOp::Eq),
            TokenType::NotEq => Some(CompareOp::NotEq),
            _ => None,
        }
    }

    pub(crate) fn parse_additive(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().token_type {
                TokenType::Add => BinaryOp::Add,
                TokenType::Sub => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            let span = left.span().merge(right.span());
            left = self.ctx.alloc(Expr::Binary {
                op,
                left,
                right,
                span,
            });
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current().token_type {
                TokenType::Star => BinaryOp::Mul,
                TokenType::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            let span = left.span().merge(right.span());
            left = self.ctx.alloc(Expr::Binary {
                op,
                left,
                right,
                span,
            });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<&'a Expr<'a>> {
        match self.current().token_type {
            TokenType::Sub => {
                let start = self.advance().span;
                let operand = self.parse_unary()?;
                let span = start.merge(operand.span());
                Ok(self.ctx.alloc(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand,
                    span,
                }))
            }
            TokenType::Not => {
                let start = self.advance().span;
                // Both `NOT x` and the function spelling `NOT(x)` land here;
                // the parenthesized form is just a grouped operand.
                let operand = self.parse_unary()?;
                let span = start.merge(operand.span());
                Ok(self.ctx.alloc(Expr::Unary {
                    op: UnaryOp::Not,
                    operand,
                    span,
                }))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<&'a Expr<'a>> {
        let token = self.current().clone();
        match token.token_type {
            TokenType::Number { value, text } => {
                self.advance();
                Ok(self.ctx.alloc(Expr::Number {
                    value,
                    text,
                    span: token.span,
                }))
            }
            TokenType::Currency { value, code, text } => {
                self.advance();
                Ok(self.ctx.alloc(Expr::Currency {
                    value,
                    code,
                    text,
                    span: token.span,
                }))
            }
            TokenType::Percent { value, text } => {
                self.advance();
                Ok(self.ctx.alloc(Expr::Percent {
                    value,
                    text,
                    span: token.span,
                }))
            }
            TokenType::Ratio { value, text } => {
                self.advance();
                Ok(self.ctx.alloc(Expr::Ratio {
                    value,
                    text,
                    span: token.span,
                }))
            }
            TokenType::Ident(name) => {
                self.advance();
                if self.at(&TokenType::LParen) {
                    self.parse_call(name, token.span)
                } else {
                    Ok(self.ctx.alloc(Expr::Ident {
                        name,
                        span: token.span,
                    }))
                }
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenType::RParen)?;
                Ok(inner)
            }
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                token.span,
            )
            .with_expected(vec![
                "a number".to_string(),
                "a currency amount".to_string(),
                "a percentage".to_string(),
                "a ratio".to_string(),
                "an identifier".to_string(),
                "'('".to_string(),
            ])),
        }
    }

    /// Parses `Name(arg, ...)`. Only the fixed function set applies;
    /// `TRAILING` gets its own node kind.
    fn parse_call(&mut self, name: proviso_base::Symbol, name_span: proviso_base::Span) -> ParseResult<&'a Expr<'a>> {
        let name_str = self.interner.resolve(name).to_string();
        let func = match Func::from_name(&name_str) {
            Some(f) => Some(f),
            None if name_str == "TRAILING" => None,
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::UnknownFunction { name: name_str },
                    name_span,
                ))
            }
        };

        self.expect(TokenType::LParen)?;
        let mut args = Vec::new();
        if !self.at(&TokenType::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.eat(&TokenType::Comma) {
                    if self.at(&TokenType::RParen) {
                        return Err(ParseError::new(
                            ParseErrorKind::TrailingComma,
                            self.current_span(),
                        ));
                    }
                    continue;
                }
                break;
            }
        }
        let close = self.expect(TokenType::RParen)?;
        let span = name_span.merge(close);

        match func {
            Some(func) => {
                let args = self.ctx.alloc_args(args);
                Ok(self.ctx.alloc(Expr::Call { func, args, span }))
            }
            None => {
                // TRAILING(expr): the period-qualified node.
                if args.len() != 1 {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken {
                            found_desc: format!("{} argument(s) to TRAILING", args.len()),
                        },
                        span,
                    )
                    .with_expected(vec!["exactly one argument".to_string()]));
                }
                Ok(self.ctx.alloc(Expr::Trailing {
                    inner: args[0],
                    span,
                }))
            }
        }
    }
}
