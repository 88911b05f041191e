//! Statement forms: the six provision kinds.

use crate::ast::{
    BasketShape, BasketStmt, ConditionStmt, CovenantStmt, Cure, DefineStmt, EventStmt, Exception,
    Frequency, ProhibitStmt, Requirement, Stmt,
};
use crate::error::{ParseError, ParseErrorKind};
use crate::token::TokenType;

use super::{ParseResult, Parser};

impl<'a, 'int> Parser<'a, 'int> {
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Stmt<'a>> {
        match self.current().token_type {
            TokenType::Define => self.parse_define(),
            TokenType::Covenant => self.parse_covenant(),
            TokenType::Basket => self.parse_basket(),
            TokenType::Condition => self.parse_condition(),
            TokenType::Prohibit => self.parse_prohibit(),
            TokenType::Event => self.parse_event(),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedStatement,
                self.current_span(),
            )
            .with_expected(vec![
                "DEFINE".to_string(),
                "COVENANT".to_string(),
                "BASKET".to_string(),
                "CONDITION".to_string(),
                "PROHIBIT".to_string(),
                "EVENT".to_string(),
            ])),
        }
    }

    /// `DEFINE Name AS expr [EXCLUDING a, b] [CAP expr]`
    fn parse_define(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenType::Define)?;
        let (name, name_span) = self.expect_ident()?;
        self.expect(TokenType::As)?;
        let body = self.parse_expr()?;

        let mut excluding = Vec::new();
        if self.eat(&TokenType::Excluding) {
            excluding = self.parse_ident_list()?;
        }

        let cap = if self.eat(&TokenType::Cap) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Stmt::Define(DefineStmt {
            name,
            name_span,
            body,
            excluding,
            cap,
            span: start.merge(self.prev_span()),
        }))
    }

    /// `COVENANT Name [REQUIRES cmp] [TESTED freq] [CURE ...] [BREACH event]`
    fn parse_covenant(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenType::Covenant)?;
        let (name, name_span) = self.expect_ident()?;

        let requires = if self.eat(&TokenType::Requires) {
            Some(self.parse_requirement()?)
        } else {
            None
        };

        let tested = if self.eat(&TokenType::Tested) {
            Some(self.parse_frequency()?)
        } else {
            None
        };

        let cure = if self.at(&TokenType::Cure) {
            Some(self.parse_cure()?)
        } else {
            None
        };

        let breach = if self.eat(&TokenType::Breach) {
            Some(self.expect_ident()?.0)
        } else {
            None
        };

        Ok(Stmt::Covenant(CovenantStmt {
            name,
            name_span,
            requires,
            tested,
            cure,
            breach,
            span: start.merge(self.prev_span()),
        }))
    }

    /// The tested comparison: `lhs op rhs` with a mandatory operator.
    fn parse_requirement(&mut self) -> ParseResult<Requirement<'a>> {
        let lhs = self.parse_additive()?;
        let op = self.compare_op().ok_or_else(|| {
            ParseError::new(ParseErrorKind::ExpectedComparison, self.current_span())
                .with_expected(vec![
                    "'<='".to_string(),
                    "'>='".to_string(),
                    "'<'".to_string(),
                    "'>'".to_string(),
                    "'='".to_string(),
                    "'!='".to_string(),
                ])
        })?;
        self.advance();
        let rhs = self.parse_additive()?;
        Ok(Requirement {
            lhs,
            op,
            rhs,
            span: lhs.span().merge(rhs.span()),
        })
    }

    /// Frequency words are contextual identifiers, not keywords.
    fn parse_frequency(&mut self) -> ParseResult<Frequency> {
        let (sym, span) = self.expect_ident()?;
        let word = self.interner.resolve(sym).to_string();
        Frequency::from_word(&word).ok_or_else(|| {
            ParseError::new(ParseErrorKind::UnknownFrequency { word }, span)
        })
    }

    /// `CURE Kind MAXIMUM n [Period] [CAP expr]`
    fn parse_cure(&mut self) -> ParseResult<Cure<'a>> {
        let start = self.expect(TokenType::Cure)?;
        let (kind, _) = self.expect_ident()?;
        self.expect(TokenType::Maximum)?;
        let max_uses = match self.current().token_type {
            TokenType::Number { value, .. } if value >= 0.0 && value.fract() == 0.0 => {
                self.advance();
                value as u32
            }
            _ => return Err(self.unexpected(vec!["a whole number of cure uses".to_string()])),
        };

        let period = match self.current().token_type {
            TokenType::Ident(sym) => {
                self.advance();
                Some(sym)
            }
            _ => None,
        };

        let max_amount = if self.eat(&TokenType::Cap) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Cure {
            kind,
            max_uses,
            period,
            max_amount,
            span: start.merge(self.prev_span()),
        })
    }

    /// `BASKET Name (CAPACITY ... | BUILDS_FROM ...) [SUBJECT TO c, c]`
    fn parse_basket(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenType::Basket)?;
        let (name, name_span) = self.expect_ident()?;

        let shape = if self.eat(&TokenType::Capacity) {
            let capacity = self.parse_additive()?;
            let mut plus = Vec::new();
            while self.eat(&TokenType::Plus) {
                plus.push(self.parse_additive()?);
            }
            let floor = if self.eat(&TokenType::Floor) {
                Some(self.parse_additive()?)
            } else {
                None
            };
            BasketShape::Fixed {
                capacity,
                plus,
                floor,
            }
        } else if self.eat(&TokenType::BuildsFrom) {
            let builds_from = self.parse_additive()?;
            let starting = if self.eat(&TokenType::Starting) {
                Some(self.parse_additive()?)
            } else {
                None
            };
            let maximum = if self.eat(&TokenType::Maximum) {
                Some(self.parse_additive()?)
            } else {
                None
            };
            BasketShape::Builder {
                builds_from,
                starting,
                maximum,
            }
        } else {
            return Err(self.unexpected(vec![
                "CAPACITY".to_string(),
                "BUILDS_FROM".to_string(),
            ]));
        };

        let subject_to = self.parse_subject_to()?;

        Ok(Stmt::Basket(BasketStmt {
            name,
            name_span,
            shape,
            subject_to,
            span: start.merge(self.prev_span()),
        }))
    }

    fn parse_subject_to(&mut self) -> ParseResult<Vec<proviso_base::Symbol>> {
        if self.eat(&TokenType::Subject) {
            self.expect(TokenType::To)?;
            self.parse_ident_list()
        } else {
            Ok(Vec::new())
        }
    }

    /// `CONDITION Name AS expr`
    fn parse_condition(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenType::Condition)?;
        let (name, name_span) = self.expect_ident()?;
        self.expect(TokenType::As)?;
        let body = self.parse_expr()?;
        Ok(Stmt::Condition(ConditionStmt {
            name,
            name_span,
            body,
            span: start.merge(self.prev_span()),
        }))
    }

    /// `PROHIBIT Target (EXCEPT WHEN c [AND c]* | EXCEPT Basket)*`
    fn parse_prohibit(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenType::Prohibit)?;
        let (target, target_span) = self.expect_ident()?;

        let mut exceptions = Vec::new();
        while self.at(&TokenType::Except) {
            let except_span = self.advance().span;
            if self.eat(&TokenType::When) {
                let mut conditions = vec![self.parse_subcondition()?];
                while self.eat(&TokenType::And) {
                    conditions.push(self.parse_subcondition()?);
                }
                let span = except_span.merge(self.prev_span());
                exceptions.push(Exception::When { conditions, span });
            } else {
                let (name, name_span) = self.expect_ident()?;
                exceptions.push(Exception::Basket {
                    name,
                    span: except_span.merge(name_span),
                });
            }
        }

        Ok(Stmt::Prohibit(ProhibitStmt {
            target,
            target_span,
            exceptions,
            span: start.merge(self.prev_span()),
        }))
    }

    /// `EVENT Name TRIGGERS expr [GRACE_PERIOD days] [CONSEQUENCE label]`
    fn parse_event(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenType::Event)?;
        let (name, name_span) = self.expect_ident()?;
        self.expect(TokenType::Triggers)?;
        let trigger = self.parse_expr()?;

        let grace_days = if self.eat(&TokenType::GracePeriod) {
            match self.current().token_type {
                TokenType::Number { value, .. } => {
                    self.advance();
                    Some(value)
                }
                _ => return Err(self.unexpected(vec!["a number of days".to_string()])),
            }
        } else {
            None
        };

        let consequence = if self.eat(&TokenType::Consequence) {
            Some(self.expect_ident()?.0)
        } else {
            None
        };

        Ok(Stmt::Event(EventStmt {
            name,
            name_span,
            trigger,
            grace_days,
            consequence,
            span: start.merge(self.prev_span()),
        }))
    }

    /// Comma-separated identifier list; trailing commas are rejected.
    fn parse_ident_list(&mut self) -> ParseResult<Vec<proviso_base::Symbol>> {
        let mut names = vec![self.expect_ident()?.0];
        while self.eat(&TokenType::Comma) {
            if !matches!(self.current().token_type, TokenType::Ident(_)) {
                return Err(ParseError::new(
                    ParseErrorKind::TrailingComma,
                    self.prev_span(),
                ));
            }
            names.push(self.expect_ident()?.0);
        }
        Ok(names)
    }
}
