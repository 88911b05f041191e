use proviso_base::Interner;

use crate::arena_ctx::AstArena;
use crate::ast::{BasketShape, CompareOp, Exception, Expr, Frequency, Func, Program, Stmt};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::Lexer;

use super::Parser;

fn parse_with<'a>(
    source: &str,
    arena: &'a AstArena,
    interner: &mut Interner,
) -> Result<Program<'a>, ParseError> {
    let tokens = Lexer::new(source, interner).tokenize()?;
    Parser::new(tokens, interner, arena.ctx()).parse()
}

macro_rules! parse_ok {
    ($source:expr, $program:ident, $interner:ident, $body:block) => {
        let arena = AstArena::new();
        let mut $interner = Interner::new();
        let $program = parse_with($source, &arena, &mut $interner).expect("parses cleanly");
        $body
    };
}

fn parse_err(source: &str) -> ParseError {
    let arena = AstArena::new();
    let mut interner = Interner::new();
    parse_with(source, &arena, &mut interner).expect_err("should not parse")
}

#[test]
fn define_with_division() {
    parse_ok!("DEFINE Leverage AS TotalDebt / EBITDA", program, interner, {
        assert_eq!(program.statements.len(), 1);
        let Stmt::Define(def) = &program.statements[0] else {
            panic!("expected define");
        };
        assert_eq!(interner.resolve(def.name), "Leverage");
        assert!(matches!(def.body, Expr::Binary { .. }));
        assert!(def.excluding.is_empty());
        assert!(def.cap.is_none());
    });
}

#[test]
fn define_with_excluding_and_cap() {
    parse_ok!(
        "DEFINE AdjustedEBITDA AS EBITDA + Addbacks EXCLUDING NonRecurring, Extraordinary CAP 25% * EBITDA",
        program,
        interner,
        {
            let Stmt::Define(def) = &program.statements[0] else {
                panic!("expected define");
            };
            let names: Vec<&str> = def.excluding.iter().map(|s| interner.resolve(*s)).collect();
            assert_eq!(names, ["NonRecurring", "Extraordinary"]);
            assert!(def.cap.is_some());
        }
    );
}

#[test]
fn covenant_full_form() {
    parse_ok!(
        "COVENANT MaxLeverage REQUIRES Leverage <= 4.50 TESTED QUARTERLY \
         CURE EquityCure MAXIMUM 2 LifeOfFacility CAP $50,000,000 BREACH EventOfDefault",
        program,
        interner,
        {
            let Stmt::Covenant(cov) = &program.statements[0] else {
                panic!("expected covenant");
            };
            let req = cov.requires.as_ref().expect("has requirement");
            assert_eq!(req.op, CompareOp::LtEq);
            assert_eq!(cov.tested, Some(Frequency::Quarterly));
            let cure = cov.cure.as_ref().expect("has cure");
            assert_eq!(interner.resolve(cure.kind), "EquityCure");
            assert_eq!(cure.max_uses, 2);
            assert_eq!(cure.period.map(|p| interner.resolve(p)), Some("LifeOfFacility"));
            assert!(cure.max_amount.is_some());
            assert_eq!(cov.breach.map(|b| interner.resolve(b)), Some("EventOfDefault"));
        }
    );
}

#[test]
fn frequency_accepts_semi_annual_spellings() {
    parse_ok!(
        "COVENANT A REQUIRES X <= 1 TESTED SEMI_ANNUALLY\n\
         COVENANT B REQUIRES X <= 1 TESTED SEMIANNUALLY",
        program,
        _interner,
        {
            for stmt in &program.statements {
                let Stmt::Covenant(cov) = stmt else { panic!() };
                assert_eq!(cov.tested, Some(Frequency::SemiAnnually));
            }
        }
    );
}

#[test]
fn fixed_basket_with_grower_and_floor() {
    parse_ok!(
        "BASKET General CAPACITY 15% * EBITDA PLUS RetainedECF FLOOR $15,000,000 SUBJECT TO NoDefault",
        program,
        interner,
        {
            let Stmt::Basket(basket) = &program.statements[0] else {
                panic!("expected basket");
            };
            let BasketShape::Fixed { plus, floor, .. } = &basket.shape else {
                panic!("expected fixed shape");
            };
            assert_eq!(plus.len(), 1);
            assert!(floor.is_some());
            assert_eq!(
                basket.subject_to.iter().map(|s| interner.resolve(*s)).collect::<Vec<_>>(),
                ["NoDefault"]
            );
        }
    );
}

#[test]
fn builder_basket_shape() {
    parse_ok!(
        "BASKET CNI BUILDS_FROM 50% * CumulativeNetIncome STARTING $10,000,000 MAXIMUM $100,000,000",
        program,
        _interner,
        {
            let Stmt::Basket(basket) = &program.statements[0] else {
                panic!("expected basket");
            };
            let BasketShape::Builder { starting, maximum, .. } = &basket.shape else {
                panic!("expected builder shape");
            };
            assert!(starting.is_some());
            assert!(maximum.is_some());
        }
    );
}

#[test]
fn prohibit_with_when_and_basket_exceptions() {
    parse_ok!(
        "PROHIBIT Dividends \
         EXCEPT WHEN amount <= AVAILABLE(RP) AND NoDefault \
         EXCEPT GeneralBasket",
        program,
        interner,
        {
            let Stmt::Prohibit(pro) = &program.statements[0] else {
                panic!("expected prohibition");
            };
            assert_eq!(interner.resolve(pro.target), "Dividends");
            assert_eq!(pro.exceptions.len(), 2);
            let Exception::When { conditions, .. } = &pro.exceptions[0] else {
                panic!("expected EXCEPT WHEN");
            };
            assert_eq!(conditions.len(), 2, "AND separates subconditions");
            let Exception::Basket { name, .. } = &pro.exceptions[1] else {
                panic!("expected EXCEPT basket");
            };
            assert_eq!(interner.resolve(*name), "GeneralBasket");
        }
    );
}

#[test]
fn event_with_grace_and_consequence() {
    parse_ok!(
        "EVENT CrossDefault TRIGGERS OtherDebtDefaulted > $25,000,000 GRACE_PERIOD 30 CONSEQUENCE Acceleration",
        program,
        interner,
        {
            let Stmt::Event(event) = &program.statements[0] else {
                panic!("expected event");
            };
            assert_eq!(event.grace_days, Some(30.0));
            assert_eq!(event.consequence.map(|c| interner.resolve(c)), Some("Acceleration"));
        }
    );
}

#[test]
fn condition_with_exists_and_not() {
    parse_ok!(
        "CONDITION NoDefault AS NOT(EXISTS(EventOfDefault))",
        program,
        _interner,
        {
            let Stmt::Condition(cond) = &program.statements[0] else {
                panic!("expected condition");
            };
            let Expr::Unary { operand, .. } = cond.body else {
                panic!("NOT parses as unary");
            };
            assert!(matches!(operand, Expr::Call { func: Func::Exists, .. }));
        }
    );
}

#[test]
fn greater_of_takes_two_arguments() {
    parse_ok!(
        "DEFINE Cushion AS GreaterOf($15,000,000, 15% * EBITDA)",
        program,
        _interner,
        {
            let Stmt::Define(def) = &program.statements[0] else { panic!() };
            let Expr::Call { func, args, .. } = def.body else {
                panic!("expected call");
            };
            assert_eq!(*func, Func::GreaterOf);
            assert_eq!(args.len(), 2);
        }
    );
}

#[test]
fn trailing_gets_its_own_node() {
    parse_ok!("DEFINE TTM AS TRAILING(Revenue)", program, _interner, {
        let Stmt::Define(def) = &program.statements[0] else { panic!() };
        assert!(matches!(def.body, Expr::Trailing { .. }));
    });
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    parse_ok!("DEFINE X AS A + B * C", program, _interner, {
        let Stmt::Define(def) = &program.statements[0] else { panic!() };
        let Expr::Binary { op, right, .. } = def.body else { panic!() };
        assert_eq!(*op, crate::ast::BinaryOp::Add);
        assert!(matches!(right, Expr::Binary { .. }), "B * C groups first");
    });
}

#[test]
fn comments_between_statements() {
    parse_ok!(
        "// financial definitions\nDEFINE X AS A\n\n// covenants\nCOVENANT C REQUIRES X <= 1",
        program,
        _interner,
        {
            assert_eq!(program.statements.len(), 2);
        }
    );
}

#[test]
fn unknown_function_is_a_parse_error() {
    let err = parse_err("DEFINE X AS Median(A, B)");
    assert!(matches!(err.kind, ParseErrorKind::UnknownFunction { .. }));
}

#[test]
fn trailing_comma_rejected_in_args() {
    let err = parse_err("DEFINE X AS GreaterOf(A, B,)");
    assert!(matches!(err.kind, ParseErrorKind::TrailingComma));
}

#[test]
fn trailing_comma_rejected_in_excluding_list() {
    let err = parse_err("DEFINE X AS A EXCLUDING B, CAP 5");
    assert!(matches!(err.kind, ParseErrorKind::TrailingComma));
}

#[test]
fn missing_comparison_in_requires() {
    let err = parse_err("COVENANT C REQUIRES Leverage 4.50");
    assert!(matches!(err.kind, ParseErrorKind::ExpectedComparison));
}

#[test]
fn statement_keyword_required() {
    let err = parse_err("Leverage <= 4.50");
    assert!(matches!(err.kind, ParseErrorKind::ExpectedStatement));
    assert!(err.expected.contains(&"COVENANT".to_string()));
}

#[test]
fn unknown_frequency_is_reported() {
    let err = parse_err("COVENANT C REQUIRES X <= 1 TESTED WEEKLY");
    assert!(matches!(err.kind, ParseErrorKind::UnknownFrequency { .. }));
}

#[test]
fn basket_requires_a_shape() {
    let err = parse_err("BASKET Inv SUBJECT TO NoDefault");
    assert!(err.expected.iter().any(|e| e.contains("CAPACITY")));
    assert!(err.expected.iter().any(|e| e.contains("BUILDS_FROM")));
}

#[test]
fn statement_spans_are_monotonic() {
    parse_ok!(
        "DEFINE A AS B\nCOVENANT C REQUIRES A <= 1\nBASKET D CAPACITY 5",
        program,
        _interner,
        {
            for pair in program.statements.windows(2) {
                assert!(pair[0].span().start < pair[1].span().start);
                assert!(pair[0].span().end <= pair[1].span().start);
            }
        }
    );
}
