//! Canonical source rendering.
//!
//! Renders any AST back to ProViso source text. Literals print their
//! preserved lexemes, so a parsed program prints back to its original
//! spelling; freshly built trees print with the formatter's canonical
//! spacing. Re-parsing the output yields a structurally equal tree.

use proviso_base::Interner;

use crate::ast::{BasketShape, BinaryOp, Exception, Expr, LogicalOp, Program, Stmt, UnaryOp};

/// Precedence levels for parenthesization, loosest to tightest.
fn precedence(expr: &Expr<'_>) -> u8 {
    match expr {
        Expr::Logical { op: LogicalOp::Or, .. } => 1,
        Expr::Logical { op: LogicalOp::And, .. } => 2,
        Expr::Compare { .. } => 3,
        Expr::Binary { op: BinaryOp::Add | BinaryOp::Sub, .. } => 4,
        Expr::Binary { op: BinaryOp::Mul | BinaryOp::Div, .. } => 5,
        Expr::Unary { .. } => 6,
        _ => 7,
    }
}

/// Renders a whole program, one statement per line, blank line between
/// statements.
pub fn render_program(program: &Program<'_>, interner: &Interner) -> String {
    let rendered: Vec<String> = program
        .statements
        .iter()
        .map(|stmt| render_statement(stmt, interner))
        .collect();
    rendered.join("\n\n")
}

pub fn render_statement(stmt: &Stmt<'_>, interner: &Interner) -> String {
    match stmt {
        Stmt::Define(def) => {
            let mut out = format!(
                "DEFINE {} AS {}",
                interner.resolve(def.name),
                render_expr(def.body, interner)
            );
            if !def.excluding.is_empty() {
                let names: Vec<&str> =
                    def.excluding.iter().map(|s| interner.resolve(*s)).collect();
                out.push_str(&format!(" EXCLUDING {}", names.join(", ")));
            }
            if let Some(cap) = def.cap {
                out.push_str(&format!(" CAP {}", render_expr(cap, interner)));
            }
            out
        }
        Stmt::Covenant(cov) => {
            let mut out = format!("COVENANT {}", interner.resolve(cov.name));
            if let Some(req) = &cov.requires {
                out.push_str(&format!(
                    " REQUIRES {} {} {}",
                    render_expr(req.lhs, interner),
                    req.op.symbol(),
                    render_expr(req.rhs, interner)
                ));
            }
            if let Some(freq) = cov.tested {
                out.push_str(&format!(" TESTED {}", freq.keyword()));
            }
            if let Some(cure) = &cov.cure {
                out.push_str(&format!(
                    " CURE {} MAXIMUM {}",
                    interner.resolve(cure.kind),
                    cure.max_uses
                ));
                if let Some(period) = cure.period {
                    out.push_str(&format!(" {}", interner.resolve(period)));
                }
                if let Some(amount) = cure.max_amount {
                    out.push_str(&format!(" CAP {}", render_expr(amount, interner)));
                }
            }
            if let Some(breach) = cov.breach {
                out.push_str(&format!(" BREACH {}", interner.resolve(breach)));
            }
            out
        }
        Stmt::Basket(basket) => {
            let mut out = format!("BASKET {}", interner.resolve(basket.name));
            match &basket.shape {
                BasketShape::Fixed {
                    capacity,
                    plus,
                    floor,
                } => {
                    out.push_str(&format!(" CAPACITY {}", render_expr(capacity, interner)));
                    for addition in plus {
                        out.push_str(&format!(" PLUS {}", render_expr(addition, interner)));
                    }
                    if let Some(floor) = floor {
                        out.push_str(&format!(" FLOOR {}", render_expr(floor, interner)));
                    }
                }
                BasketShape::Builder {
                    builds_from,
                    starting,
                    maximum,
                } => {
                    out.push_str(&format!(
                        " BUILDS_FROM {}",
                        render_expr(builds_from, interner)
                    ));
                    if let Some(starting) = starting {
                        out.push_str(&format!(" STARTING {}", render_expr(starting, interner)));
                    }
                    if let Some(maximum) = maximum {
                        out.push_str(&format!(" MAXIMUM {}", render_expr(maximum, interner)));
                    }
                }
            }
            if !basket.subject_to.is_empty() {
                let names: Vec<&str> = basket
                    .subject_to
                    .iter()
                    .map(|s| interner.resolve(*s))
                    .collect();
                out.push_str(&format!(" SUBJECT TO {}", names.join(", ")));
            }
            out
        }
        Stmt::Condition(cond) => format!(
            "CONDITION {} AS {}",
            interner.resolve(cond.name),
            render_expr(cond.body, interner)
        ),
        Stmt::Prohibit(pro) => {
            let mut out = format!("PROHIBIT {}", interner.resolve(pro.target));
            for exception in &pro.exceptions {
                match exception {
                    Exception::When { conditions, .. } => {
                        let parts: Vec<String> = conditions
                            .iter()
                            .map(|c| render_expr(c, interner))
                            .collect();
                        out.push_str(&format!(" EXCEPT WHEN {}", parts.join(" AND ")));
                    }
                    Exception::Basket { name, .. } => {
                        out.push_str(&format!(" EXCEPT {}", interner.resolve(*name)));
                    }
                }
            }
            out
        }
        Stmt::Event(event) => {
            let mut out = format!(
                "EVENT {} TRIGGERS {}",
                interner.resolve(event.name),
                render_expr(event.trigger, interner)
            );
            if let Some(days) = event.grace_days {
                out.push_str(&format!(" GRACE_PERIOD {}", format_days(days)));
            }
            if let Some(consequence) = event.consequence {
                out.push_str(&format!(" CONSEQUENCE {}", interner.resolve(consequence)));
            }
            out
        }
    }
}

pub fn render_expr(expr: &Expr<'_>, interner: &Interner) -> String {
    match expr {
        Expr::Number { text, .. }
        | Expr::Currency { text, .. }
        | Expr::Percent { text, .. }
        | Expr::Ratio { text, .. } => interner.resolve(*text).to_string(),
        Expr::Ident { name, .. } => interner.resolve(*name).to_string(),
        Expr::Binary {
            op, left, right, ..
        } => {
            let symbol = match op {
                BinaryOp::Add => "+",
                BinaryOp::Sub => "-",
                BinaryOp::Mul => "*",
                BinaryOp::Div => "/",
            };
            format!(
                "{} {} {}",
                child(expr, left, interner),
                symbol,
                child_right(expr, right, interner)
            )
        }
        Expr::Logical {
            op, left, right, ..
        } => {
            let symbol = match op {
                LogicalOp::And => "AND",
                LogicalOp::Or => "OR",
            };
            format!(
                "{} {} {}",
                child(expr, left, interner),
                symbol,
                child_right(expr, right, interner)
            )
        }
        Expr::Unary { op, operand, .. } => match op {
            UnaryOp::Neg => format!("-{}", child(expr, operand, interner)),
            UnaryOp::Not => format!("NOT {}", child(expr, operand, interner)),
        },
        Expr::Compare {
            op, left, right, ..
        } => format!(
            "{} {} {}",
            child(expr, left, interner),
            op.symbol(),
            child(expr, right, interner)
        ),
        Expr::Call { func, args, .. } => {
            let parts: Vec<String> = args.iter().map(|a| render_expr(a, interner)).collect();
            format!("{}({})", func.name(), parts.join(", "))
        }
        Expr::Trailing { inner, .. } => {
            format!("TRAILING({})", render_expr(inner, interner))
        }
    }
}

/// Renders a child, parenthesizing when its precedence is looser than the
/// parent's.
fn child(parent: &Expr<'_>, node: &Expr<'_>, interner: &Interner) -> String {
    let rendered = render_expr(node, interner);
    if precedence(node) < precedence(parent) {
        format!("({})", rendered)
    } else {
        rendered
    }
}

/// Right operands of the left-associative operators also need parens at
/// equal precedence, or `A - (B - C)` would re-parse as `(A - B) - C`.
fn child_right(parent: &Expr<'_>, node: &Expr<'_>, interner: &Interner) -> String {
    let rendered = render_expr(node, interner);
    if precedence(node) <= precedence(parent) {
        format!("({})", rendered)
    } else {
        rendered
    }
}

/// Days render as integers when whole.
fn format_days(days: f64) -> String {
    if days.fract() == 0.0 {
        format!("{}", days as i64)
    } else {
        format!("{}", days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_ctx::AstArena;
    use crate::compile;
    use proviso_base::Interner;

    /// Parse, render, and re-parse in the same interner; the trees must be
    /// structurally equal.
    fn assert_round_trips(source: &str) {
        let arena = AstArena::new();
        let mut interner = Interner::new();

        let first = compile::parse(source, &arena, &mut interner).expect("first parse");
        let rendered = render_program(&first, &interner);
        let second = compile::parse(&rendered, &arena, &mut interner)
            .unwrap_or_else(|e| panic!("re-parse of {:?} failed: {}", rendered, e));
        assert!(
            first.structural_eq(&second),
            "round trip changed the tree:\n{}",
            rendered
        );
    }

    #[test]
    fn define_round_trips() {
        assert_round_trips("DEFINE Leverage AS TotalDebt / EBITDA");
    }

    #[test]
    fn covenant_with_everything_round_trips() {
        assert_round_trips(
            "COVENANT MaxLeverage REQUIRES Leverage <= 4.50 TESTED QUARTERLY \
             CURE EquityCure MAXIMUM 2 LifeOfFacility CAP $50,000,000 BREACH EventOfDefault",
        );
    }

    #[test]
    fn grower_basket_round_trips() {
        assert_round_trips(
            "BASKET G CAPACITY 15% * EBITDA PLUS RetainedECF FLOOR $15,000,000 SUBJECT TO NoDefault",
        );
    }

    #[test]
    fn builder_basket_round_trips() {
        assert_round_trips(
            "BASKET CNI BUILDS_FROM 50% * CumulativeNetIncome STARTING $10,000,000 MAXIMUM $100,000,000",
        );
    }

    #[test]
    fn prohibit_round_trips() {
        assert_round_trips(
            "PROHIBIT Dividends EXCEPT WHEN amount <= AVAILABLE(RP) AND NoDefault EXCEPT General",
        );
    }

    #[test]
    fn event_round_trips() {
        assert_round_trips(
            "EVENT CrossDefault TRIGGERS OtherDebtDefaulted > $25,000,000 GRACE_PERIOD 30 CONSEQUENCE Acceleration",
        );
    }

    #[test]
    fn nested_parens_are_preserved_where_needed() {
        assert_round_trips("DEFINE X AS (A + B) * C");
    }

    #[test]
    fn right_associated_subtraction_keeps_its_grouping() {
        assert_round_trips("DEFINE X AS A - (B - C)");
        assert_round_trips("DEFINE X AS A / (B / C)");
    }

    #[test]
    fn literal_lexemes_survive() {
        let arena = AstArena::new();
        let mut interner = Interner::new();
        let program =
            compile::parse("BASKET Inv CAPACITY $25,000,000", &arena, &mut interner).unwrap();
        let rendered = render_program(&program, &interner);
        assert!(rendered.contains("$25,000,000"), "kept the lexeme: {}", rendered);
    }

    #[test]
    fn comments_do_not_survive_but_semantics_do() {
        let arena = AstArena::new();
        let mut interner = Interner::new();
        let program = compile::parse(
            "// leverage\nDEFINE Leverage AS TotalDebt / EBITDA",
            &arena,
            &mut interner,
        )
        .unwrap();
        let rendered = render_program(&program, &interner);
        assert!(!rendered.contains("//"));
        assert!(rendered.starts_with("DEFINE Leverage"));
    }
}
