//! Canonical legal prose from a parsed program.
//!
//! Each statement renders as one numbered section; the numbering is
//! deterministic so drift detection can key the expected and observed
//! texts the same way without persisted metadata:
//!
//! | Article | Contents |
//! |---------|----------|
//! | 1 | Defined terms and conditions |
//! | 6 | Financial covenants |
//! | 7 | Baskets and negative covenants |
//! | 8 | Events of default |

use proviso_base::Interner;
use proviso_language::ast::{
    BasketShape, CompareOp, Exception, Expr, Func, LogicalOp, Program, Stmt, UnaryOp,
};

use crate::display::{
    compare_phrase, format_currency_amount, format_percent, format_ratio_prose, frequency_phrase,
    group_thousands, metric_display, split_camel_case,
};

/// A rendered prose document plus the section map back into the program.
#[derive(Debug, Clone)]
pub struct ProseDocument {
    pub text: String,
    pub sections: Vec<SectionEntry>,
}

/// One section's key and the statement it came from.
#[derive(Debug, Clone)]
pub struct SectionEntry {
    /// `"6.1"`, `"7.2"`, ...
    pub key: String,
    pub statement_index: usize,
}

/// Renders the whole program as numbered legal prose.
pub fn render_prose(program: &Program<'_>, interner: &Interner) -> ProseDocument {
    let mut text_parts = Vec::new();
    let mut sections = Vec::new();
    let mut counters = [0usize; 4]; // articles 1, 6, 7, 8

    for (index, stmt) in program.statements.iter().enumerate() {
        let (article, slot) = match stmt {
            Stmt::Define(_) | Stmt::Condition(_) => (1, 0),
            Stmt::Covenant(_) => (6, 1),
            Stmt::Basket(_) | Stmt::Prohibit(_) => (7, 2),
            Stmt::Event(_) => (8, 3),
        };
        counters[slot] += 1;
        let key = format!("{}.{}", article, counters[slot]);
        let body = statement_prose(stmt, interner);
        text_parts.push(format!("Section {}. {}", key, body));
        sections.push(SectionEntry {
            key,
            statement_index: index,
        });
    }

    ProseDocument {
        text: text_parts.join("\n\n"),
        sections,
    }
}

fn statement_prose(stmt: &Stmt<'_>, interner: &Interner) -> String {
    match stmt {
        Stmt::Define(def) => {
            let mut out = format!(
                "\"{}\" means {}",
                interner.resolve(def.name),
                expr_prose(def.body, interner)
            );
            if !def.excluding.is_empty() {
                let names: Vec<String> = def
                    .excluding
                    .iter()
                    .map(|s| split_camel_case(interner.resolve(*s)))
                    .collect();
                out.push_str(&format!(", excluding {}", join_and(&names)));
            }
            if let Some(cap) = def.cap {
                out.push_str(&format!(
                    ", capped at {}",
                    expr_prose(cap, interner)
                ));
            }
            out.push('.');
            out
        }
        Stmt::Condition(cond) => format!(
            "\"{}\" means that {}.",
            interner.resolve(cond.name),
            expr_prose(cond.body, interner)
        ),
        Stmt::Covenant(cov) => {
            let heading = split_camel_case(interner.resolve(cov.name));
            let mut out = format!("{}. ", heading);
            match &cov.requires {
                Some(req) => {
                    let metric = expr_prose(req.lhs, interner);
                    let threshold = threshold_prose(req.rhs, interner);
                    let sentence = match req.op {
                        CompareOp::LtEq | CompareOp::Lt => format!(
                            "The Borrower shall not permit the {} to exceed {}",
                            metric, threshold
                        ),
                        CompareOp::GtEq | CompareOp::Gt => format!(
                            "The Borrower shall maintain the {} at not less than {}",
                            metric, threshold
                        ),
                        CompareOp::Eq | CompareOp::NotEq => format!(
                            "The Borrower shall ensure that the {} {} {}",
                            metric,
                            compare_phrase(req.op),
                            threshold
                        ),
                    };
                    out.push_str(&sentence);
                }
                None => out.push_str("The Borrower shall comply with this covenant"),
            }
            if let Some(freq) = cov.tested {
                out.push(' ');
                out.push_str(frequency_phrase(freq));
            }
            out.push('.');
            if let Some(cure) = &cov.cure {
                out.push_str(&format!(
                    " The Borrower may exercise the {} no more than {} times",
                    split_camel_case(interner.resolve(cure.kind)),
                    cure.max_uses
                ));
                if let Some(period) = cure.period {
                    out.push_str(&format!(
                        " over the {}",
                        split_camel_case(interner.resolve(period))
                    ));
                }
                if let Some(amount) = cure.max_amount {
                    out.push_str(&format!(
                        ", in an aggregate amount not to exceed {}",
                        expr_prose(amount, interner)
                    ));
                }
                out.push('.');
            }
            if let Some(breach) = cov.breach {
                out.push_str(&format!(
                    " An uncured breach shall constitute an {}.",
                    split_camel_case(interner.resolve(breach))
                ));
            }
            out
        }
        Stmt::Basket(basket) => {
            let display = split_camel_case(interner.resolve(basket.name));
            let mut out = format!("{}. ", display);
            match &basket.shape {
                BasketShape::Fixed {
                    capacity,
                    plus,
                    floor,
                } => {
                    let mut base = expr_prose(capacity, interner);
                    for addition in plus {
                        base.push_str(&format!(" plus {}", expr_prose(addition, interner)));
                    }
                    let amount = match floor {
                        Some(floor) => format!(
                            "the greater of {} and {}",
                            expr_prose(floor, interner),
                            base
                        ),
                        None => base,
                    };
                    out.push_str(&format!(
                        "The Borrower may utilize the {} Basket in an aggregate amount not to exceed {}",
                        display, amount
                    ));
                }
                BasketShape::Builder {
                    builds_from,
                    starting,
                    maximum,
                } => {
                    let accrual = expr_prose(builds_from, interner);
                    let amount = match starting {
                        Some(starting) => format!(
                            "the sum of {} plus {}",
                            expr_prose(starting, interner),
                            accrual
                        ),
                        None => accrual,
                    };
                    out.push_str(&format!(
                        "The Borrower may utilize the {} Basket in an aggregate amount not to exceed {}",
                        display, amount
                    ));
                    if let Some(maximum) = maximum {
                        out.push_str(&format!(
                            ", up to a maximum of {}",
                            expr_prose(maximum, interner)
                        ));
                    }
                }
            }
            if !basket.subject_to.is_empty() {
                let names: Vec<String> = basket
                    .subject_to
                    .iter()
                    .map(|s| split_camel_case(interner.resolve(*s)))
                    .collect();
                out.push_str(&format!(", so long as {}", join_and(&names)));
            }
            out.push('.');
            out
        }
        Stmt::Prohibit(pro) => {
            let target = split_camel_case(interner.resolve(pro.target));
            let mut out = format!("The Borrower shall not make or permit any {}", target);
            if !pro.exceptions.is_empty() {
                out.push_str(", except ");
                let parts: Vec<String> = pro
                    .exceptions
                    .iter()
                    .enumerate()
                    .map(|(i, exception)| {
                        let label = (b'a' + i as u8) as char;
                        match exception {
                            Exception::When { conditions, .. } => {
                                let conds: Vec<String> = conditions
                                    .iter()
                                    .map(|c| expr_prose(c, interner))
                                    .collect();
                                format!("({}) when {}", label, join_and(&conds))
                            }
                            Exception::Basket { name, .. } => format!(
                                "({}) to the extent of availability under the {} Basket",
                                label,
                                split_camel_case(interner.resolve(*name))
                            ),
                        }
                    })
                    .collect();
                out.push_str(&parts.join("; "));
            }
            out.push('.');
            out
        }
        Stmt::Event(event) => {
            let heading = split_camel_case(interner.resolve(event.name));
            let mut out = format!(
                "{}. An Event of Default shall occur if {}",
                heading,
                expr_prose(event.trigger, interner)
            );
            if let Some(days) = event.grace_days {
                out.push_str(&format!(
                    ", subject to a grace period of {} days",
                    if days.fract() == 0.0 {
                        format!("{}", days as i64)
                    } else {
                        format!("{}", days)
                    }
                ));
            }
            if let Some(consequence) = event.consequence {
                out.push_str(&format!(
                    ", whereupon {} shall result",
                    split_camel_case(interner.resolve(consequence))
                ));
            }
            out.push('.');
            out
        }
    }
}

/// Covenant thresholds written as ratios ("4.50 to 1.00") when the figure
/// is a bare number or ratio literal; money and percentages keep their own
/// spellings.
fn threshold_prose(expr: &Expr<'_>, interner: &Interner) -> String {
    match expr {
        Expr::Number { value, .. } | Expr::Ratio { value, .. } => format_ratio_prose(*value),
        other => expr_prose(other, interner),
    }
}

/// Renders an expression as agreement prose.
pub fn expr_prose(expr: &Expr<'_>, interner: &Interner) -> String {
    match expr {
        Expr::Number { value, .. } => group_thousands_full(*value),
        Expr::Currency { value, code, .. } => {
            let code = interner.resolve(*code);
            if code == "USD" {
                format_currency_amount(*value)
            } else {
                format!("{} {}", format_currency_amount(*value), code)
            }
        }
        Expr::Percent { value, .. } => format_percent(*value),
        Expr::Ratio { value, .. } => format_ratio_prose(*value),
        Expr::Ident { name, .. } => {
            let text = interner.resolve(*name);
            if text == "amount" {
                "the amount thereof".to_string()
            } else {
                metric_display(text)
            }
        }
        Expr::Binary {
            op, left, right, ..
        } => {
            use proviso_language::BinaryOp;
            match op {
                BinaryOp::Mul => {
                    // `15% * EBITDA` reads "15% of Consolidated EBITDA".
                    if let Expr::Percent { .. } = left {
                        return format!(
                            "{} of {}",
                            expr_prose(left, interner),
                            expr_prose(right, interner)
                        );
                    }
                    if let Expr::Percent { .. } = right {
                        return format!(
                            "{} of {}",
                            expr_prose(right, interner),
                            expr_prose(left, interner)
                        );
                    }
                    format!(
                        "{} multiplied by {}",
                        expr_prose(left, interner),
                        expr_prose(right, interner)
                    )
                }
                BinaryOp::Div => format!(
                    "the ratio of {} to {}",
                    expr_prose(left, interner),
                    expr_prose(right, interner)
                ),
                BinaryOp::Add => format!(
                    "the sum of {} plus {}",
                    expr_prose(left, interner),
                    expr_prose(right, interner)
                ),
                BinaryOp::Sub => format!(
                    "{} minus {}",
                    expr_prose(left, interner),
                    expr_prose(right, interner)
                ),
            }
        }
        Expr::Logical {
            op, left, right, ..
        } => {
            let joiner = match op {
                LogicalOp::And => "and",
                LogicalOp::Or => "or",
            };
            format!(
                "{} {} {}",
                expr_prose(left, interner),
                joiner,
                expr_prose(right, interner)
            )
        }
        Expr::Unary { op, operand, .. } => match op {
            UnaryOp::Neg => format!("minus {}", expr_prose(operand, interner)),
            UnaryOp::Not => match operand {
                // "NOT EXISTS(EventOfDefault)" is the no-default rep.
                Expr::Call {
                    func: Func::Exists,
                    args,
                    ..
                } if args.len() == 1 => format!(
                    "no {} has occurred and is continuing",
                    exists_subject(args[0], interner)
                ),
                _ => format!("it is not the case that {}", expr_prose(operand, interner)),
            },
        },
        Expr::Compare {
            op, left, right, ..
        } => format!(
            "{} {} {}",
            expr_prose(left, interner),
            compare_phrase(*op),
            expr_prose(right, interner)
        ),
        Expr::Call { func, args, .. } => match func {
            Func::Available => format!(
                "availability under the {} Basket",
                args.first()
                    .map(|a| exists_subject(a, interner))
                    .unwrap_or_default()
            ),
            Func::Compliant => format!(
                "pro forma compliance with the {}",
                args.first()
                    .map(|a| exists_subject(a, interner))
                    .unwrap_or_default()
            ),
            Func::Exists => format!(
                "a {} has occurred and is continuing",
                args.first()
                    .map(|a| exists_subject(a, interner))
                    .unwrap_or_default()
            ),
            Func::GreaterOf => format!(
                "the greater of {} and {}",
                expr_prose(args[0], interner),
                expr_prose(args[1], interner)
            ),
            Func::LesserOf => format!(
                "the lesser of {} and {}",
                expr_prose(args[0], interner),
                expr_prose(args[1], interner)
            ),
            Func::Not => format!(
                "it is not the case that {}",
                args.first()
                    .map(|a| expr_prose(a, interner))
                    .unwrap_or_default()
            ),
            Func::ProForma => format!(
                "{} on a pro forma basis",
                args.first()
                    .map(|a| expr_prose(a, interner))
                    .unwrap_or_default()
            ),
            Func::Sum => format!(
                "the cumulative amount of {}",
                args.first()
                    .map(|a| expr_prose(a, interner))
                    .unwrap_or_default()
            ),
        },
        Expr::Trailing { inner, .. } => format!(
            "{} for the most recently ended four fiscal quarters",
            expr_prose(inner, interner)
        ),
    }
}

/// Names inside `EXISTS`/`AVAILABLE`/`COMPLIANT` render camel-split.
fn exists_subject(expr: &Expr<'_>, interner: &Interner) -> String {
    match expr {
        Expr::Ident { name, .. } => split_camel_case(interner.resolve(*name)),
        other => expr_prose(other, interner),
    }
}

fn join_and(parts: &[String]) -> String {
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => format!(
            "{} and {}",
            parts[..parts.len() - 1].join(", "),
            parts[parts.len() - 1]
        ),
    }
}

/// Bare numbers in prose keep grouped thousands and any decimals.
fn group_thousands_full(value: f64) -> String {
    if value.fract() == 0.0 {
        group_thousands(value)
    } else {
        let whole = group_thousands(value.trunc());
        let frac = format!("{}", value.fract()).trim_start_matches("0.").to_string();
        format!("{}.{}", whole, frac)
    }
}
