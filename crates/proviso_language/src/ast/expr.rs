//! Expression nodes.

use proviso_base::{Span, Symbol};

/// Arithmetic operators over numerics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation: `-Expr`.
    Neg,
    /// Logical complement: `NOT Expr`.
    Not,
}

/// Comparison operators between numerics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    LtEq,
    GtEq,
    Lt,
    Gt,
    Eq,
    NotEq,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::LtEq => "<=",
            CompareOp::GtEq => ">=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
        }
    }
}

/// The fixed set of callable functions. Any other name applied like a
/// function is a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    /// `AVAILABLE(basket)` — remaining capacity of a basket.
    Available,
    /// `COMPLIANT(covenant)` — whether a covenant currently passes.
    Compliant,
    /// `EXISTS(event_or_state)` — whether an event or runtime state is live.
    Exists,
    /// `GreaterOf(a, b)`.
    GreaterOf,
    /// `LesserOf(a, b)`.
    LesserOf,
    /// `NOT(x)` — function spelling of logical complement.
    Not,
    /// `PROFORMA(expr)` — evaluate under the hypothetical-transaction overlay.
    ProForma,
    /// `SUM(expr)` — fold over the snapshot's period series.
    Sum,
}

impl Func {
    /// Resolves a source name to a function. `TRAILING` is handled
    /// separately because it parses to a dedicated node.
    pub fn from_name(name: &str) -> Option<Func> {
        let f = match name {
            "AVAILABLE" => Func::Available,
            "COMPLIANT" => Func::Compliant,
            "EXISTS" => Func::Exists,
            "GreaterOf" => Func::GreaterOf,
            "LesserOf" => Func::LesserOf,
            "NOT" => Func::Not,
            "PROFORMA" => Func::ProForma,
            "SUM" => Func::Sum,
            _ => return None,
        };
        Some(f)
    }

    pub fn name(self) -> &'static str {
        match self {
            Func::Available => "AVAILABLE",
            Func::Compliant => "COMPLIANT",
            Func::Exists => "EXISTS",
            Func::GreaterOf => "GreaterOf",
            Func::LesserOf => "LesserOf",
            Func::Not => "NOT",
            Func::ProForma => "PROFORMA",
            Func::Sum => "SUM",
        }
    }

    /// Required argument count.
    pub fn arity(self) -> usize {
        match self {
            Func::GreaterOf | Func::LesserOf => 2,
            _ => 1,
        }
    }
}

/// An expression node. Numeric literals keep their interned source lexeme
/// (`text`) so the formatter reproduces the original spelling.
#[derive(Debug)]
pub enum Expr<'a> {
    Number {
        value: f64,
        text: Symbol,
        span: Span,
    },
    /// A money amount with its ISO currency code (`USD` unless written).
    Currency {
        value: f64,
        code: Symbol,
        text: Symbol,
        span: Span,
    },
    /// A percentage literal; `value` is the written figure (`15` for `15%`).
    Percent {
        value: f64,
        text: Symbol,
        span: Span,
    },
    /// A turns-of-leverage ratio literal (`4.50x`).
    Ratio {
        value: f64,
        text: Symbol,
        span: Span,
    },
    /// A bare name, resolved against the symbol table or the financial
    /// data snapshot at evaluation time.
    Ident { name: Symbol, span: Span },
    Binary {
        op: BinaryOp,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
        span: Span,
    },
    Logical {
        op: LogicalOp,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: &'a Expr<'a>,
        span: Span,
    },
    Compare {
        op: CompareOp,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
        span: Span,
    },
    Call {
        func: Func,
        args: &'a [&'a Expr<'a>],
        span: Span,
    },
    /// `TRAILING(expr)` — the period-qualified (trailing-twelve-months)
    /// reading of the inner expression.
    Trailing { inner: &'a Expr<'a>, span: Span },
}

impl<'a> Expr<'a> {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number { span, .. }
            | Expr::Currency { span, .. }
            | Expr::Percent { span, .. }
            | Expr::Ratio { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Logical { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Compare { span, .. }
            | Expr::Call { span, .. }
            | Expr::Trailing { span, .. } => *span,
        }
    }

    /// Structural equality, disregarding spans. Literal comparison uses
    /// both value and lexeme, so `1000` and `1,000` are distinct trees.
    pub fn structural_eq(&self, other: &Expr<'_>) -> bool {
        match (self, other) {
            (
                Expr::Number { value: v1, text: t1, .. },
                Expr::Number { value: v2, text: t2, .. },
            ) => v1 == v2 && t1 == t2,
            (
                Expr::Currency { value: v1, code: c1, text: t1, .. },
                Expr::Currency { value: v2, code: c2, text: t2, .. },
            ) => v1 == v2 && c1 == c2 && t1 == t2,
            (
                Expr::Percent { value: v1, text: t1, .. },
                Expr::Percent { value: v2, text: t2, .. },
            ) => v1 == v2 && t1 == t2,
            (
                Expr::Ratio { value: v1, text: t1, .. },
                Expr::Ratio { value: v2, text: t2, .. },
            ) => v1 == v2 && t1 == t2,
            (Expr::Ident { name: n1, .. }, Expr::Ident { name: n2, .. }) => n1 == n2,
            (
                Expr::Binary { op: o1, left: l1, right: r1, .. },
                Expr::Binary { op: o2, left: l2, right: r2, .. },
            ) => o1 == o2 && l1.structural_eq(l2) && r1.structural_eq(r2),
            (
                Expr::Logical { op: o1, left: l1, right: r1, .. },
                Expr::Logical { op: o2, left: l2, right: r2, .. },
            ) => o1 == o2 && l1.structural_eq(l2) && r1.structural_eq(r2),
            (
                Expr::Unary { op: o1, operand: e1, .. },
                Expr::Unary { op: o2, operand: e2, .. },
            ) => o1 == o2 && e1.structural_eq(e2),
            (
                Expr::Compare { op: o1, left: l1, right: r1, .. },
                Expr::Compare { op: o2, left: l2, right: r2, .. },
            ) => o1 == o2 && l1.structural_eq(l2) && r1.structural_eq(r2),
            (
                Expr::Call { func: f1, args: a1, .. },
                Expr::Call { func: f2, args: a2, .. },
            ) => {
                f1 == f2
                    && a1.len() == a2.len()
                    && a1.iter().zip(a2.iter()).all(|(x, y)| x.structural_eq(y))
            }
            (Expr::Trailing { inner: i1, .. }, Expr::Trailing { inner: i2, .. }) => {
                i1.structural_eq(i2)
            }
            _ => false,
        }
    }
}
