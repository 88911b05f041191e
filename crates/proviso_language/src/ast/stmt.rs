//! Statement nodes: the six provision kinds.

use proviso_base::{Span, Symbol};

use super::expr::{CompareOp, Expr};

/// Covenant testing frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Quarterly,
    Monthly,
    Annually,
    SemiAnnually,
}

impl Frequency {
    /// Canonical keyword spelling used by the formatter.
    pub fn keyword(self) -> &'static str {
        match self {
            Frequency::Quarterly => "QUARTERLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Annually => "ANNUALLY",
            Frequency::SemiAnnually => "SEMI_ANNUALLY",
        }
    }

    /// Matches a frequency word case-insensitively; accepts both
    /// `SEMI_ANNUALLY` and `SEMIANNUALLY`.
    pub fn from_word(word: &str) -> Option<Frequency> {
        match word.to_ascii_uppercase().as_str() {
            "QUARTERLY" => Some(Frequency::Quarterly),
            "MONTHLY" => Some(Frequency::Monthly),
            "ANNUALLY" => Some(Frequency::Annually),
            "SEMI_ANNUALLY" | "SEMIANNUALLY" => Some(Frequency::SemiAnnually),
            _ => None,
        }
    }
}

/// `REQUIRES lhs op rhs` — the tested comparison of a covenant.
#[derive(Debug)]
pub struct Requirement<'a> {
    pub lhs: &'a Expr<'a>,
    pub op: CompareOp,
    pub rhs: &'a Expr<'a>,
    pub span: Span,
}

/// `CURE Kind MAXIMUM n Period CAP amount` — a cure right attached to a
/// covenant: the cure kind, how many uses the borrower gets, the period
/// the count runs over, and the largest curable amount.
#[derive(Debug)]
pub struct Cure<'a> {
    pub kind: Symbol,
    pub max_uses: u32,
    pub period: Option<Symbol>,
    pub max_amount: Option<&'a Expr<'a>>,
    pub span: Span,
}

/// `DEFINE Name AS expr [EXCLUDING a, b] [CAP expr]`.
#[derive(Debug)]
pub struct DefineStmt<'a> {
    pub name: Symbol,
    pub name_span: Span,
    pub body: &'a Expr<'a>,
    /// Component names excluded from the aggregate; they resolve to zero
    /// inside this definition's body.
    pub excluding: Vec<Symbol>,
    pub cap: Option<&'a Expr<'a>>,
    pub span: Span,
}

/// `COVENANT Name [REQUIRES cmp] [TESTED freq] [CURE ...] [BREACH event]`.
#[derive(Debug)]
pub struct CovenantStmt<'a> {
    pub name: Symbol,
    pub name_span: Span,
    pub requires: Option<Requirement<'a>>,
    pub tested: Option<Frequency>,
    pub cure: Option<Cure<'a>>,
    /// Event the covenant transitions to on an uncured breach.
    pub breach: Option<Symbol>,
    pub span: Span,
}

/// The two mutually exclusive basket shapes.
#[derive(Debug)]
pub enum BasketShape<'a> {
    /// `CAPACITY expr [PLUS expr]* [FLOOR expr]` — a fixed or grower
    /// basket; capacity is the base plus the additions, never below the
    /// floor.
    Fixed {
        capacity: &'a Expr<'a>,
        plus: Vec<&'a Expr<'a>>,
        floor: Option<&'a Expr<'a>>,
    },
    /// `BUILDS_FROM expr [STARTING expr] [MAXIMUM expr]` — a builder
    /// basket accruing from retained amounts.
    Builder {
        builds_from: &'a Expr<'a>,
        starting: Option<&'a Expr<'a>>,
        maximum: Option<&'a Expr<'a>>,
    },
}

/// `BASKET Name <shape> [SUBJECT TO cond, cond]`.
#[derive(Debug)]
pub struct BasketStmt<'a> {
    pub name: Symbol,
    pub name_span: Span,
    pub shape: BasketShape<'a>,
    pub subject_to: Vec<Symbol>,
    pub span: Span,
}

/// `CONDITION Name AS expr`.
#[derive(Debug)]
pub struct ConditionStmt<'a> {
    pub name: Symbol,
    pub name_span: Span,
    pub body: &'a Expr<'a>,
    pub span: Span,
}

/// One carve-out from a prohibition.
#[derive(Debug)]
pub enum Exception<'a> {
    /// `EXCEPT WHEN c1 AND c2 ...` — permitted while every subcondition
    /// holds. The special identifier `amount` binds to the proposed
    /// action's magnitude here.
    When {
        conditions: Vec<&'a Expr<'a>>,
        span: Span,
    },
    /// `EXCEPT BasketName` — permitted while the proposed amount fits
    /// within the basket's availability.
    Basket { name: Symbol, span: Span },
}

impl Exception<'_> {
    pub fn span(&self) -> Span {
        match self {
            Exception::When { span, .. } | Exception::Basket { span, .. } => *span,
        }
    }
}

/// `PROHIBIT Target [exception]*`.
#[derive(Debug)]
pub struct ProhibitStmt<'a> {
    pub target: Symbol,
    pub target_span: Span,
    pub exceptions: Vec<Exception<'a>>,
    pub span: Span,
}

/// `EVENT Name TRIGGERS expr [GRACE_PERIOD days] [CONSEQUENCE label]`.
#[derive(Debug)]
pub struct EventStmt<'a> {
    pub name: Symbol,
    pub name_span: Span,
    pub trigger: &'a Expr<'a>,
    pub grace_days: Option<f64>,
    pub consequence: Option<Symbol>,
    pub span: Span,
}

/// A top-level statement.
#[derive(Debug)]
pub enum Stmt<'a> {
    Define(DefineStmt<'a>),
    Covenant(CovenantStmt<'a>),
    Basket(BasketStmt<'a>),
    Condition(ConditionStmt<'a>),
    Prohibit(ProhibitStmt<'a>),
    Event(EventStmt<'a>),
}

impl<'a> Stmt<'a> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Define(s) => s.span,
            Stmt::Covenant(s) => s.span,
            Stmt::Basket(s) => s.span,
            Stmt::Condition(s) => s.span,
            Stmt::Prohibit(s) => s.span,
            Stmt::Event(s) => s.span,
        }
    }

    /// The declared name of the statement (the prohibition target for
    /// `PROHIBIT`).
    pub fn name(&self) -> Symbol {
        match self {
            Stmt::Define(s) => s.name,
            Stmt::Covenant(s) => s.name,
            Stmt::Basket(s) => s.name,
            Stmt::Condition(s) => s.name,
            Stmt::Prohibit(s) => s.target,
            Stmt::Event(s) => s.name,
        }
    }

    /// Statement kind as a display word for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Define(_) => "definition",
            Stmt::Covenant(_) => "covenant",
            Stmt::Basket(_) => "basket",
            Stmt::Condition(_) => "condition",
            Stmt::Prohibit(_) => "prohibition",
            Stmt::Event(_) => "event",
        }
    }

    /// Structural equality ignoring spans.
    pub fn structural_eq(&self, other: &Stmt<'_>) -> bool {
        match (self, other) {
            (Stmt::Define(a), Stmt::Define(b)) => {
                a.name == b.name
                    && a.body.structural_eq(b.body)
                    && a.excluding == b.excluding
                    && opt_expr_eq(a.cap, b.cap)
            }
            (Stmt::Covenant(a), Stmt::Covenant(b)) => {
                a.name == b.name
                    && a.tested == b.tested
                    && a.breach == b.breach
                    && match (&a.requires, &b.requires) {
                        (Some(x), Some(y)) => {
                            x.op == y.op
                                && x.lhs.structural_eq(y.lhs)
                                && x.rhs.structural_eq(y.rhs)
                        }
                        (None, None) => true,
                        _ => false,
                    }
                    && match (&a.cure, &b.cure) {
                        (Some(x), Some(y)) => {
                            x.kind == y.kind
                                && x.max_uses == y.max_uses
                                && x.period == y.period
                                && opt_expr_eq(x.max_amount, y.max_amount)
                        }
                        (None, None) => true,
                        _ => false,
                    }
            }
            (Stmt::Basket(a), Stmt::Basket(b)) => {
                a.name == b.name
                    && a.subject_to == b.subject_to
                    && match (&a.shape, &b.shape) {
                        (
                            BasketShape::Fixed { capacity: c1, plus: p1, floor: f1 },
                            BasketShape::Fixed { capacity: c2, plus: p2, floor: f2 },
                        ) => {
                            c1.structural_eq(c2)
                                && p1.len() == p2.len()
                                && p1.iter().zip(p2.iter()).all(|(x, y)| x.structural_eq(y))
                                && opt_expr_eq(*f1, *f2)
                        }
                        (
                            BasketShape::Builder { builds_from: b1, starting: s1, maximum: m1 },
                            BasketShape::Builder { builds_from: b2, starting: s2, maximum: m2 },
                        ) => {
                            b1.structural_eq(b2)
                                && opt_expr_eq(*s1, *s2)
                                && opt_expr_eq(*m1, *m2)
                        }
                        _ => false,
                    }
            }
            (Stmt::Condition(a), Stmt::Condition(b)) => {
                a.name == b.name && a.body.structural_eq(b.body)
            }
            (Stmt::Prohibit(a), Stmt::Prohibit(b)) => {
                a.target == b.target
                    && a.exceptions.len() == b.exceptions.len()
                    && a.exceptions.iter().zip(&b.exceptions).all(|(x, y)| match (x, y) {
                        (
                            Exception::When { conditions: c1, .. },
                            Exception::When { conditions: c2, .. },
                        ) => {
                            c1.len() == c2.len()
                                && c1.iter().zip(c2.iter()).all(|(p, q)| p.structural_eq(q))
                        }
                        (
                            Exception::Basket { name: n1, .. },
                            Exception::Basket { name: n2, .. },
                        ) => n1 == n2,
                        _ => false,
                    })
            }
            (Stmt::Event(a), Stmt::Event(b)) => {
                a.name == b.name
                    && a.trigger.structural_eq(b.trigger)
                    && a.grace_days == b.grace_days
                    && a.consequence == b.consequence
            }
            _ => false,
        }
    }
}

fn opt_expr_eq(a: Option<&Expr<'_>>, b: Option<&Expr<'_>>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x.structural_eq(y),
        (None, None) => true,
        _ => false,
    }
}
