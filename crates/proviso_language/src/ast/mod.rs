//! The ProViso abstract syntax tree.
//!
//! Arena-allocated tagged sums: [`Expr`] for the recursive expression
//! grammar, [`Stmt`] for the six provision kinds, [`Program`] for an
//! ordered sequence of statements. Nodes are deep-immutable after
//! construction and every node carries its source [`Span`].
//!
//! Equality on nodes is structural and disregards locations — see
//! [`Expr::structural_eq`] and [`Program::structural_eq`], which the
//! print-and-reparse round-trip property relies on.

mod expr;
mod stmt;

pub use expr::{BinaryOp, CompareOp, Expr, Func, LogicalOp, UnaryOp};
pub use stmt::{
    BasketShape, BasketStmt, ConditionStmt, CovenantStmt, Cure, DefineStmt, EventStmt, Exception,
    Frequency, ProhibitStmt, Requirement, Stmt,
};

use proviso_base::Span;

/// A parsed ProViso program: an ordered sequence of top-level statements.
///
/// Order matters only for human reading; all definitions are visible to
/// each other during validation and evaluation.
#[derive(Debug)]
pub struct Program<'a> {
    pub statements: Vec<Stmt<'a>>,
}

impl<'a> Program<'a> {
    /// Structural equality over the whole program, ignoring spans.
    pub fn structural_eq(&self, other: &Program<'_>) -> bool {
        self.statements.len() == other.statements.len()
            && self
                .statements
                .iter()
                .zip(&other.statements)
                .all(|(a, b)| a.structural_eq(b))
    }

    /// Span of the full program (first statement start to last statement
    /// end); empty programs span nothing.
    pub fn span(&self) -> Span {
        match (self.statements.first(), self.statements.last()) {
            (Some(first), Some(last)) => first.span().merge(last.span()),
            _ => Span::default(),
        }
    }
}
