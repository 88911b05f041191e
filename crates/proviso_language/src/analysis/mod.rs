//! Semantic validation: symbol discovery and reference checking.
//!
//! Validation never blocks on unknown names alone — an identifier that
//! resolves to no declared symbol is *presumed to be a financial data
//! field* and reported as a warning, because the evaluator will bind it
//! against the snapshot. Errors are reserved for structural problems:
//! duplicate declarations, kind mismatches in function arguments, wrong
//! arities, and `amount` used outside a prohibition carve-out.

mod symbols;
mod validate;

pub use symbols::{SymbolKind, SymbolTable};
pub use validate::validate_program;

use proviso_base::Span;
use serde::Serialize;

/// Diagnostic severity. Errors gate evaluation; warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One validation finding.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// The name being referenced, when the finding is about a reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Name and kind of the enclosing statement, e.g. `covenant MaxLeverage`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// What kind of symbol the reference position wanted, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_kind: Option<SymbolKind>,
    #[serde(skip)]
    pub span: Span,
}

/// The validator's output: every error and warning found, in program
/// order.
#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationReport {
    /// `true` when evaluation may proceed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }
}
