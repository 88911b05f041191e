//! # ProViso
//!
//! A domain-specific language that represents commercial credit
//! agreements as executable programs. ProViso source reads like the
//! agreement's operative provisions yet evaluates deterministically
//! against a snapshot of financial data, answering: *is the borrower
//! compliant? how much remains in this basket? would this proposed
//! transaction trip a covenant?*
//!
//! ## The pipeline
//!
//! ```text
//! source ──▶ parse ──▶ validate ──▶ evaluate ──▶ per-entity results
//!                         ▲
//! form values ──▶ code ───┘
//!            └──▶ prose ──▶ drift / round-trip analysis
//! ```
//!
//! ## Example
//!
//! ```
//! use proviso::{parse, validate, evaluate, AstArena, Interner};
//! use proviso::{ComplianceStatus, FinancialSnapshot};
//!
//! let arena = AstArena::new();
//! let mut interner = Interner::new();
//!
//! let program = parse(
//!     "DEFINE Leverage AS TotalDebt / EBITDA\n\
//!      COVENANT MaxLeverage REQUIRES Leverage <= 4.50 TESTED QUARTERLY",
//!     &arena,
//!     &mut interner,
//! )
//! .unwrap();
//!
//! assert!(validate(&program, &interner).is_clean());
//!
//! let snapshot = FinancialSnapshot::new()
//!     .with_field("TotalDebt", 400.0)
//!     .with_field("EBITDA", 100.0);
//! let result = evaluate(&program, &interner, &snapshot, None);
//! assert_eq!(
//!     result.covenant("MaxLeverage").unwrap().status,
//!     ComplianceStatus::Compliant
//! );
//! ```
//!
//! The language, evaluation, and document layers live in their own
//! crates; this crate re-exports the public surface.

// Location and naming atoms
pub use proviso_base::{Interner, LineMap, Location, Position, Span, Symbol};

// Language pipeline
pub use proviso_language::{
    ast, check, parse, render_program, validate, AstArena, AstContext, Diagnostic, ParseError,
    ParseErrorKind, Program, Severity as DiagnosticSeverity, SymbolKind, SymbolTable,
    ValidationReport,
};

// Evaluation
pub use proviso_eval::{
    decide_action, evaluate, ActionDecision, BasketState, ComplianceStatus, ConditionResult,
    CovenantResult, CureAvailability, EvalError, EvaluationResult, EventStatus,
    FinancialSnapshot, Overlay, ProposedAction, Value,
};

// Templates, forms, prose, drift, round-trip
pub use proviso_template::{
    detect_drift, form_library, generate_form_output, generate_from_template, render_prose,
    render_template, validate_round_trip, ChangeCategory, DealRecord, Drift, DriftKind,
    DriftReport, ElementKind, FormDefinition, FormError, FormField, FormOutput,
    RoundTripDifference, RoundTripResult, Severity as DriftSeverity, Template, TemplateContext,
    TemplateOutput,
};
