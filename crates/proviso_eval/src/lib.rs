//! # proviso-eval
//!
//! Runtime execution of parsed ProViso programs by walking the AST against
//! a [`FinancialSnapshot`].
//!
//! # Architecture
//!
//! ```text
//! ProViso AST + FinancialSnapshot (+ optional Overlay)
//!     │
//!     ▼
//! ┌───────────┐
//! │ Evaluator │ ──▶ CovenantResult per covenant
//! │           │ ──▶ BasketState per basket
//! │           │ ──▶ ConditionResult per condition
//! │           │ ──▶ EventStatus per event
//! └───────────┘ ──▶ ActionDecision on demand
//! ```
//!
//! # Failure model
//!
//! Evaluation is per-entity: an unresolved data field in one covenant
//! never aborts the others. Each result distinguishes compliant, breach,
//! unknown-data, and computation-error outcomes. The snapshot is never
//! mutated; evaluating the same program against the same snapshot twice
//! yields identical results.

pub mod value;
pub mod snapshot;
pub mod result;
pub mod eval;

pub use value::{EvalError, Value};
pub use snapshot::{FinancialSnapshot, Overlay, ProposedAction};
pub use result::{
    ActionDecision, BasketState, ComplianceStatus, ConditionResult, CovenantResult,
    CureAvailability, EvaluationResult, EventStatus,
};
pub use eval::{decide_action, evaluate, Evaluator};
