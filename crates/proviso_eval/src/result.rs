//! Per-entity evaluation results.
//!
//! Every entity gets its own result record; a failure in one never
//! suppresses the others. All records serialize for the dashboard.

use serde::Serialize;

use crate::value::Value;

/// Outcome of testing one covenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceStatus {
    Compliant,
    Breach,
    /// A required data field was not supplied; the test is unanswerable.
    UnknownData,
    /// The computation itself failed (cycle, mismatched currencies, ...).
    ComputationError,
}

/// Cure-right annotation on a breached (or breachable) covenant.
#[derive(Debug, Clone, Serialize)]
pub struct CureAvailability {
    pub kind: String,
    pub max_uses: u32,
    /// Remaining uses given the caller's ledger; equals `max_uses` when
    /// the ledger has no entry.
    pub uses_remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<Value>,
    /// Whether a cure could be exercised now.
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CovenantResult {
    pub name: String,
    pub status: ComplianceStatus,
    /// Computed left-hand side, rounded to four decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// Distance to breach in the operator's direction; negative when
    /// already breached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headroom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cure: Option<CureAvailability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BasketState {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Value>,
    pub used: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    /// Conditions from `SUBJECT TO` that currently fail; a non-empty list
    /// zeroes availability.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConditionResult {
    pub name: String,
    /// `None` when the condition could not be decided.
    pub value: Option<bool>,
    /// Short proof trace: the sub-expressions that determined the result.
    pub trace: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventStatus {
    pub name: String,
    /// Whether the trigger predicate fires now; `None` when undecidable.
    pub triggered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_days: Option<f64>,
    /// Whether the grace period has run out (equals `triggered` for
    /// events without one).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_elapsed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consequence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The prohibition decision for one proposed action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionDecision {
    pub action: String,
    pub amount: Value,
    pub permitted: bool,
    /// Rendered text of the exception that permitted the action, when one
    /// did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_path: Option<String>,
    /// `true` when a `PROHIBIT` statement covers this action at all.
    pub prohibited_by_agreement: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One full program execution against one snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationResult {
    pub covenants: Vec<CovenantResult>,
    pub baskets: Vec<BasketState>,
    pub conditions: Vec<ConditionResult>,
    pub events: Vec<EventStatus>,
    /// Present when the overlay proposed an action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionDecision>,
}

impl EvaluationResult {
    pub fn covenant(&self, name: &str) -> Option<&CovenantResult> {
        self.covenants.iter().find(|c| c.name == name)
    }

    pub fn basket(&self, name: &str) -> Option<&BasketState> {
        self.baskets.iter().find(|b| b.name == name)
    }

    pub fn condition(&self, name: &str) -> Option<&ConditionResult> {
        self.conditions.iter().find(|c| c.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&EventStatus> {
        self.events.iter().find(|e| e.name == name)
    }
}
