//! Financial data inputs: the snapshot and the pro forma overlay.
//!
//! A [`FinancialSnapshot`] is the opaque field→value mapping a program
//! evaluates against, plus the optional views the period-qualified
//! functions need: a trailing-twelve-months map for `TRAILING`, a period
//! series for `SUM`, an active-state set for `EXISTS`, and per-basket
//! utilization. The evaluator never mutates a snapshot.
//!
//! An [`Overlay`] carries caller-side state the snapshot cannot know:
//! hypothetical-transaction deltas for `PROFORMA`, the proposed action a
//! prohibition should adjudicate, the cure-use ledger, and days elapsed
//! since event triggers.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// A point-in-time snapshot of financial data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// Current-period values by field name.
    #[serde(default)]
    pub fields: FxHashMap<String, f64>,
    /// The trailing-twelve-months view; absent means `TRAILING` cannot
    /// resolve.
    #[serde(default)]
    pub trailing: Option<FxHashMap<String, f64>>,
    /// Per-period series for `SUM`, oldest first.
    #[serde(default)]
    pub periods: Vec<FxHashMap<String, f64>>,
    /// Runtime states currently live (e.g. `EventOfDefault`).
    #[serde(default)]
    pub active_states: FxHashSet<String>,
    /// Basket utilization by basket name; unnamed baskets default to zero.
    #[serde(default)]
    pub basket_usage: FxHashMap<String, f64>,
}

impl FinancialSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion, mostly for tests and examples.
    pub fn with_field(mut self, name: &str, value: f64) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn with_usage(mut self, basket: &str, used: f64) -> Self {
        self.basket_usage.insert(basket.to_string(), used);
        self
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.active_states.insert(state.to_string());
        self
    }

    pub fn with_trailing(mut self, fields: &[(&str, f64)]) -> Self {
        let map = fields
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        self.trailing = Some(map);
        self
    }

    pub fn with_period(mut self, fields: &[(&str, f64)]) -> Self {
        self.periods
            .push(fields.iter().map(|(k, v)| (k.to_string(), *v)).collect());
        self
    }
}

/// A proposed transaction for prohibition analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedAction {
    /// The prohibited-action name, e.g. `Dividends`.
    pub action: String,
    /// The action's magnitude, bound to `amount` in carve-outs.
    pub amount: f64,
    /// ISO code when the magnitude is a currency amount.
    #[serde(default)]
    pub currency: Option<String>,
}

/// Caller-supplied evaluation context beyond the snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overlay {
    /// Pro forma deltas applied to field resolution inside `PROFORMA`.
    #[serde(default)]
    pub adjustments: FxHashMap<String, f64>,
    /// Action to adjudicate during [`crate::evaluate`].
    #[serde(default)]
    pub proposed_action: Option<ProposedAction>,
    /// Cure uses already consumed, by covenant name. Cure rights over the
    /// life of the facility live with the caller, not the snapshot.
    #[serde(default)]
    pub cure_ledger: FxHashMap<String, u32>,
    /// Days elapsed since each event's trigger was first observed; feeds
    /// grace-period elapsed checks.
    #[serde(default)]
    pub elapsed_days: FxHashMap<String, f64>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adjustment(mut self, field: &str, delta: f64) -> Self {
        self.adjustments.insert(field.to_string(), delta);
        self
    }

    pub fn with_action(mut self, action: &str, amount: f64) -> Self {
        self.proposed_action = Some(ProposedAction {
            action: action.to_string(),
            amount,
            currency: None,
        });
        self
    }

    pub fn with_cure_uses(mut self, covenant: &str, uses: u32) -> Self {
        self.cure_ledger.insert(covenant.to_string(), uses);
        self
    }

    pub fn with_elapsed_days(mut self, event: &str, days: f64) -> Self {
        self.elapsed_days.insert(event.to_string(), days);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_deserializes_from_plain_json() {
        let snapshot: FinancialSnapshot = serde_json::from_str(
            r#"{
                "fields": {"TotalDebt": 400.0, "EBITDA": 100.0},
                "active_states": ["UnmaturedDefault"],
                "basket_usage": {"Inv": 10000000.0}
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.fields["TotalDebt"], 400.0);
        assert!(snapshot.active_states.contains("UnmaturedDefault"));
        assert!(snapshot.trailing.is_none());
        assert!(snapshot.periods.is_empty());
    }

    #[test]
    fn overlay_defaults_are_empty() {
        let overlay: Overlay = serde_json::from_str("{}").unwrap();
        assert!(overlay.adjustments.is_empty());
        assert!(overlay.proposed_action.is_none());
    }
}
