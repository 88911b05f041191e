//! Shared helpers for the integration tests.
#![allow(dead_code)]

use proviso::{
    evaluate, parse, AstArena, EvaluationResult, FinancialSnapshot, Interner, Overlay,
};

/// A small but complete credit agreement used across the e2e tests.
pub const SAMPLE_AGREEMENT: &str = "\
// Defined terms
DEFINE Leverage AS TotalDebt / EBITDA
DEFINE FixedCharges AS InterestExpense + ScheduledAmortization

CONDITION NoDefault AS NOT(EXISTS(EventOfDefault))

// Financial covenants
COVENANT MaxLeverage REQUIRES Leverage <= 4.50 TESTED QUARTERLY CURE EquityCure MAXIMUM 2 LifeOfFacility CAP $50,000,000
COVENANT MinCoverage REQUIRES EBITDA / FixedCharges >= 2.00 TESTED QUARTERLY

// Baskets
BASKET GeneralInvestments CAPACITY 15% * EBITDA FLOOR $15,000,000 SUBJECT TO NoDefault
BASKET RestrictedPayments BUILDS_FROM 50% * CumulativeNetIncome STARTING $10,000,000 MAXIMUM $100,000,000

// Negative covenants
PROHIBIT Dividends EXCEPT WHEN amount <= AVAILABLE(RestrictedPayments) AND NoDefault

// Events of default
EVENT CrossDefault TRIGGERS OtherDebtDefaulted > $25,000,000 GRACE_PERIOD 30 CONSEQUENCE Acceleration
";

/// A snapshot under which the sample agreement is fully compliant.
pub fn healthy_snapshot() -> FinancialSnapshot {
    FinancialSnapshot::new()
        .with_field("TotalDebt", 400_000_000.0)
        .with_field("EBITDA", 100_000_000.0)
        .with_field("InterestExpense", 30_000_000.0)
        .with_field("ScheduledAmortization", 10_000_000.0)
        .with_field("CumulativeNetIncome", 60_000_000.0)
        .with_field("OtherDebtDefaulted", 0.0)
}

/// Parses and evaluates in one shot; panics on parse failure because the
/// tests own their sources.
pub fn eval_source(
    source: &str,
    snapshot: &FinancialSnapshot,
    overlay: Option<&Overlay>,
) -> EvaluationResult {
    let arena = AstArena::new();
    let mut interner = Interner::new();
    let program = parse(source, &arena, &mut interner).expect("test source parses");
    evaluate(&program, &interner, snapshot, overlay)
}
