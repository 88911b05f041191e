//! The literal end-to-end scenarios: one test per lettered case.

mod common;

use common::eval_source;
use proviso::{
    check, decide_action, detect_drift, parse, AstArena, ChangeCategory, ComplianceStatus,
    DriftSeverity, ElementKind, FinancialSnapshot, Interner, Value,
};

#[test]
fn scenario_a_leverage_covenant_compliant() {
    let snapshot = FinancialSnapshot::new()
        .with_field("TotalDebt", 400.0)
        .with_field("EBITDA", 100.0);
    let result = eval_source(
        "DEFINE Leverage AS TotalDebt / EBITDA  \
         COVENANT MaxLeverage REQUIRES Leverage <= 4.50 TESTED QUARTERLY",
        &snapshot,
        None,
    );
    let covenant = result.covenant("MaxLeverage").expect("result exists");
    assert_eq!(covenant.status, ComplianceStatus::Compliant);
    assert_eq!(covenant.actual, Some(Value::number(4.0)));
}

#[test]
fn scenario_b_basket_availability() {
    let snapshot = FinancialSnapshot::new().with_usage("Inv", 10_000_000.0);
    let result = eval_source("BASKET Inv CAPACITY $25,000,000", &snapshot, None);
    let basket = result.basket("Inv").expect("state exists");
    assert_eq!(basket.available, Some(Value::currency(15_000_000.0, "USD")));
}

#[test]
fn scenario_c_grower_basket_floor() {
    let snapshot = FinancialSnapshot::new().with_field("EBITDA", 50_000_000.0);
    let result = eval_source(
        "BASKET G CAPACITY 15% * EBITDA FLOOR $15,000,000",
        &snapshot,
        None,
    );
    let basket = result.basket("G").expect("state exists");
    assert_eq!(
        basket.capacity,
        Some(Value::currency(15_000_000.0, "USD")),
        "capacity = max(7,500,000; 15,000,000)"
    );
}

#[test]
fn scenario_d_prohibit_pass_and_fail() {
    let source = "BASKET RP CAPACITY $10,000,000\n\
                  PROHIBIT Dividends EXCEPT WHEN amount <= AVAILABLE(RP) AND NoDefault";
    let snapshot = FinancialSnapshot::new().with_field("NoDefault", 1.0);

    let arena = AstArena::new();
    let mut interner = Interner::new();
    let program = parse(source, &arena, &mut interner).unwrap();

    let permitted = decide_action(
        &program,
        &interner,
        &snapshot,
        "Dividends",
        Value::number(5_000_000.0),
        None,
    );
    assert!(permitted.permitted);
    assert!(permitted.exception_path.is_some());

    let prohibited = decide_action(
        &program,
        &interner,
        &snapshot,
        "Dividends",
        Value::number(20_000_000.0),
        None,
    );
    assert!(!prohibited.permitted);
    assert!(prohibited.exception_path.is_none());
}

#[test]
fn scenario_e_undefined_basket_reference() {
    let report = check("CONDITION C AS AVAILABLE(GhostBasket) > 0").expect("parses");
    assert_eq!(report.errors.len(), 1);
    let error = &report.errors[0];
    assert!(error.message.contains("undefined basket"));
    assert_eq!(error.reference.as_deref(), Some("GhostBasket"));
}

#[test]
fn scenario_f_drift_classification() {
    let code = "DEFINE Leverage AS TotalDebt / EBITDA\n\
                COVENANT MaxLeverage REQUIRES Leverage <= 4.50 TESTED QUARTERLY";

    // Render the expected prose, then apply the out-of-band edit counsel
    // made in the Word document.
    let arena = AstArena::new();
    let mut interner = Interner::new();
    let program = parse(code, &arena, &mut interner).unwrap();
    let prose = proviso::render_prose(&program, &interner)
        .text
        .replace("4.50 to 1.00", "5.00 to 1.00");

    let report = detect_drift(&prose, code);
    assert_eq!(report.drifts.len(), 1);
    let drift = &report.drifts[0];
    assert_eq!(drift.element, ElementKind::Covenant);
    assert_eq!(drift.category, Some(ChangeCategory::Threshold));
    assert_eq!(drift.severity, DriftSeverity::High);
    let suggestion = drift.suggested_code.as_deref().expect("suggests code");
    assert!(
        suggestion.contains("Leverage <= 5.00"),
        "suggestion was: {}",
        suggestion
    );
}
