//! Document-path invariants: forms, prose, drift, and round trips.

mod common;

use common::SAMPLE_AGREEMENT;
use proviso::{
    check, detect_drift, form_library, generate_form_output, parse, render_prose,
    validate_round_trip, AstArena, Interner,
};
use serde_json::json;

fn values(pairs: &[(&str, serde_json::Value)]) -> serde_json::Map<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn passing_values(id: &str) -> serde_json::Map<String, serde_json::Value> {
    match id {
        "maintenance-covenant" => values(&[
            ("covenant_name", json!("MaxLeverage")),
            ("threshold", json!(4.5)),
            ("has_cure", json!(true)),
            ("cure_cap", json!(50_000_000.0)),
        ]),
        "fixed-basket" => values(&[
            ("basket_name", json!("GeneralInvestments")),
            ("capacity", json!(25_000_000.0)),
        ]),
        "grower-basket" => values(&[
            ("basket_name", json!("GrowerBasket")),
            ("percent", json!(15.0)),
            ("floor", json!(15_000_000.0)),
        ]),
        "builder-basket" => values(&[
            ("basket_name", json!("CumulativeCredit")),
            ("percent", json!(50.0)),
            ("starting", json!(10_000_000.0)),
            ("maximum", json!(100_000_000.0)),
        ]),
        "defined-term" => values(&[
            ("term_name", json!("Leverage")),
            ("formula", json!("TotalDebt / EBITDA")),
        ]),
        "negative-covenant" => values(&[
            ("basket_name", json!("RestrictedPayments")),
            ("basket_capacity", json!(10_000_000.0)),
        ]),
        "event-of-default" => values(&[
            ("event_name", json!("CrossDefault")),
            ("trigger_field", json!("OtherDebtDefaulted")),
            ("trigger_threshold", json!(25_000_000.0)),
            ("grace_days", json!(30)),
            ("consequence", json!("Acceleration")),
        ]),
        other => panic!("no passing values for {}", other),
    }
}

/// Property: a library form's code template validates clean whenever the
/// values pass the form's own validation rules.
#[test]
fn library_form_code_always_validates() {
    for form in form_library() {
        let output = generate_form_output(&form, &passing_values(&form.id))
            .unwrap_or_else(|e| panic!("{}: {}", form.id, e));
        let report = check(&output.code)
            .unwrap_or_else(|e| panic!("{} emitted unparsable code: {}\n{}", form.id, e, output.code));
        assert!(
            report.errors.is_empty(),
            "{} emitted invalid code: {:?}\n{}",
            form.id,
            report.errors,
            output.code
        );
    }
}

/// Property: every form's word template reproduces the prose rendered
/// from its own code, within the acceptable-variation relation.
#[test]
fn library_form_prose_round_trips() {
    for form in form_library() {
        let output = generate_form_output(&form, &passing_values(&form.id))
            .unwrap_or_else(|e| panic!("{}: {}", form.id, e));
        let result = validate_round_trip(&output.prose, &output.code);
        assert!(
            result.matches,
            "{} prose does not round-trip: {:?}\ncode:\n{}\nprose:\n{}",
            form.id,
            result.differences,
            output.code,
            output.prose
        );
    }
}

/// Property: prose rendered from code always round-trips against itself.
#[test]
fn self_round_trip_of_the_sample_agreement() {
    let arena = AstArena::new();
    let mut interner = Interner::new();
    let program = parse(SAMPLE_AGREEMENT, &arena, &mut interner).unwrap();
    let prose = render_prose(&program, &interner).text;

    let result = validate_round_trip(&prose, SAMPLE_AGREEMENT);
    assert!(result.matches, "{:?}", result.differences);

    let drift = detect_drift(&prose, SAMPLE_AGREEMENT);
    assert!(drift.drifts.is_empty(), "{:?}", drift.drifts);
}

/// Property: drift detection is symmetric for text equality — normalized
/// equality means an empty drift list even when the spelling differs.
#[test]
fn normalized_equality_means_no_drift() {
    let arena = AstArena::new();
    let mut interner = Interner::new();
    let program = parse(SAMPLE_AGREEMENT, &arena, &mut interner).unwrap();
    let prose = render_prose(&program, &interner).text;

    let respaced = prose
        .replace(". ", ".  ")
        .replace('\n', " \n ")
        .replace('\u{0027}', "\u{2019}");
    let report = detect_drift(&respaced, SAMPLE_AGREEMENT);
    assert!(report.drifts.is_empty(), "{:?}", report.drifts);
}

/// A stylistic edit stays acceptable; a substantive edit turns material.
#[test]
fn stylistic_vs_material_edits() {
    let code = "BASKET GeneralInvestments CAPACITY $25,000,000";
    let arena = AstArena::new();
    let mut interner = Interner::new();
    let program = parse(code, &arena, &mut interner).unwrap();
    let prose = render_prose(&program, &interner).text;

    let stylistic = prose.replace("may utilize", "may use");
    let result = validate_round_trip(&stylistic, code);
    assert!(result.matches);

    let material = prose.replace("$25,000,000", "$35,000,000");
    let result = validate_round_trip(&material, code);
    assert!(!result.matches);
    assert!(result.differences[0].reason.contains("added"));
}

/// Multi-statement form output (carve-out basket + prohibition) keeps its
/// section pairing through the drift path.
#[test]
fn negative_covenant_form_drift_pairing() {
    let form = form_library()
        .into_iter()
        .find(|f| f.id == "negative-covenant")
        .unwrap();
    let output = generate_form_output(&form, &passing_values("negative-covenant")).unwrap();

    // Unedited prose: no drift.
    let clean = detect_drift(&output.prose, &output.code);
    assert!(clean.drifts.is_empty(), "{:?}", clean.drifts);

    // Raising the basket capacity in prose is a high-severity capacity
    // drift with a code suggestion.
    let edited = output.prose.replace("$10,000,000", "$20,000,000");
    let report = detect_drift(&edited, &output.code);
    assert_eq!(report.drifts.len(), 1);
    let drift = &report.drifts[0];
    assert_eq!(drift.severity, proviso::DriftSeverity::High);
    assert!(drift
        .suggested_code
        .as_deref()
        .unwrap()
        .contains("$20,000,000"));
}
