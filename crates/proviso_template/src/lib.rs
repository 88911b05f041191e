//! # proviso-template
//!
//! The document side of ProViso: structured form data in, code and legal
//! prose out, and the reconciliation paths between them.
//!
//! ## Components
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`engine`] | Mustache-flavored template engine, parsed once then applied |
//! | [`forms`] | Form definitions, validation, enrichment, built-in library |
//! | [`display`] | Shared display tables: operator words, metric names, formats |
//! | [`prose`] | Canonical legal prose rendered from a parsed program |
//! | [`drift`] | Out-of-band prose edits detected, classified, and repaired |
//! | [`roundtrip`] | Prose↔code reproduction checked against the stylistic whitelist |
//!
//! Everything here is a pure function of its inputs; dates come in through
//! the [`engine::TemplateContext`], never from a clock.

pub mod engine;
pub mod display;
pub mod forms;
pub mod prose;
pub mod drift;
pub mod roundtrip;

pub use engine::{render_template, DealRecord, Template, TemplateContext};
pub use forms::{
    form_library, generate_form_output, generate_from_template, FormDefinition, FormError,
    FormField, FormOutput, TemplateOutput,
};
pub use prose::render_prose;
pub use drift::{detect_drift, ChangeCategory, Drift, DriftKind, DriftReport, ElementKind, Severity};
pub use roundtrip::{validate_round_trip, RoundTripDifference, RoundTripResult};
