//! Integration test crate for the ProViso workspace.
//!
//! No library code lives here; the `tests/` directory exercises the
//! public API across crate boundaries — the literal specification
//! scenarios, the pipeline invariants, and the document round trips.
