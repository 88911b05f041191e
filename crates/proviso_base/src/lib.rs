//! # proviso-base
//!
//! Location and naming atoms shared by every ProViso crate: byte-offset
//! spans with line/column resolution, and interned identifier names
//! pre-seeded with the language's reserved vocabulary.
//!
//! This crate has no knowledge of the ProViso grammar or of credit
//! agreements beyond that reserved vocabulary; the pipeline proper lives
//! above it.

pub mod intern;
pub mod span;

pub use intern::{Interner, Symbol};
pub use span::{LineMap, Location, Position, Span};
