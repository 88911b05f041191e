//! # proviso-language
//!
//! The ProViso language pipeline: credit-agreement provisions as code.
//!
//! ProViso source reads like the operative provisions of a commercial
//! credit agreement — `COVENANT MaxLeverage REQUIRES Leverage <= 4.50
//! TESTED QUARTERLY` — yet parses into a deterministic AST that downstream
//! crates evaluate against financial data.
//!
//! ## Pipeline
//!
//! 1. **Lexer** ([`lexer`]) — tokenizes source into keywords, identifiers,
//!    and the financial literal forms (`$25,000,000`, `5%`, `4.50x`),
//!    preserving each literal's exact lexeme for round-tripping.
//!
//! 2. **Parser** ([`parser`]) — recursive descent over the token stream,
//!    producing an arena-allocated [`Program`]. Never panics on partial
//!    input; failures come back as one structured [`ParseError`].
//!
//! 3. **Validator** ([`analysis`]) — builds the five-kind symbol table and
//!    classifies every identifier reference; unknown names downgrade to
//!    "likely a financial data field" warnings rather than errors.
//!
//! 4. **Formatter** ([`format`]) — renders any AST back to canonical
//!    ProViso source; `parse(render(ast))` is structurally equal to `ast`.
//!
//! ## Quick Start
//!
//! ```
//! use proviso_language::check;
//!
//! let report = check(
//!     "DEFINE Leverage AS TotalDebt / EBITDA\n\
//!      COVENANT MaxLeverage REQUIRES Leverage <= 4.50 TESTED QUARTERLY",
//! )
//! .unwrap();
//! assert!(report.errors.is_empty());
//! ```

// Re-export base types for internal use and consumers
pub use proviso_base::{Interner, LineMap, Location, Position, Span, Symbol};

// Core modules
pub mod token;
pub mod lexer;
pub mod error;
pub mod suggest;

// Parser and AST
pub mod ast;
pub mod arena_ctx;
pub mod parser;

// Semantic analysis
pub mod analysis;

// Canonical source rendering
pub mod format;

// Parse API
pub mod compile;

// Re-export key types at crate root
pub use token::{Token, TokenType};
pub use lexer::Lexer;
pub use error::{ParseError, ParseErrorKind};
pub use ast::{
    BasketShape, BasketStmt, BinaryOp, CompareOp, ConditionStmt, CovenantStmt, Cure, DefineStmt,
    EventStmt, Exception, Expr, Frequency, Func, LogicalOp, Program, ProhibitStmt, Requirement,
    Stmt, UnaryOp,
};
pub use arena_ctx::{AstArena, AstContext};
pub use parser::Parser;
pub use analysis::{Diagnostic, Severity, SymbolKind, SymbolTable, ValidationReport};
pub use format::render_program;
pub use compile::{check, parse, validate};
