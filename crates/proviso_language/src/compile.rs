//! # Parse API
//!
//! Entry points for turning ProViso source into an AST and a validation
//! report.
//!
//! | Function | Use case |
//! |----------|----------|
//! | [`parse`] | Host keeps the AST: caller owns the arenas and interner |
//! | [`validate`] | Reference classification over a parsed program |
//! | [`check`] | One call: parse + validate, report only |
//!
//! ## Example
//!
//! ```
//! use proviso_language::check;
//!
//! let report = check("BASKET Inv CAPACITY $25,000,000").unwrap();
//! assert!(report.is_clean());
//! ```

use proviso_base::Interner;

use crate::analysis::{validate_program, ValidationReport};
use crate::arena_ctx::AstArena;
use crate::ast::Program;
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Parses source into an arena-allocated program.
///
/// Pure and in-memory; the returned program borrows the arena and the
/// names in `interner`. On failure the error carries the span, the
/// de-duplicated expected list, and the found character.
pub fn parse<'a>(
    source: &str,
    arena: &'a AstArena,
    interner: &mut Interner,
) -> Result<Program<'a>, ParseError> {
    let tokens = Lexer::new(source, interner).tokenize()?;
    let mut parser = Parser::new(tokens, interner, arena.ctx());
    parser.parse().map_err(|e| e.with_found(source))
}

/// Validates a parsed program: symbol pass plus reference pass.
pub fn validate(program: &Program<'_>, interner: &Interner) -> ValidationReport {
    validate_program(program, interner)
}

/// Parses and validates in one call, discarding the AST.
///
/// The convenience entry point for hosts that only want the diagnostics —
/// the arena and interner live and die inside the call.
pub fn check(source: &str) -> Result<ValidationReport, ParseError> {
    let arena = AstArena::new();
    let mut interner = Interner::new();
    let program = parse(source, &arena, &mut interner)?;
    Ok(validate(&program, &interner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_runs_the_whole_pipeline() {
        let report = check(
            "DEFINE Leverage AS TotalDebt / EBITDA\n\
             COVENANT MaxLeverage REQUIRES Leverage <= 4.50 TESTED QUARTERLY",
        )
        .expect("parses");
        assert!(report.is_clean());
        assert_eq!(report.warnings.len(), 2, "TotalDebt and EBITDA are data fields");
    }

    #[test]
    fn parse_error_carries_found_character() {
        let err = check("COVENANT MaxLeverage REQUIRES Leverage ?? 4.50").unwrap_err();
        assert_eq!(err.found, Some('?'));
    }
}
