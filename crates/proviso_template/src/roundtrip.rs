//! Round-trip validation: does the code still reproduce the prose?
//!
//! Given the original prose and the generated code, render prose from the
//! code and compare section by section. Differences that reduce to known
//! stylistic variations, pure punctuation, or whitespace are *acceptable*;
//! anything else is *material* and carries a reason, typically the number
//! diff.
//!
//! The acceptable-variation list is one table below, nowhere else.

use serde::Serialize;

use proviso_base::Interner;
use proviso_language::{compile, AstArena};

use crate::drift::{extract_numbers, normalize, split_sections};
use crate::prose::render_prose;

/// Stylistic variations treated as equivalent, canonical spelling first.
/// Matching is whole-word over normalized (lowercased, space-collapsed)
/// text.
const ACCEPTABLE_VARIATIONS: &[(&str, &str)] = &[
    ("in accordance with", "pursuant to"),
    ("shall", "will"),
    ("shall not", "will not"),
    ("set forth in", "specified in"),
    ("prior to", "before"),
    ("in the event that", "if"),
    ("so long as", "provided that"),
    ("utilize", "use"),
    ("no more than", "not more than"),
    ("commencing on", "beginning on"),
    ("terminate", "end"),
    ("obligations", "liabilities"),
];

#[derive(Debug, Clone, Serialize)]
pub struct RoundTripDifference {
    pub section: String,
    /// `true` when the difference reduces to whitelisted variation,
    /// punctuation, or whitespace.
    pub acceptable: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundTripResult {
    /// `true` when no material differences remain.
    pub matches: bool,
    pub differences: Vec<RoundTripDifference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_error: Option<String>,
}

/// Validates that the generated code reproduces the original prose within
/// the acceptable-variation relation.
pub fn validate_round_trip(original_prose: &str, generated_code: &str) -> RoundTripResult {
    let arena = AstArena::new();
    let mut interner = Interner::new();

    let program = match compile::parse(generated_code, &arena, &mut interner) {
        Ok(program) => program,
        Err(e) => {
            return RoundTripResult {
                matches: false,
                differences: Vec::new(),
                code_error: Some(e.message()),
            }
        }
    };

    let rendered = render_prose(&program, &interner);
    let expected_sections = split_sections(&rendered.text);
    let actual_sections = split_sections(original_prose);

    let mut differences = Vec::new();

    for (key, expected_body) in &expected_sections {
        match actual_sections.iter().find(|(k, _)| k == key) {
            Some((_, actual_body)) => {
                if normalize(expected_body) == normalize(actual_body) {
                    continue;
                }
                if canonicalize(expected_body) == canonicalize(actual_body) {
                    differences.push(RoundTripDifference {
                        section: key.clone(),
                        acceptable: true,
                        reason: "stylistic variation".to_string(),
                    });
                } else {
                    differences.push(RoundTripDifference {
                        section: key.clone(),
                        acceptable: false,
                        reason: material_reason(expected_body, actual_body),
                    });
                }
            }
            None => differences.push(RoundTripDifference {
                section: key.clone(),
                acceptable: false,
                reason: "section missing from the prose".to_string(),
            }),
        }
    }

    for (key, _) in &actual_sections {
        if !expected_sections.iter().any(|(k, _)| k == key) {
            differences.push(RoundTripDifference {
                section: key.clone(),
                acceptable: false,
                reason: "section has no counterpart in the code".to_string(),
            });
        }
    }

    RoundTripResult {
        matches: differences.iter().all(|d| d.acceptable),
        differences,
        code_error: None,
    }
}

/// Normalization plus the whitelist plus punctuation removal: the
/// coarsest equivalence the round trip accepts.
fn canonicalize(text: &str) -> String {
    let mut canonical = format!(" {} ", normalize(text));
    // Longer variants first, so "will not" canonicalizes before "will".
    let mut variations: Vec<&(&str, &str)> = ACCEPTABLE_VARIATIONS.iter().collect();
    variations.sort_by_key(|(_, variant)| std::cmp::Reverse(variant.len()));
    for (canonical_form, variant) in variations {
        canonical = canonical.replace(
            &format!(" {} ", variant),
            &format!(" {} ", canonical_form),
        );
    }

    let stripped: String = canonical
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | ';' | ':' | '\'' | '"' | '(' | ')' | '-'))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Material differences explain themselves by the number diff when there
/// is one.
fn material_reason(expected: &str, actual: &str) -> String {
    let expected_numbers = extract_numbers(expected);
    let actual_numbers = extract_numbers(actual);

    let missing: Vec<String> = expected_numbers
        .iter()
        .filter(|e| !actual_numbers.iter().any(|a| (a.value - e.value).abs() < 1e-9))
        .map(|t| t.raw.clone())
        .collect();
    let added: Vec<String> = actual_numbers
        .iter()
        .filter(|a| !expected_numbers.iter().any(|e| (e.value - a.value).abs() < 1e-9))
        .map(|t| t.raw.clone())
        .collect();

    if missing.is_empty() && added.is_empty() {
        "wording differs beyond the acceptable variations".to_string()
    } else {
        format!(
            "numbers {} missing / {} added",
            if missing.is_empty() {
                "none".to_string()
            } else {
                missing.join(", ")
            },
            if added.is_empty() {
                "none".to_string()
            } else {
                added.join(", ")
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "BASKET GeneralInvestments CAPACITY $25,000,000";

    fn rendered(code: &str) -> String {
        let arena = AstArena::new();
        let mut interner = Interner::new();
        let program = compile::parse(code, &arena, &mut interner).unwrap();
        render_prose(&program, &interner).text
    }

    #[test]
    fn identical_prose_matches() {
        let result = validate_round_trip(&rendered(CODE), CODE);
        assert!(result.matches);
        assert!(result.differences.is_empty());
    }

    #[test]
    fn whitespace_and_punctuation_differences_match() {
        let prose = rendered(CODE).replace(". ", ".  ").replace(',', "");
        let result = validate_round_trip(&prose, CODE);
        assert!(result.matches, "{:?}", result.differences);
    }

    #[test]
    fn shall_will_variation_is_acceptable() {
        let prose = rendered(CODE).replace("may utilize", "may use");
        let result = validate_round_trip(&prose, CODE);
        assert!(result.matches, "{:?}", result.differences);
        assert!(result.differences.iter().all(|d| d.acceptable));
    }

    #[test]
    fn changed_number_is_material_with_reason() {
        let prose = rendered(CODE).replace("$25,000,000", "$30,000,000");
        let result = validate_round_trip(&prose, CODE);
        assert!(!result.matches);
        let diff = &result.differences[0];
        assert!(!diff.acceptable);
        assert!(
            diff.reason.contains("25,000,000 missing") && diff.reason.contains("30,000,000 added"),
            "reason was {}",
            diff.reason
        );
    }

    #[test]
    fn reworded_sentence_is_material() {
        let prose = rendered(CODE).replace(
            "in an aggregate amount not to exceed",
            "whenever management sees fit up to",
        );
        let result = validate_round_trip(&prose, CODE);
        assert!(!result.matches);
        assert!(result.differences[0]
            .reason
            .contains("wording differs"));
    }

    #[test]
    fn missing_section_is_material() {
        let two = "BASKET A CAPACITY $1,000,000\nBASKET B CAPACITY $2,000,000";
        let first_only = rendered(two).split("\n\n").next().unwrap().to_string();
        let result = validate_round_trip(&first_only, two);
        assert!(!result.matches);
        assert!(result
            .differences
            .iter()
            .any(|d| d.reason.contains("missing from the prose")));
    }

    #[test]
    fn unparsable_code_reports_the_error() {
        let result = validate_round_trip("Section 1.1. Text.", "BASKET ???");
        assert!(!result.matches);
        assert!(result.code_error.is_some());
    }
}
