//! Drift detection: reconciling prose edits against the code.
//!
//! When counsel edits the Word document instead of the form, the prose
//! and the executable code diverge. Drift detection renders the expected
//! prose from the current code, splits both texts into numbered sections,
//! and classifies every divergence. The strongest signal is the number
//! sets: a threshold that reads `4.50 to 1.00` in the code-rendered prose
//! and `5.00 to 1.00` in the observed prose is a high-severity threshold
//! drift, and the analyzer can propose the code that would match the
//! observed text.
//!
//! Phrase heuristics here are deliberately coarse; they pick an element
//! family, not a clause.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use proviso_base::Interner;
use proviso_language::ast::{BasketShape, Stmt};
use proviso_language::format::render_expr;
use proviso_language::{compile, AstArena};

use crate::display::group_thousands;
use crate::prose::render_prose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftKind {
    Added,
    Deleted,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Covenant,
    Basket,
    Definition,
    Milestone,
    Reserve,
    Waterfall,
    Phase,
    ConditionPrecedent,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeCategory {
    Threshold,
    Capacity,
    Definition,
    Timing,
    Structure,
    Cure,
    Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// One detected divergence.
#[derive(Debug, Clone, Serialize)]
pub struct Drift {
    /// Section key, e.g. `6.1`, or `document` when no sections were found.
    pub section: String,
    pub kind: DriftKind,
    pub element: ElementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ChangeCategory>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_excerpt: Option<String>,
    pub numbers_expected: Vec<f64>,
    pub numbers_actual: Vec<f64>,
    /// Code regenerating the observed prose, when the classification and
    /// extracted numbers give enough confidence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DriftReport {
    pub drifts: Vec<Drift>,
    pub sections_compared: usize,
    /// Set when the current code failed to parse; no comparison ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_error: Option<String>,
}

impl DriftReport {
    pub fn has_high_severity(&self) -> bool {
        self.drifts.iter().any(|d| d.severity == Severity::High)
    }
}

/// Detects drift between an externally edited prose document and the
/// current code.
pub fn detect_drift(actual_prose: &str, current_code: &str) -> DriftReport {
    let arena = AstArena::new();
    let mut interner = Interner::new();

    let program = match compile::parse(current_code, &arena, &mut interner) {
        Ok(program) => program,
        Err(e) => {
            return DriftReport {
                code_error: Some(e.message()),
                ..DriftReport::default()
            }
        }
    };

    let expected_doc = render_prose(&program, &interner);
    let expected_sections = split_sections(&expected_doc.text);
    let actual_sections = split_sections(actual_prose);
    log::debug!(
        "drift: comparing {} expected vs {} actual sections",
        expected_sections.len(),
        actual_sections.len()
    );

    let mut drifts = Vec::new();
    let mut compared = 0usize;

    for (key, expected_body) in &expected_sections {
        match actual_sections.iter().find(|(k, _)| k == key) {
            Some((_, actual_body)) => {
                compared += 1;
                if normalize(expected_body) != normalize(actual_body) {
                    let mut drift = classify(
                        key,
                        DriftKind::Modified,
                        Some(expected_body),
                        Some(actual_body),
                    );
                    drift.suggested_code = suggest_code(
                        &program,
                        &interner,
                        &expected_doc.sections,
                        key,
                        &drift,
                    );
                    drifts.push(drift);
                }
            }
            None => {
                drifts.push(classify(key, DriftKind::Deleted, Some(expected_body), None));
            }
        }
    }

    for (key, actual_body) in &actual_sections {
        if !expected_sections.iter().any(|(k, _)| k == key) {
            drifts.push(classify(key, DriftKind::Added, None, Some(actual_body)));
        }
    }

    DriftReport {
        drifts,
        sections_compared: compared,
        code_error: None,
    }
}

fn classify(
    key: &str,
    kind: DriftKind,
    expected: Option<&str>,
    actual: Option<&str>,
) -> Drift {
    let basis = actual.or(expected).unwrap_or("");
    let element = classify_element(basis);
    let numbers_expected = expected.map(extract_numbers).unwrap_or_default();
    let numbers_actual = actual.map(extract_numbers).unwrap_or_default();
    let category = match kind {
        DriftKind::Deleted => None,
        _ => Some(classify_change(
            element,
            basis,
            &numbers_expected,
            &numbers_actual,
        )),
    };
    let severity = match category {
        Some(ChangeCategory::Threshold) | Some(ChangeCategory::Capacity) => Severity::High,
        Some(ChangeCategory::Cure)
        | Some(ChangeCategory::Condition)
        | Some(ChangeCategory::Timing)
        | Some(ChangeCategory::Structure) => Severity::Medium,
        _ => Severity::Low,
    };

    Drift {
        section: key.to_string(),
        kind,
        element,
        category,
        severity,
        expected_excerpt: expected.map(excerpt),
        actual_excerpt: actual.map(excerpt),
        numbers_expected: numbers_expected.iter().map(|n| n.value).collect(),
        numbers_actual: numbers_actual.iter().map(|n| n.value).collect(),
        suggested_code: None,
    }
}

/// Element family by phrase heuristics, most specific first.
fn classify_element(text: &str) -> ElementKind {
    let lower = text.to_lowercase();
    if lower.contains("waterfall") || lower.contains("priority of payments") {
        ElementKind::Waterfall
    } else if lower.contains("milestone") {
        ElementKind::Milestone
    } else if lower.contains("reserve") {
        ElementKind::Reserve
    } else if lower.contains("conditions precedent") || lower.contains("condition precedent") {
        ElementKind::ConditionPrecedent
    } else if lower.contains("phase") {
        ElementKind::Phase
    } else if lower.contains("\" means") || lower.contains("” means") {
        ElementKind::Definition
    } else if lower.contains("basket") || lower.contains("aggregate amount") {
        ElementKind::Basket
    } else if lower.contains("shall not permit")
        || lower.contains("shall maintain")
        || lower.contains("covenant")
        || lower.contains("to 1.00")
        || lower.contains("ratio")
    {
        ElementKind::Covenant
    } else {
        ElementKind::Other
    }
}

/// Change category. The number-set comparison is the primary signal;
/// phrases break the ties.
fn classify_change(
    element: ElementKind,
    text: &str,
    expected: &[NumberToken],
    actual: &[NumberToken],
) -> ChangeCategory {
    let lower = text.to_lowercase();
    let numbers_differ = !same_number_set(expected, actual);

    if numbers_differ {
        if lower.contains("cure") {
            return ChangeCategory::Cure;
        }
        if lower.contains("grace period") || lower.contains(" days") {
            return ChangeCategory::Timing;
        }
        return match element {
            ElementKind::Basket => ChangeCategory::Capacity,
            ElementKind::Definition => ChangeCategory::Definition,
            _ => ChangeCategory::Threshold,
        };
    }

    if lower.contains("cure") {
        ChangeCategory::Cure
    } else if lower.contains("so long as")
        || lower.contains("subject to")
        || lower.contains("provided that")
    {
        ChangeCategory::Condition
    } else if lower.contains("fiscal quarter")
        || lower.contains("calendar month")
        || lower.contains("fiscal year")
        || lower.contains(" days")
    {
        ChangeCategory::Timing
    } else if matches!(element, ElementKind::Definition) {
        ChangeCategory::Definition
    } else {
        ChangeCategory::Structure
    }
}

/// Regenerates the affected statement with the observed number when the
/// drift is a confident threshold or capacity change.
fn suggest_code(
    program: &proviso_language::Program<'_>,
    interner: &Interner,
    sections: &[crate::prose::SectionEntry],
    key: &str,
    drift: &Drift,
) -> Option<String> {
    if !matches!(
        drift.category,
        Some(ChangeCategory::Threshold) | Some(ChangeCategory::Capacity)
    ) {
        return None;
    }

    // The observed number that is not in the expected set.
    let new_value = drift
        .numbers_actual
        .iter()
        .find(|a| !drift.numbers_expected.iter().any(|e| close(**a, *e)))?;

    let entry = sections.iter().find(|s| s.key == key)?;
    match &program.statements[entry.statement_index] {
        Stmt::Covenant(cov) => {
            let req = cov.requires.as_ref()?;
            Some(format!(
                "COVENANT {} REQUIRES {} {} {}",
                interner.resolve(cov.name),
                render_expr(req.lhs, interner),
                req.op.symbol(),
                format_threshold(*new_value)
            ))
        }
        Stmt::Basket(basket) => {
            let shape = match &basket.shape {
                BasketShape::Fixed { .. } => "CAPACITY",
                BasketShape::Builder { .. } => "MAXIMUM",
            };
            Some(format!(
                "BASKET {} {} ${}",
                interner.resolve(basket.name),
                shape,
                group_thousands(*new_value)
            ))
        }
        _ => None,
    }
}

/// Thresholds spell like prose ratios: two decimals.
fn format_threshold(value: f64) -> String {
    format!("{:.2}", value)
}

// ── Section splitting ───────────────────────────────────────────────────

fn section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Section\s+(\d+(?:\.\d+)*)\s*(?:\(([a-z])\))?\.?\s*")
            .expect("section pattern compiles")
    })
}

/// Splits prose into `(key, body)` sections on the canonical pattern; a
/// text with no section headers is one `document` section.
pub fn split_sections(text: &str) -> Vec<(String, String)> {
    let re = section_re();
    let matches: Vec<_> = re.captures_iter(text).collect();
    if matches.is_empty() {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![("document".to_string(), trimmed.to_string())];
    }

    let mut sections = Vec::new();
    for (i, caps) in matches.iter().enumerate() {
        let whole = caps.get(0).expect("match 0 exists");
        let number = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let key = match caps.get(2) {
            Some(letter) => format!("{}({})", number, letter.as_str()),
            None => number.to_string(),
        };
        let body_start = whole.end();
        let body_end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        sections.push((key, text[body_start..body_end].trim().to_string()));
    }
    sections
}

// ── Normalization & numbers ─────────────────────────────────────────────

/// Normalized text for equality: lowercase, whitespace collapsed, common
/// punctuation variants unified.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for c in text.chars() {
        let mapped = match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{00A0}' => ' ',
            other => other,
        };
        if mapped.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(mapped.to_ascii_lowercase());
            last_space = false;
        }
    }
    out.trim().to_string()
}

#[derive(Debug, Clone)]
pub struct NumberToken {
    pub value: f64,
    pub raw: String,
}

fn ratio_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+(?:\.\d+)?)\s+to\s+1(?:\.0{1,2})?\b").expect("ratio pattern compiles")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$?(\d[\d,]*(?:\.\d+)?)%?").expect("number pattern compiles")
    })
}

/// Extracts the distinct numbers in a section body. Section headers are
/// stripped first so `Section 6.1` contributes nothing; ratio phrases
/// collapse to their left figure so `4.50 to 1.00` yields only `4.50`.
pub fn extract_numbers(text: &str) -> Vec<NumberToken> {
    let no_headers = section_re().replace_all(text, " ");
    let collapsed = ratio_re().replace_all(&no_headers, "$1");

    let mut tokens: Vec<NumberToken> = Vec::new();
    for caps in number_re().captures_iter(&collapsed) {
        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if raw.is_empty() {
            continue;
        }
        if let Ok(value) = raw.replace(',', "").parse::<f64>() {
            if !tokens.iter().any(|t| close(t.value, value)) {
                tokens.push(NumberToken {
                    value,
                    raw: raw.to_string(),
                });
            }
        }
    }
    tokens
}

fn same_number_set(a: &[NumberToken], b: &[NumberToken]) -> bool {
    a.len() == b.len()
        && a.iter().all(|x| b.iter().any(|y| close(x.value, y.value)))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn excerpt(text: &str) -> String {
    const LIMIT: usize = 160;
    let trimmed = text.trim();
    if trimmed.len() <= LIMIT {
        trimmed.to_string()
    } else {
        let mut end = LIMIT;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}
