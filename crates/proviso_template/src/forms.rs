//! Form definitions and the built-in library.
//!
//! A form is the structured bridge between a drafting UI and the language:
//! field definitions with validation, a code template that emits ProViso
//! source, and a word template that emits the matching legal prose.
//! Enrichment computes the display strings (operator words, metric display
//! names, ratio spellings) before rendering so the templates stay simple.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use proviso_language::{compile, AstArena, Interner};

use crate::display::{frequency_phrase, metric_display, operator_display, split_camel_case};
use crate::engine::{render_template, TemplateContext};
use crate::prose::expr_prose;

/// A single form field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    /// Widget hint for the host UI: `text`, `number`, `currency`,
    /// `percent`, `select`, `checkbox`.
    pub widget: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Json>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// The field only applies when another field holds a given value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_when: Option<ShowWhen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldCheck>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowWhen {
    pub field: String,
    pub equals: Json,
}

/// Per-field validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// The value must scan as a ProViso identifier.
    #[serde(default)]
    pub identifier: bool,
    /// The value must parse as a ProViso expression.
    #[serde(default)]
    pub expression: bool,
}

/// Cross-field rule: `left op right` over two numeric fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRule {
    pub left: String,
    /// `<=`, `<`, `>=`, `>`.
    pub op: String,
    pub right: String,
    pub message: String,
}

/// A complete form definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    /// `covenant`, `basket`, `definition`, `prohibition`, `event`.
    pub element_type: String,
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<CrossRule>,
    pub code_template: String,
    pub word_template: String,
    pub section_ref: String,
}

/// The rendered output of a form.
#[derive(Debug, Clone, Serialize)]
pub struct FormOutput {
    pub code: String,
    pub prose: String,
    pub element_type: String,
    pub element_name: String,
    pub section_ref: String,
}

/// Output of [`generate_from_template`].
#[derive(Debug, Clone, Serialize)]
pub struct TemplateOutput {
    pub code: String,
    pub template_name: String,
}

/// Validation failure for submitted form values.
#[derive(Debug, Clone, PartialEq)]
pub enum FormError {
    MissingField { field: String },
    NotInOptions { field: String, value: String },
    OutOfRange { field: String, message: String },
    NotAnIdentifier { field: String },
    NotAnExpression { field: String, message: String },
    RuleViolation { message: String },
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::MissingField { field } => {
                write!(f, "required field '{}' is missing", field)
            }
            FormError::NotInOptions { field, value } => {
                write!(f, "'{}' is not an option for field '{}'", value, field)
            }
            FormError::OutOfRange { field, message } => {
                write!(f, "field '{}': {}", field, message)
            }
            FormError::NotAnIdentifier { field } => {
                write!(f, "field '{}' must be a valid identifier", field)
            }
            FormError::NotAnExpression { field, message } => {
                write!(f, "field '{}' must be a valid expression: {}", field, message)
            }
            FormError::RuleViolation { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for FormError {}

/// Validates values, enriches the context, and renders both outputs.
pub fn generate_form_output(
    form: &FormDefinition,
    values: &serde_json::Map<String, Json>,
) -> Result<FormOutput, FormError> {
    let values = apply_defaults(form, values);
    validate_values(form, &values)?;
    let context = enrich(form, values)?;

    let code = render_template(&form.code_template, &context);
    let prose = render_template(&form.word_template, &context);

    let element_name = context
        .values
        .get("element_name")
        .and_then(|v| v.as_str())
        .unwrap_or(&form.name)
        .to_string();

    Ok(FormOutput {
        code,
        prose,
        element_type: form.element_type.clone(),
        element_name,
        section_ref: form.section_ref.clone(),
    })
}

/// Renders a library form's code by template id; `None` when the id is
/// unknown or the values do not validate.
pub fn generate_from_template(
    template_id: &str,
    values: &serde_json::Map<String, Json>,
) -> Option<TemplateOutput> {
    let library = form_library();
    let form = library.iter().find(|f| f.id == template_id)?;
    let output = generate_form_output(form, values).ok()?;
    Some(TemplateOutput {
        code: output.code,
        template_name: form.name.clone(),
    })
}

fn apply_defaults(
    form: &FormDefinition,
    values: &serde_json::Map<String, Json>,
) -> serde_json::Map<String, Json> {
    let mut merged = values.clone();
    for field in &form.fields {
        if !merged.contains_key(&field.name) {
            if let Some(default) = &field.default {
                merged.insert(field.name.clone(), default.clone());
            }
        }
    }
    merged
}

/// A field is active when its `show_when` rule (if any) is satisfied.
fn field_active(field: &FormField, values: &serde_json::Map<String, Json>) -> bool {
    match &field.show_when {
        Some(rule) => values.get(&rule.field) == Some(&rule.equals),
        None => true,
    }
}

fn validate_values(
    form: &FormDefinition,
    values: &serde_json::Map<String, Json>,
) -> Result<(), FormError> {
    for field in &form.fields {
        if !field_active(field, values) {
            continue;
        }
        let value = match values.get(&field.name) {
            Some(v) if !v.is_null() && v.as_str().map(|s| !s.is_empty()).unwrap_or(true) => v,
            _ => {
                if field.required {
                    return Err(FormError::MissingField {
                        field: field.name.clone(),
                    });
                }
                continue;
            }
        };

        if !field.options.is_empty() {
            let text = value_text(value);
            if !field.options.iter().any(|o| o == &text) {
                return Err(FormError::NotInOptions {
                    field: field.name.clone(),
                    value: text,
                });
            }
        }

        if let Some(check) = &field.validation {
            if let Some(number) = value.as_f64() {
                if let Some(min) = check.min {
                    if number < min {
                        return Err(FormError::OutOfRange {
                            field: field.name.clone(),
                            message: format!("{} is below the minimum {}", number, min),
                        });
                    }
                }
                if let Some(max) = check.max {
                    if number > max {
                        return Err(FormError::OutOfRange {
                            field: field.name.clone(),
                            message: format!("{} is above the maximum {}", number, max),
                        });
                    }
                }
            }
            if check.identifier {
                let text = value_text(value);
                if !is_identifier(&text) {
                    return Err(FormError::NotAnIdentifier {
                        field: field.name.clone(),
                    });
                }
            }
            if check.expression {
                let text = value_text(value);
                if let Err(e) = parse_expression(&text) {
                    return Err(FormError::NotAnExpression {
                        field: field.name.clone(),
                        message: e,
                    });
                }
            }
        }
    }

    for rule in &form.rules {
        let left = values.get(&rule.left).and_then(|v| v.as_f64());
        let right = values.get(&rule.right).and_then(|v| v.as_f64());
        if let (Some(left), Some(right)) = (left, right) {
            let holds = match rule.op.as_str() {
                "<=" => left <= right,
                "<" => left < right,
                ">=" => left >= right,
                ">" => left > right,
                _ => true,
            };
            if !holds {
                return Err(FormError::RuleViolation {
                    message: rule.message.clone(),
                });
            }
        }
    }

    Ok(())
}

fn value_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Checks that `text` parses as a lone expression by wrapping it in a
/// definition.
fn parse_expression(text: &str) -> Result<(), String> {
    check_expression_prose(text).map(|_| ())
}

/// Parses an expression and renders its prose, for `formula_prose`
/// enrichment.
fn check_expression_prose(text: &str) -> Result<String, String> {
    let arena = AstArena::new();
    let mut interner = Interner::new();
    let source = format!("DEFINE PlaceholderTerm AS {}", text);
    let program = compile::parse(&source, &arena, &mut interner).map_err(|e| e.message())?;
    match program.statements.first() {
        Some(proviso_language::Stmt::Define(def)) => Ok(expr_prose(def.body, &interner)),
        _ => Err("not an expression".to_string()),
    }
}

/// Computes display strings so the templates stay simple: `*_display`
/// for every string field, operator words, ratio/frequency spellings, and
/// the element name.
fn enrich(
    form: &FormDefinition,
    values: serde_json::Map<String, Json>,
) -> Result<TemplateContext, FormError> {
    let mut context = TemplateContext::new();
    context.values = values;

    let string_fields: Vec<(String, String)> = context
        .values
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect();
    for (name, text) in string_fields {
        context
            .values
            .insert(format!("{}_display", name), Json::String(metric_display(&text)));
    }

    if let Some(op) = context.values.get("operator").and_then(|v| v.as_str()) {
        let op = op.to_string();
        context.values.insert(
            "operator_word".to_string(),
            Json::String(operator_display(&op).to_string()),
        );
        context.values.insert(
            "op_is_max".to_string(),
            Json::Bool(op == "<=" || op == "<"),
        );
    }

    if let Some(threshold) = context.values.get("threshold").and_then(|v| v.as_f64()) {
        context.values.insert(
            "threshold_prose".to_string(),
            Json::String(crate::display::format_ratio_prose(threshold)),
        );
    }

    if let Some(freq) = context.values.get("frequency").and_then(|v| v.as_str()) {
        if let Some(parsed) = proviso_language::Frequency::from_word(freq) {
            context.values.insert(
                "frequency_display".to_string(),
                Json::String(frequency_phrase(parsed).to_string()),
            );
        }
    }

    if let Some(formula) = context.values.get("formula").and_then(|v| v.as_str()) {
        let prose = check_expression_prose(formula).map_err(|message| {
            FormError::NotAnExpression {
                field: "formula".to_string(),
                message,
            }
        })?;
        context
            .values
            .insert("formula_prose".to_string(), Json::String(prose));
    }

    // The element name is the first name field present; the restricted
    // action names a prohibition even when a carve-out basket rides along.
    for candidate in [
        "covenant_name",
        "term_name",
        "event_name",
        "action",
        "basket_name",
    ] {
        if let Some(name) = context.values.get(candidate).and_then(|v| v.as_str()) {
            let name = name.to_string();
            context
                .values
                .insert("element_name".to_string(), Json::String(name.clone()));
            context.values.insert(
                "element_heading".to_string(),
                Json::String(split_camel_case(&name)),
            );
            break;
        }
    }

    context.values.insert(
        "section_ref".to_string(),
        Json::String(form.section_ref.clone()),
    );

    Ok(context)
}

// ── Built-in library ────────────────────────────────────────────────────

fn text_field(name: &str, label: &str, required: bool) -> FormField {
    FormField {
        name: name.to_string(),
        label: label.to_string(),
        widget: "text".to_string(),
        required,
        default: None,
        options: Vec::new(),
        show_when: None,
        validation: Some(FieldCheck {
            identifier: true,
            ..FieldCheck::default()
        }),
    }
}

fn number_field(name: &str, label: &str, widget: &str, min: Option<f64>) -> FormField {
    FormField {
        name: name.to_string(),
        label: label.to_string(),
        widget: widget.to_string(),
        required: true,
        default: None,
        options: Vec::new(),
        show_when: None,
        validation: Some(FieldCheck {
            min,
            ..FieldCheck::default()
        }),
    }
}

fn select_field(name: &str, label: &str, options: &[&str], default: Option<&str>) -> FormField {
    FormField {
        name: name.to_string(),
        label: label.to_string(),
        widget: "select".to_string(),
        required: true,
        default: default.map(|d| Json::String(d.to_string())),
        options: options.iter().map(|o| o.to_string()).collect(),
        show_when: None,
        validation: None,
    }
}

/// The built-in forms covering the standard credit-agreement elements.
pub fn form_library() -> Vec<FormDefinition> {
    vec![
        maintenance_covenant_form(),
        fixed_basket_form(),
        grower_basket_form(),
        builder_basket_form(),
        defined_term_form(),
        negative_covenant_form(),
        event_of_default_form(),
    ]
}

fn maintenance_covenant_form() -> FormDefinition {
    FormDefinition {
        id: "maintenance-covenant".to_string(),
        name: "Maintenance Covenant".to_string(),
        category: "financial-covenants".to_string(),
        element_type: "covenant".to_string(),
        fields: vec![
            text_field("covenant_name", "Covenant name", true),
            select_field(
                "metric",
                "Tested metric",
                &[
                    "Leverage",
                    "SeniorLeverage",
                    "NetLeverage",
                    "InterestCoverage",
                    "FixedChargeCoverage",
                ],
                Some("Leverage"),
            ),
            select_field("operator", "Direction", &["<=", ">="], Some("<=")),
            number_field("threshold", "Threshold (x)", "number", Some(0.0)),
            select_field(
                "frequency",
                "Tested",
                &["QUARTERLY", "MONTHLY", "ANNUALLY", "SEMI_ANNUALLY"],
                Some("QUARTERLY"),
            ),
            FormField {
                name: "has_cure".to_string(),
                label: "Equity cure right".to_string(),
                widget: "checkbox".to_string(),
                required: false,
                default: Some(Json::Bool(false)),
                options: Vec::new(),
                show_when: None,
                validation: None,
            },
            FormField {
                name: "cure_uses".to_string(),
                label: "Maximum cure uses".to_string(),
                widget: "number".to_string(),
                required: true,
                default: Some(Json::from(2)),
                options: Vec::new(),
                show_when: Some(ShowWhen {
                    field: "has_cure".to_string(),
                    equals: Json::Bool(true),
                }),
                validation: Some(FieldCheck {
                    min: Some(1.0),
                    max: Some(10.0),
                    ..FieldCheck::default()
                }),
            },
            FormField {
                name: "cure_cap".to_string(),
                label: "Maximum cure amount".to_string(),
                widget: "currency".to_string(),
                required: false,
                default: None,
                options: Vec::new(),
                show_when: Some(ShowWhen {
                    field: "has_cure".to_string(),
                    equals: Json::Bool(true),
                }),
                validation: Some(FieldCheck {
                    min: Some(0.0),
                    ..FieldCheck::default()
                }),
            },
        ],
        rules: Vec::new(),
        code_template: "COVENANT {{covenant_name}} REQUIRES {{metric}} {{operator}} \
                        {{format.ratio threshold}} TESTED {{frequency}}\
                        {{#if has_cure}} CURE EquityCure MAXIMUM {{cure_uses}} LifeOfFacility\
                        {{#if cure_cap}} CAP {{format.currency cure_cap}}{{/if}}{{/if}}"
            .to_string(),
        word_template: "Section {{section_ref}}. {{element_heading}}. The Borrower \
                        {{#if op_is_max}}shall not permit the {{metric_display}} to exceed \
                        {{threshold_prose}}{{else}}shall maintain the {{metric_display}} at not \
                        less than {{threshold_prose}}{{/if}} {{frequency_display}}.\
                        {{#if has_cure}} The Borrower may exercise the Equity Cure no more than \
                        {{cure_uses}} times over the Life Of Facility\
                        {{#if cure_cap}}, in an aggregate amount not to exceed \
                        {{format.currency cure_cap}}{{/if}}.{{/if}}"
            .to_string(),
        section_ref: "6.1".to_string(),
    }
}

fn fixed_basket_form() -> FormDefinition {
    FormDefinition {
        id: "fixed-basket".to_string(),
        name: "Fixed Basket".to_string(),
        category: "baskets".to_string(),
        element_type: "basket".to_string(),
        fields: vec![
            text_field("basket_name", "Basket name", true),
            number_field("capacity", "Capacity", "currency", Some(0.0)),
        ],
        rules: Vec::new(),
        code_template: "BASKET {{basket_name}} CAPACITY {{format.currency capacity}}".to_string(),
        word_template: "Section {{section_ref}}. {{element_heading}}. The Borrower may utilize \
                        the {{element_heading}} Basket in an aggregate amount not to exceed \
                        {{format.currency capacity}}."
            .to_string(),
        section_ref: "7.1".to_string(),
    }
}

fn grower_basket_form() -> FormDefinition {
    FormDefinition {
        id: "grower-basket".to_string(),
        name: "Grower Basket".to_string(),
        category: "baskets".to_string(),
        element_type: "basket".to_string(),
        fields: vec![
            text_field("basket_name", "Basket name", true),
            number_field("percent", "Percent of metric", "percent", Some(0.0)),
            select_field(
                "metric",
                "Growth metric",
                &["EBITDA", "TotalAssets", "Revenue"],
                Some("EBITDA"),
            ),
            number_field("floor", "Dollar floor", "currency", Some(0.0)),
        ],
        rules: Vec::new(),
        code_template: "BASKET {{basket_name}} CAPACITY {{format.percentage percent}} * \
                        {{metric}} FLOOR {{format.currency floor}}"
            .to_string(),
        word_template: "Section {{section_ref}}. {{element_heading}}. The Borrower may utilize \
                        the {{element_heading}} Basket in an aggregate amount not to exceed the \
                        greater of {{format.currency floor}} and {{format.percentage percent}} \
                        of {{metric_display}}."
            .to_string(),
        section_ref: "7.1".to_string(),
    }
}

fn builder_basket_form() -> FormDefinition {
    FormDefinition {
        id: "builder-basket".to_string(),
        name: "Builder Basket".to_string(),
        category: "baskets".to_string(),
        element_type: "basket".to_string(),
        fields: vec![
            text_field("basket_name", "Basket name", true),
            number_field("percent", "Accrual percent", "percent", Some(0.0)),
            select_field(
                "metric",
                "Accrual source",
                &["CumulativeNetIncome", "ExcessCashFlow"],
                Some("CumulativeNetIncome"),
            ),
            number_field("starting", "Starting amount", "currency", Some(0.0)),
            number_field("maximum", "Hard cap", "currency", Some(0.0)),
        ],
        rules: vec![CrossRule {
            left: "starting".to_string(),
            op: "<=".to_string(),
            right: "maximum".to_string(),
            message: "starting amount cannot exceed the hard cap".to_string(),
        }],
        code_template: "BASKET {{basket_name}} BUILDS_FROM {{format.percentage percent}} * \
                        {{metric}} STARTING {{format.currency starting}} MAXIMUM \
                        {{format.currency maximum}}"
            .to_string(),
        word_template: "Section {{section_ref}}. {{element_heading}}. The Borrower may utilize \
                        the {{element_heading}} Basket in an aggregate amount not to exceed the \
                        sum of {{format.currency starting}} plus {{format.percentage percent}} \
                        of {{metric_display}}, up to a maximum of {{format.currency maximum}}."
            .to_string(),
        section_ref: "7.1".to_string(),
    }
}

fn defined_term_form() -> FormDefinition {
    FormDefinition {
        id: "defined-term".to_string(),
        name: "Defined Term".to_string(),
        category: "definitions".to_string(),
        element_type: "definition".to_string(),
        fields: vec![
            text_field("term_name", "Term", true),
            FormField {
                name: "formula".to_string(),
                label: "Formula".to_string(),
                widget: "text".to_string(),
                required: true,
                default: None,
                options: Vec::new(),
                show_when: None,
                validation: Some(FieldCheck {
                    expression: true,
                    ..FieldCheck::default()
                }),
            },
        ],
        rules: Vec::new(),
        code_template: "DEFINE {{term_name}} AS {{formula}}".to_string(),
        word_template: "Section {{section_ref}}. \"{{term_name}}\" means {{formula_prose}}."
            .to_string(),
        section_ref: "1.1".to_string(),
    }
}

fn negative_covenant_form() -> FormDefinition {
    FormDefinition {
        id: "negative-covenant".to_string(),
        name: "Negative Covenant with Basket Carve-Out".to_string(),
        category: "negative-covenants".to_string(),
        element_type: "prohibition".to_string(),
        fields: vec![
            select_field(
                "action",
                "Restricted action",
                &["Dividends", "Investments", "AssetSales", "Liens"],
                Some("Dividends"),
            ),
            text_field("basket_name", "Carve-out basket", true),
            number_field("basket_capacity", "Basket capacity", "currency", Some(0.0)),
        ],
        rules: Vec::new(),
        code_template: "BASKET {{basket_name}} CAPACITY {{format.currency basket_capacity}}\n\n\
                        PROHIBIT {{action}} EXCEPT WHEN amount <= AVAILABLE({{basket_name}})"
            .to_string(),
        word_template: "Section {{section_ref}}. {{basket_name_display}}. The Borrower may \
                        utilize the {{basket_name_display}} Basket in an aggregate amount not \
                        to exceed {{format.currency basket_capacity}}.\n\n\
                        Section 7.2. The Borrower shall not make or permit any \
                        {{action_display}}, except (a) when the amount thereof does not exceed \
                        availability under the {{basket_name_display}} Basket."
            .to_string(),
        section_ref: "7.1".to_string(),
    }
}

fn event_of_default_form() -> FormDefinition {
    FormDefinition {
        id: "event-of-default".to_string(),
        name: "Event of Default".to_string(),
        category: "events".to_string(),
        element_type: "event".to_string(),
        fields: vec![
            text_field("event_name", "Event name", true),
            text_field("trigger_field", "Trigger data field", true),
            number_field("trigger_threshold", "Trigger threshold", "currency", Some(0.0)),
            FormField {
                name: "grace_days".to_string(),
                label: "Grace period (days)".to_string(),
                widget: "number".to_string(),
                required: false,
                default: None,
                options: Vec::new(),
                show_when: None,
                validation: Some(FieldCheck {
                    min: Some(0.0),
                    max: Some(365.0),
                    ..FieldCheck::default()
                }),
            },
            FormField {
                name: "consequence".to_string(),
                label: "Consequence".to_string(),
                widget: "select".to_string(),
                required: false,
                default: None,
                options: vec!["Acceleration".to_string(), "Termination".to_string()],
                show_when: None,
                validation: None,
            },
        ],
        rules: Vec::new(),
        code_template: "EVENT {{event_name}} TRIGGERS {{trigger_field}} > \
                        {{format.currency trigger_threshold}}\
                        {{#if grace_days}} GRACE_PERIOD {{grace_days}}{{/if}}\
                        {{#if consequence}} CONSEQUENCE {{consequence}}{{/if}}"
            .to_string(),
        word_template: "Section {{section_ref}}. {{element_heading}}. An Event of Default \
                        shall occur if {{trigger_field_display}} exceeds \
                        {{format.currency trigger_threshold}}\
                        {{#if grace_days}}, subject to a grace period of {{grace_days}} days{{/if}}\
                        {{#if consequence}}, whereupon {{consequence_display}} shall result{{/if}}."
            .to_string(),
        section_ref: "8.1".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, Json)]) -> serde_json::Map<String, Json> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn form(id: &str) -> FormDefinition {
        form_library()
            .into_iter()
            .find(|f| f.id == id)
            .expect("form exists")
    }

    #[test]
    fn covenant_form_emits_code_and_prose() {
        let output = generate_form_output(
            &form("maintenance-covenant"),
            &values(&[
                ("covenant_name", json!("MaxLeverage")),
                ("threshold", json!(4.5)),
            ]),
        )
        .expect("generates");
        assert_eq!(
            output.code,
            "COVENANT MaxLeverage REQUIRES Leverage <= 4.50x TESTED QUARTERLY"
        );
        assert!(output.prose.contains("Section 6.1. Max Leverage."));
        assert!(output
            .prose
            .contains("shall not permit the Consolidated Total Leverage Ratio to exceed 4.50 to 1.00"));
        assert_eq!(output.element_name, "MaxLeverage");
        assert_eq!(output.element_type, "covenant");
    }

    #[test]
    fn covenant_form_with_cure() {
        let output = generate_form_output(
            &form("maintenance-covenant"),
            &values(&[
                ("covenant_name", json!("MaxLeverage")),
                ("threshold", json!(4.5)),
                ("has_cure", json!(true)),
                ("cure_cap", json!(50_000_000.0)),
            ]),
        )
        .expect("generates");
        assert!(output
            .code
            .contains("CURE EquityCure MAXIMUM 2 LifeOfFacility CAP $50,000,000"));
        assert!(output
            .prose
            .contains("no more than 2 times over the Life Of Facility"));
    }

    #[test]
    fn every_library_form_validates_clean() {
        for form in form_library() {
            let values = passing_values(&form.id);
            let output = generate_form_output(&form, &values)
                .unwrap_or_else(|e| panic!("{}: {}", form.id, e));
            let report = proviso_language::check(&output.code)
                .unwrap_or_else(|e| panic!("{} code failed to parse: {}\n{}", form.id, e, output.code));
            assert!(
                report.errors.is_empty(),
                "{} produced validation errors: {:?}\n{}",
                form.id,
                report.errors,
                output.code
            );
        }
    }

    fn passing_values(id: &str) -> serde_json::Map<String, Json> {
        match id {
            "maintenance-covenant" => values(&[
                ("covenant_name", json!("MaxLeverage")),
                ("threshold", json!(4.5)),
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
            ]),
            other => panic!("no passing values for {}", other),
        }
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = generate_form_output(
            &form("fixed-basket"),
            &values(&[("capacity", json!(25_000_000.0))]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            FormError::MissingField {
                field: "basket_name".to_string()
            }
        );
    }

    #[test]
    fn show_when_skips_inactive_requirements() {
        // cure_uses is required but only when has_cure is true.
        let output = generate_form_output(
            &form("maintenance-covenant"),
            &values(&[
                ("covenant_name", json!("MaxLeverage")),
                ("threshold", json!(4.5)),
                ("has_cure", json!(false)),
            ]),
        );
        assert!(output.is_ok());
    }

    #[test]
    fn cross_rule_rejects_inverted_builder_bounds() {
        let err = generate_form_output(
            &form("builder-basket"),
            &values(&[
                ("basket_name", json!("CumulativeCredit")),
                ("percent", json!(50.0)),
                ("starting", json!(200_000_000.0)),
                ("maximum", json!(100_000_000.0)),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, FormError::RuleViolation { .. }));
    }

    #[test]
    fn select_rejects_unknown_options() {
        let err = generate_form_output(
            &form("maintenance-covenant"),
            &values(&[
                ("covenant_name", json!("MaxLeverage")),
                ("threshold", json!(4.5)),
                ("metric", json!("ShareholderValue")),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, FormError::NotInOptions { .. }));
    }

    #[test]
    fn identifier_validation_rejects_spaces() {
        let err = generate_form_output(
            &form("fixed-basket"),
            &values(&[
                ("basket_name", json!("General Basket")),
                ("capacity", json!(1.0)),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, FormError::NotAnIdentifier { .. }));
    }

    #[test]
    fn formula_must_parse() {
        let err = generate_form_output(
            &form("defined-term"),
            &values(&[
                ("term_name", json!("Broken")),
                ("formula", json!("TotalDebt +")),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, FormError::NotAnExpression { .. }));
    }

    #[test]
    fn generate_from_template_by_id() {
        let output = generate_from_template(
            "fixed-basket",
            &values(&[
                ("basket_name", json!("Inv")),
                ("capacity", json!(25_000_000.0)),
            ]),
        )
        .expect("known template");
        assert_eq!(output.code, "BASKET Inv CAPACITY $25,000,000");
        assert_eq!(output.template_name, "Fixed Basket");
    }

    #[test]
    fn generate_from_template_unknown_id_is_none() {
        assert!(generate_from_template("waterfall-phase", &values(&[])).is_none());
    }

    #[test]
    fn forms_round_trip_through_serde() {
        let form = form("maintenance-covenant");
        let json = serde_json::to_string(&form).unwrap();
        let back: FormDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, form.id);
        assert_eq!(back.fields.len(), form.fields.len());
    }
}
