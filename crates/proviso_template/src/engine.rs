//! Staged template engine.
//!
//! Templates parse once into a node tree, then apply against a context —
//! no repeated source rescanning. The syntax is the familiar
//! Mustache/Handlebars subset:
//!
//! | Form | Meaning |
//! |------|---------|
//! | `{{name}}` | Variable substitution (dotted paths reach into objects) |
//! | `{{format.currency x}}` | Helper call: `currency`, `percentage`, `ratio`, `date` |
//! | `{{#if c}}…{{else}}…{{/if}}` | Conditional; truthy = non-empty, non-zero, non-false |
//! | `{{#unless c}}…{{/unless}}` | Inverted conditional |
//! | `{{#each xs}}…{{/each}}` | Iteration with `@index`, `@first`, `@last`, `.` |
//!
//! Inside `{{#each}}`, record items spread their fields into scope;
//! scalar items bind to `.`. Unknown variables render empty. Block
//! removal leaves blank-line runs behind; rendering collapses them.

use serde_json::Value as Json;

use crate::display::{format_currency_amount, format_date_long, format_percent, format_ratio};

/// A parsed template, ready to render any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Var(String),
    Helper { helper: Helper, arg: String },
    If {
        cond: String,
        then: Vec<Node>,
        els: Vec<Node>,
    },
    Unless { cond: String, body: Vec<Node> },
    Each { list: String, body: Vec<Node> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Helper {
    Currency,
    Percentage,
    Ratio,
    Date,
}

impl Helper {
    fn from_name(name: &str) -> Option<Helper> {
        match name {
            "format.currency" => Some(Helper::Currency),
            "format.percentage" => Some(Helper::Percentage),
            "format.ratio" => Some(Helper::Ratio),
            "format.date" => Some(Helper::Date),
            _ => None,
        }
    }
}

/// The deal record templates may reference as `deal.name`,
/// `deal.facility_amount`, `deal.currency`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DealRecord {
    pub name: String,
    pub facility_amount: f64,
    pub currency: String,
}

/// Everything a render sees: form values, the optional deal record, and
/// today's date (supplied by the caller so rendering stays pure).
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub values: serde_json::Map<String, Json>,
    pub deal: Option<DealRecord>,
    /// ISO date (`2026-07-15`); `{{today}}` renders it long-form.
    pub today: Option<String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: &str, value: Json) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn with_str(self, name: &str, value: &str) -> Self {
        self.with_value(name, Json::String(value.to_string()))
    }

    pub fn with_number(self, name: &str, value: f64) -> Self {
        self.with_value(
            name,
            serde_json::Number::from_f64(value)
                .map(Json::Number)
                .unwrap_or(Json::Null),
        )
    }
}

/// One-call convenience: parse then render.
pub fn render_template(template: &str, context: &TemplateContext) -> String {
    Template::parse(template).render(context)
}

impl Template {
    /// Parses template source. Malformed block structure degrades to
    /// literal text rather than failing: a host typo should never panic a
    /// render.
    pub fn parse(source: &str) -> Template {
        let mut tags = TagStream::new(source);
        let nodes = parse_nodes(&mut tags, None);
        Template { nodes }
    }

    pub fn render(&self, context: &TemplateContext) -> String {
        let mut out = String::new();
        let mut scopes: Vec<Scope> = Vec::new();
        render_nodes(&self.nodes, context, &mut scopes, &mut out);
        collapse_blank_lines(&out)
    }
}

// ── Parsing ─────────────────────────────────────────────────────────────

/// A lexical item in template source: literal text or one `{{...}}` tag.
enum Piece {
    Text(String),
    Tag(String),
}

struct TagStream {
    pieces: std::vec::IntoIter<Piece>,
}

impl TagStream {
    fn new(source: &str) -> TagStream {
        let mut pieces = Vec::new();
        let mut rest = source;
        while let Some(open) = rest.find("{{") {
            if open > 0 {
                pieces.push(Piece::Text(rest[..open].to_string()));
            }
            match rest[open..].find("}}") {
                Some(close_rel) => {
                    let inner = &rest[open + 2..open + close_rel];
                    pieces.push(Piece::Tag(inner.trim().to_string()));
                    rest = &rest[open + close_rel + 2..];
                }
                None => {
                    // Unterminated tag: keep the rest as text.
                    pieces.push(Piece::Text(rest[open..].to_string()));
                    rest = "";
                }
            }
        }
        if !rest.is_empty() {
            pieces.push(Piece::Text(rest.to_string()));
        }
        TagStream {
            pieces: pieces.into_iter(),
        }
    }

    fn next(&mut self) -> Option<Piece> {
        self.pieces.next()
    }
}

/// Parses nodes until the closing tag of `until` (e.g. `/if`), or end of
/// input. Returns at `{{else}}` too, leaving the caller to resume.
fn parse_nodes(tags: &mut TagStream, until: Option<&str>) -> Vec<Node> {
    let mut nodes = Vec::new();
    while let Some(piece) = tags.next() {
        match piece {
            Piece::Text(text) => nodes.push(Node::Text(text)),
            Piece::Tag(tag) => {
                if let Some(closer) = until {
                    if tag == closer || tag == "else" {
                        // Push the marker back is not possible with the
                        // simple stream; signal via sentinel node.
                        nodes.push(Node::Text(format!("\u{0}{}", tag)));
                        return nodes;
                    }
                }
                if let Some(cond) = tag.strip_prefix("#if ") {
                    let (then, els) = parse_branches(tags, "/if");
                    nodes.push(Node::If {
                        cond: cond.trim().to_string(),
                        then,
                        els,
                    });
                } else if let Some(cond) = tag.strip_prefix("#unless ") {
                    let (body, _) = parse_branches(tags, "/unless");
                    nodes.push(Node::Unless {
                        cond: cond.trim().to_string(),
                        body,
                    });
                } else if let Some(list) = tag.strip_prefix("#each ") {
                    let (body, _) = parse_branches(tags, "/each");
                    nodes.push(Node::Each {
                        list: list.trim().to_string(),
                        body,
                    });
                } else if let Some((helper_name, arg)) = split_helper(&tag) {
                    nodes.push(Node::Helper {
                        helper: helper_name,
                        arg,
                    });
                } else if tag.starts_with('#') || tag.starts_with('/') || tag == "else" {
                    // Stray block tag outside its block: drop it.
                } else {
                    nodes.push(Node::Var(tag));
                }
            }
        }
    }
    nodes
}

/// Parses a block body and optional `{{else}}` alternative up to `closer`.
fn parse_branches(tags: &mut TagStream, closer: &str) -> (Vec<Node>, Vec<Node>) {
    let mut primary = parse_nodes(tags, Some(closer));
    let marker = take_marker(&mut primary);
    match marker.as_deref() {
        Some("else") => {
            let mut alt = parse_nodes(tags, Some(closer));
            take_marker(&mut alt);
            (primary, alt)
        }
        _ => (primary, Vec::new()),
    }
}

/// Pops the `\0`-prefixed control marker `parse_nodes` appends when it
/// stops at `{{else}}` or a closing tag.
fn take_marker(nodes: &mut Vec<Node>) -> Option<String> {
    match nodes.last() {
        Some(Node::Text(text)) if text.starts_with('\u{0}') => {
            let marker = text[1..].to_string();
            nodes.pop();
            Some(marker)
        }
        _ => None,
    }
}

fn split_helper(tag: &str) -> Option<(Helper, String)> {
    let (name, arg) = tag.split_once(' ')?;
    let helper = Helper::from_name(name.trim())?;
    Some((helper, arg.trim().to_string()))
}

// ── Rendering ───────────────────────────────────────────────────────────

/// One `{{#each}}` iteration scope.
struct Scope {
    item: Json,
    index: usize,
    first: bool,
    last: bool,
}

fn render_nodes(
    nodes: &[Node],
    context: &TemplateContext,
    scopes: &mut Vec<Scope>,
    out: &mut String,
) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(path) => out.push_str(&display_value(&lookup(path, context, scopes))),
            Node::Helper { helper, arg } => {
                let value = lookup(arg, context, scopes);
                out.push_str(&apply_helper(*helper, &value));
            }
            Node::If { cond, then, els } => {
                if is_truthy(&lookup(cond, context, scopes)) {
                    render_nodes(then, context, scopes, out);
                } else {
                    render_nodes(els, context, scopes, out);
                }
            }
            Node::Unless { cond, body } => {
                if !is_truthy(&lookup(cond, context, scopes)) {
                    render_nodes(body, context, scopes, out);
                }
            }
            Node::Each { list, body } => {
                let items = match lookup(list, context, scopes) {
                    Json::Array(items) => items,
                    _ => Vec::new(),
                };
                let count = items.len();
                for (index, item) in items.into_iter().enumerate() {
                    scopes.push(Scope {
                        item,
                        index,
                        first: index == 0,
                        last: index + 1 == count,
                    });
                    render_nodes(body, context, scopes, out);
                    scopes.pop();
                }
            }
        }
    }
}

/// Resolves a variable path: iteration bindings first, then form values,
/// then the deal record and `today`.
fn lookup(path: &str, context: &TemplateContext, scopes: &[Scope]) -> Json {
    if let Some(scope) = scopes.last() {
        match path {
            "." => return scope.item.clone(),
            "@index" => return Json::from(scope.index),
            "@first" => return Json::Bool(scope.first),
            "@last" => return Json::Bool(scope.last),
            _ => {
                // Record items spread their fields into scope.
                if let Json::Object(fields) = &scope.item {
                    if let Some(value) = resolve_path(fields, path) {
                        return value;
                    }
                }
            }
        }
    }

    if let Some(value) = resolve_path(&context.values, path) {
        return value;
    }

    if let Some(deal) = &context.deal {
        match path {
            "deal.name" => return Json::String(deal.name.clone()),
            "deal.facility_amount" => {
                return serde_json::Number::from_f64(deal.facility_amount)
                    .map(Json::Number)
                    .unwrap_or(Json::Null)
            }
            "deal.currency" => return Json::String(deal.currency.clone()),
            _ => {}
        }
    }

    if path == "today" {
        if let Some(today) = &context.today {
            return Json::String(today.clone());
        }
    }

    Json::Null
}

/// Dotted-path lookup into an object map.
fn resolve_path(map: &serde_json::Map<String, Json>, path: &str) -> Option<Json> {
    let mut segments = path.split('.');
    let mut current = map.get(segments.next()?)?.clone();
    for segment in segments {
        current = current.get(segment)?.clone();
    }
    Some(current)
}

/// Truthiness: non-empty, non-zero, non-false, non-null.
fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Json::String(s) => !s.is_empty(),
        Json::Array(a) => !a.is_empty(),
        Json::Object(_) => true,
    }
}

fn display_value(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            Some(f) => format!("{}", f),
            None => n.to_string(),
        },
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn apply_helper(helper: Helper, value: &Json) -> String {
    match helper {
        Helper::Currency => match json_number(value) {
            Some(amount) => format_currency_amount(amount),
            None => String::new(),
        },
        Helper::Percentage => match json_number(value) {
            Some(pct) => format_percent(pct),
            None => String::new(),
        },
        Helper::Ratio => match json_number(value) {
            Some(ratio) => format_ratio(ratio),
            None => String::new(),
        },
        Helper::Date => match value {
            Json::String(iso) => format_date_long(iso),
            _ => String::new(),
        },
    }
}

fn json_number(value: &Json) -> Option<f64> {
    match value {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Collapses the blank-line runs block removal leaves behind: three or
/// more consecutive newlines become two.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> TemplateContext {
        TemplateContext::new()
            .with_str("name", "MaxLeverage")
            .with_number("threshold", 4.5)
            .with_number("capacity", 25_000_000.0)
            .with_number("pct", 15.0)
            .with_value("has_cure", json!(true))
            .with_value("items", json!(["alpha", "beta", "gamma"]))
            .with_value(
                "carveouts",
                json!([
                    {"label": "ordinary course", "amount": 5000000.0},
                    {"label": "intercompany", "amount": 10000000.0}
                ]),
            )
    }

    #[test]
    fn variable_substitution() {
        assert_eq!(
            render_template("COVENANT {{name}}", &ctx()),
            "COVENANT MaxLeverage"
        );
    }

    #[test]
    fn unknown_variables_render_empty() {
        assert_eq!(render_template("[{{missing}}]", &ctx()), "[]");
    }

    #[test]
    fn currency_helper_groups_thousands() {
        assert_eq!(
            render_template("{{format.currency capacity}}", &ctx()),
            "$25,000,000"
        );
    }

    #[test]
    fn percentage_and_ratio_helpers() {
        assert_eq!(render_template("{{format.percentage pct}}", &ctx()), "15%");
        assert_eq!(render_template("{{format.ratio threshold}}", &ctx()), "4.50x");
    }

    #[test]
    fn date_helper_renders_long_form() {
        let context = TemplateContext::new().with_str("closing", "2026-07-15");
        assert_eq!(
            render_template("{{format.date closing}}", &context),
            "July 15, 2026"
        );
    }

    #[test]
    fn if_else_blocks() {
        let template = "{{#if has_cure}}with cure{{else}}without cure{{/if}}";
        assert_eq!(render_template(template, &ctx()), "with cure");

        let no_cure = ctx().with_value("has_cure", json!(false));
        assert_eq!(render_template(template, &no_cure), "without cure");
    }

    #[test]
    fn unless_inverts() {
        let template = "{{#unless has_cure}}no cure right{{/unless}}";
        assert_eq!(render_template(template, &ctx()), "");
        let no_cure = ctx().with_value("has_cure", json!(false));
        assert_eq!(render_template(template, &no_cure), "no cure right");
    }

    #[test]
    fn each_binds_index_and_boundaries() {
        let template = "{{#each items}}{{@index}}:{{.}}{{#unless @last}}, {{/unless}}{{/each}}";
        assert_eq!(
            render_template(template, &ctx()),
            "0:alpha, 1:beta, 2:gamma"
        );
    }

    #[test]
    fn each_spreads_record_fields() {
        let template =
            "{{#each carveouts}}({{label}} {{format.currency amount}}){{/each}}";
        assert_eq!(
            render_template(template, &ctx()),
            "(ordinary course $5,000,000)(intercompany $10,000,000)"
        );
    }

    #[test]
    fn nested_blocks() {
        let template = "{{#if has_cure}}{{#each items}}{{.}};{{/each}}{{/if}}";
        assert_eq!(render_template(template, &ctx()), "alpha;beta;gamma;");
    }

    #[test]
    fn truthiness_rules() {
        let context = TemplateContext::new()
            .with_number("zero", 0.0)
            .with_str("empty", "")
            .with_value("list", json!([]));
        let template = "{{#if zero}}a{{/if}}{{#if empty}}b{{/if}}{{#if list}}c{{/if}}";
        assert_eq!(render_template(template, &context), "");
    }

    #[test]
    fn block_removal_collapses_blank_lines() {
        let template = "first\n{{#if missing}}\nnever\n{{/if}}\n\n\nlast";
        let rendered = render_template(template, &TemplateContext::new());
        assert!(!rendered.contains("\n\n\n"), "{:?}", rendered);
        assert!(rendered.starts_with("first"));
        assert!(rendered.ends_with("last"));
    }

    #[test]
    fn deal_record_paths() {
        let mut context = TemplateContext::new();
        context.deal = Some(DealRecord {
            name: "Project Atlas".to_string(),
            facility_amount: 500_000_000.0,
            currency: "USD".to_string(),
        });
        assert_eq!(
            render_template("{{deal.name}} {{format.currency deal.facility_amount}}", &context),
            "Project Atlas $500,000,000"
        );
    }

    #[test]
    fn parse_once_render_many() {
        let template = Template::parse("{{name}}!");
        let a = template.render(&ctx());
        let b = template.render(&ctx().with_str("name", "MinCoverage"));
        assert_eq!(a, "MaxLeverage!");
        assert_eq!(b, "MinCoverage!");
    }

    #[test]
    fn unterminated_tag_degrades_to_text() {
        assert_eq!(render_template("oops {{name", &ctx()), "oops {{name");
    }
}
