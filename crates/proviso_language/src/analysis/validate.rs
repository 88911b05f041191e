//! The reference pass: classify every identifier and check every call.

use proviso_base::{Interner, Span, Symbol};

use crate::ast::{
    BasketShape, Exception, Expr, Func, Program, Stmt,
};

use super::{Diagnostic, Severity, SymbolKind, SymbolTable, ValidationReport};

/// Validates a parsed program: builds the symbol table, then walks every
/// expression classifying references.
pub fn validate_program(program: &Program<'_>, interner: &Interner) -> ValidationReport {
    let (table, duplicates) = SymbolTable::build(program);
    let mut validator = Validator {
        table: &table,
        interner,
        report: ValidationReport::default(),
        context: None,
        amount_allowed: false,
    };

    for dup in duplicates {
        let stmt = &program.statements[dup.statement_index];
        validator.report.push(Diagnostic {
            severity: Severity::Error,
            message: format!(
                "duplicate {} '{}'",
                dup.kind.display(),
                interner.resolve(dup.name)
            ),
            reference: Some(interner.resolve(dup.name).to_string()),
            context: Some(format!("{} {}", stmt.kind_name(), interner.resolve(dup.name))),
            expected_kind: Some(dup.kind),
            span: stmt.span(),
        });
    }

    for stmt in &program.statements {
        validator.check_statement(stmt);
    }

    validator.report
}

struct Validator<'v> {
    table: &'v SymbolTable,
    interner: &'v Interner,
    report: ValidationReport,
    /// `"covenant MaxLeverage"`-style context for findings.
    context: Option<String>,
    /// `true` inside a `PROHIBIT ... EXCEPT WHEN` subcondition.
    amount_allowed: bool,
}

impl<'v> Validator<'v> {
    fn check_statement(&mut self, stmt: &Stmt<'_>) {
        self.context = Some(format!(
            "{} {}",
            stmt.kind_name(),
            self.interner.resolve(stmt.name())
        ));

        match stmt {
            Stmt::Define(def) => {
                self.check_expr(def.body);
                if let Some(cap) = def.cap {
                    self.check_expr(cap);
                }
            }
            Stmt::Covenant(cov) => {
                if let Some(req) = &cov.requires {
                    self.check_expr(req.lhs);
                    self.check_expr(req.rhs);
                }
                if let Some(cure) = &cov.cure {
                    if let Some(amount) = cure.max_amount {
                        self.check_expr(amount);
                    }
                }
                if let Some(breach) = cov.breach {
                    if self.table.lookup(SymbolKind::Event, breach).is_none() {
                        self.warn_reference(
                            breach,
                            cov.span,
                            format!(
                                "breach target '{}' is not a declared event",
                                self.interner.resolve(breach)
                            ),
                            Some(SymbolKind::Event),
                        );
                    }
                }
            }
            Stmt::Basket(basket) => {
                match &basket.shape {
                    BasketShape::Fixed {
                        capacity,
                        plus,
                        floor,
                    } => {
                        self.check_expr(capacity);
                        for addition in plus {
                            self.check_expr(addition);
                        }
                        if let Some(floor) = floor {
                            self.check_expr(floor);
                        }
                    }
                    BasketShape::Builder {
                        builds_from,
                        starting,
                        maximum,
                    } => {
                        self.check_expr(builds_from);
                        if let Some(starting) = starting {
                            self.check_expr(starting);
                        }
                        if let Some(maximum) = maximum {
                            self.check_expr(maximum);
                        }
                    }
                }
                for name in &basket.subject_to {
                    if self.table.lookup(SymbolKind::Condition, *name).is_none() {
                        self.error_reference(
                            *name,
                            basket.span,
                            format!(
                                "SUBJECT TO references undefined condition '{}'",
                                self.interner.resolve(*name)
                            ),
                            Some(SymbolKind::Condition),
                        );
                    }
                }
            }
            Stmt::Condition(cond) => self.check_expr(cond.body),
            Stmt::Prohibit(pro) => {
                for exception in &pro.exceptions {
                    match exception {
                        Exception::When { conditions, .. } => {
                            self.amount_allowed = true;
                            for condition in conditions {
                                self.check_expr(condition);
                            }
                            self.amount_allowed = false;
                        }
                        Exception::Basket { name, span } => {
                            if self.table.lookup(SymbolKind::Basket, *name).is_none() {
                                self.error_reference(
                                    *name,
                                    *span,
                                    format!(
                                        "EXCEPT references undefined basket '{}'",
                                        self.interner.resolve(*name)
                                    ),
                                    Some(SymbolKind::Basket),
                                );
                            }
                        }
                    }
                }
            }
            Stmt::Event(event) => self.check_expr(event.trigger),
        }
    }

    fn check_expr(&mut self, expr: &Expr<'_>) {
        match expr {
            Expr::Number { .. }
            | Expr::Currency { .. }
            | Expr::Percent { .. }
            | Expr::Ratio { .. } => {}
            Expr::Ident { name, span } => self.check_ident(*name, *span),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.check_expr(left);
                self.check_expr(right);
            }
            Expr::Unary { operand, .. } => self.check_expr(operand),
            Expr::Compare {
                left, right, span, ..
            } => {
                self.check_unit_mix(left, right, *span);
                self.check_expr(left);
                self.check_expr(right);
            }
            Expr::Call { func, args, span } => self.check_call(*func, args, *span),
            Expr::Trailing { inner, .. } => self.check_expr(inner),
        }
    }

    fn check_ident(&mut self, name: Symbol, span: Span) {
        if name == Symbol::AMOUNT {
            if !self.amount_allowed {
                self.error_reference(
                    name,
                    span,
                    "'amount' is only permitted inside PROHIBIT ... EXCEPT WHEN".to_string(),
                    None,
                );
            }
            return;
        }
        if !self.table.is_declared(name) {
            self.warn_reference(
                name,
                span,
                format!(
                    "'{}' is not declared; likely a financial data field",
                    self.interner.resolve(name)
                ),
                None,
            );
        }
    }

    fn check_call(&mut self, func: Func, args: &[&Expr<'_>], span: Span) {
        if args.len() != func.arity() {
            self.push(
                Severity::Error,
                format!(
                    "{} takes {} argument(s), found {}",
                    func.name(),
                    func.arity(),
                    args.len()
                ),
                None,
                None,
                span,
            );
            return;
        }

        match func {
            Func::Available => self.check_named_arg(
                args[0],
                SymbolKind::Basket,
                "AVAILABLE expects a basket name",
            ),
            Func::Compliant => self.check_named_arg(
                args[0],
                SymbolKind::Covenant,
                "COMPLIANT expects a covenant name",
            ),
            Func::Exists => self.check_exists_arg(args[0]),
            Func::GreaterOf | Func::LesserOf => {
                for arg in args {
                    self.check_expr(arg);
                }
            }
            Func::Not | Func::ProForma | Func::Sum => self.check_expr(args[0]),
        }
    }

    /// `AVAILABLE`/`COMPLIANT`: the argument must be an identifier naming
    /// the right symbol kind.
    fn check_named_arg(&mut self, arg: &Expr<'_>, kind: SymbolKind, wants: &str) {
        match arg {
            Expr::Ident { name, span } => {
                if self.table.lookup(kind, *name).is_none() {
                    self.error_reference(
                        *name,
                        *span,
                        format!(
                            "undefined {} '{}'",
                            kind.display(),
                            self.interner.resolve(*name)
                        ),
                        Some(kind),
                    );
                }
            }
            other => self.push(
                Severity::Error,
                wants.to_string(),
                None,
                Some(kind),
                other.span(),
            ),
        }
    }

    /// `EXISTS`: events and predefined states resolve; anything else warns
    /// but still evaluates (to false) at runtime.
    fn check_exists_arg(&mut self, arg: &Expr<'_>) {
        match arg {
            Expr::Ident { name, span } => {
                let known = self.table.lookup(SymbolKind::Event, *name).is_some()
                    || name.is_runtime_state();
                if !known {
                    self.warn_reference(
                        *name,
                        *span,
                        format!(
                            "'{}' is neither a declared event nor a runtime state",
                            self.interner.resolve(*name)
                        ),
                        Some(SymbolKind::Event),
                    );
                }
            }
            other => self.push(
                Severity::Error,
                "EXISTS expects an event or state name".to_string(),
                None,
                Some(SymbolKind::Event),
                other.span(),
            ),
        }
    }

    /// Static half of the unit-mixing rule: a ratio literal never compares
    /// against a percentage literal. The evaluator enforces the dynamic
    /// half.
    fn check_unit_mix(&mut self, left: &Expr<'_>, right: &Expr<'_>, span: Span) {
        let mixed = matches!(
            (left, right),
            (Expr::Ratio { .. }, Expr::Percent { .. }) | (Expr::Percent { .. }, Expr::Ratio { .. })
        );
        if mixed {
            self.push(
                Severity::Error,
                "cannot compare a ratio to a percentage".to_string(),
                None,
                None,
                span,
            );
        }
    }

    fn error_reference(
        &mut self,
        name: Symbol,
        span: Span,
        message: String,
        expected: Option<SymbolKind>,
    ) {
        let reference = Some(self.interner.resolve(name).to_string());
        self.push(Severity::Error, message, reference, expected, span);
    }

    fn warn_reference(
        &mut self,
        name: Symbol,
        span: Span,
        message: String,
        expected: Option<SymbolKind>,
    ) {
        let reference = Some(self.interner.resolve(name).to_string());
        self.push(Severity::Warning, message, reference, expected, span);
    }

    fn push(
        &mut self,
        severity: Severity,
        message: String,
        reference: Option<String>,
        expected_kind: Option<SymbolKind>,
        span: Span,
    ) {
        self.report.push(Diagnostic {
            severity,
            message,
            reference,
            context: self.context.clone(),
            expected_kind,
            span,
        });
    }
}
