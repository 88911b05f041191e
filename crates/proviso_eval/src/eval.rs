//! Tree-walking evaluation of ProViso programs.
//!
//! The [`Evaluator`] walks each statement against the snapshot and builds
//! per-entity results. Identifier resolution order:
//!
//! 1. `DEFINE` symbols — recursive evaluation with cycle detection;
//! 2. declared conditions and covenants — boolean readings;
//! 3. the `amount` binding inside a prohibition carve-out;
//! 4. the snapshot field map of the active view (current, trailing, or a
//!    `SUM` period), with pro forma deltas when inside `PROFORMA`;
//! 5. otherwise an unresolved-data error for that entity alone.

use proviso_base::{Interner, Symbol};
use proviso_language::ast::{
    BasketShape, Exception, Expr, Func, LogicalOp, Program, Stmt, UnaryOp,
};
use proviso_language::analysis::{SymbolKind, SymbolTable};
use proviso_language::format::render_expr;
use rustc_hash::FxHashSet;

use crate::result::{
    ActionDecision, BasketState, ComplianceStatus, ConditionResult, CovenantResult,
    CureAvailability, EvaluationResult, EventStatus,
};
use crate::snapshot::{FinancialSnapshot, Overlay};
use crate::value::{round_half_even, EvalError, Value};

/// Which snapshot map identifier resolution reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Current,
    Trailing,
    Period(usize),
}

/// Evaluates every covenant, basket, condition, and event in the program,
/// plus the overlay's proposed action when present.
pub fn evaluate(
    program: &Program<'_>,
    interner: &Interner,
    snapshot: &FinancialSnapshot,
    overlay: Option<&Overlay>,
) -> EvaluationResult {
    let mut evaluator = Evaluator::new(program, interner, snapshot, overlay);
    evaluator.run()
}

/// Adjudicates one proposed action against the program's prohibitions.
pub fn decide_action(
    program: &Program<'_>,
    interner: &Interner,
    snapshot: &FinancialSnapshot,
    action: &str,
    amount: Value,
    overlay: Option<&Overlay>,
) -> ActionDecision {
    let mut evaluator = Evaluator::new(program, interner, snapshot, overlay);
    evaluator.decide(action, amount)
}

pub struct Evaluator<'e, 'a> {
    program: &'e Program<'a>,
    interner: &'e Interner,
    table: SymbolTable,
    snapshot: &'e FinancialSnapshot,
    overlay: Option<&'e Overlay>,

    // Walk state, reset between entities.
    view: View,
    proforma: bool,
    amount: Option<Value>,
    /// (kind, name) pairs currently being evaluated; cycle detection.
    eval_stack: Vec<(SymbolKind, Symbol)>,
    /// Innermost `EXCLUDING` frame; excluded names read as zero.
    exclusions: Vec<FxHashSet<Symbol>>,
}

impl<'e, 'a> Evaluator<'e, 'a> {
    pub fn new(
        program: &'e Program<'a>,
        interner: &'e Interner,
        snapshot: &'e FinancialSnapshot,
        overlay: Option<&'e Overlay>,
    ) -> Self {
        let (table, _duplicates) = SymbolTable::build(program);
        Evaluator {
            program,
            interner,
            table,
            snapshot,
            overlay,
            view: View::Current,
            proforma: false,
            amount: None,
            eval_stack: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    pub fn run(&mut self) -> EvaluationResult {
        log::debug!(
            "evaluating {} statements against snapshot of {} fields",
            self.program.statements.len(),
            self.snapshot.fields.len()
        );
        let mut result = EvaluationResult::default();

        for stmt in &self.program.statements {
            self.reset_walk_state();
            match stmt {
                Stmt::Covenant(cov) => {
                    result.covenants.push(self.covenant_result(cov));
                }
                Stmt::Basket(basket) => {
                    result.baskets.push(self.basket_state(basket));
                }
                Stmt::Condition(cond) => {
                    result.conditions.push(self.condition_result(cond));
                }
                Stmt::Event(event) => {
                    result.events.push(self.event_status(event));
                }
                Stmt::Define(_) | Stmt::Prohibit(_) => {}
            }
        }

        if let Some(action) = self.overlay.and_then(|o| o.proposed_action.clone()) {
            let amount = match &action.currency {
                Some(code) => Value::currency(action.amount, code),
                None => Value::number(action.amount),
            };
            result.action = Some(self.decide(&action.action, amount));
        }

        result
    }

    fn reset_walk_state(&mut self) {
        self.view = View::Current;
        self.proforma = false;
        self.amount = None;
        self.eval_stack.clear();
        self.exclusions.clear();
    }

    // ── Covenants ───────────────────────────────────────────────────────

    fn covenant_result(&mut self, cov: &proviso_language::CovenantStmt<'_>) -> CovenantResult {
        let name = self.interner.resolve(cov.name).to_string();
        let mut result = CovenantResult {
            name: name.clone(),
            status: ComplianceStatus::Compliant,
            actual: None,
            threshold: None,
            operator: None,
            headroom: None,
            cure: None,
            error: None,
        };

        if let Some(req) = &cov.requires {
            result.operator = Some(req.op.symbol().to_string());
            match self.eval_comparison_sides(req.lhs, req.rhs) {
                Ok((lhs, rhs)) => match lhs.compare(req.op, &rhs) {
                    Ok(pass) => {
                        result.status = if pass {
                            ComplianceStatus::Compliant
                        } else {
                            ComplianceStatus::Breach
                        };
                        result.headroom = headroom(req.op, &lhs, &rhs);
                        result.actual = Some(lhs.rounded());
                        result.threshold = Some(rhs.rounded());
                    }
                    Err(e) => apply_error(&mut result.status, &mut result.error, e),
                },
                Err(e) => apply_error(&mut result.status, &mut result.error, e),
            }
        }

        if let Some(cure) = &cov.cure {
            let consumed = self
                .overlay
                .and_then(|o| o.cure_ledger.get(&name).copied())
                .unwrap_or(0);
            let uses_remaining = cure.max_uses.saturating_sub(consumed);
            let max_amount = cure
                .max_amount
                .and_then(|expr| self.eval_expr(expr).ok())
                .map(|v| v.rounded());
            result.cure = Some(CureAvailability {
                kind: self.interner.resolve(cure.kind).to_string(),
                max_uses: cure.max_uses,
                uses_remaining,
                max_amount,
                available: result.status == ComplianceStatus::Breach && uses_remaining > 0,
            });
        }

        log::debug!("covenant {}: {:?}", result.name, result.status);
        result
    }

    fn eval_comparison_sides(
        &mut self,
        lhs: &Expr<'_>,
        rhs: &Expr<'_>,
    ) -> Result<(Value, Value), EvalError> {
        let left = self.eval_expr(lhs)?;
        let right = self.eval_expr(rhs)?;
        Ok((left, right))
    }

    /// Boolean reading of a covenant, for `COMPLIANT(...)` and identifier
    /// resolution. A covenant without a requirement is vacuously
    /// compliant.
    fn covenant_passes(&mut self, index: usize, name: Symbol) -> Result<bool, EvalError> {
        let Stmt::Covenant(cov) = &self.program.statements[index] else {
            return Err(EvalError::UnresolvedField {
                name: self.interner.resolve(name).to_string(),
            });
        };
        self.enter(SymbolKind::Covenant, name)?;
        let outcome = match &cov.requires {
            Some(req) => {
                let (lhs, rhs) = self.eval_comparison_sides(req.lhs, req.rhs)?;
                lhs.compare(req.op, &rhs)
            }
            None => Ok(true),
        };
        self.leave();
        outcome
    }

    // ── Baskets ─────────────────────────────────────────────────────────

    fn basket_state(&mut self, basket: &proviso_language::BasketStmt<'_>) -> BasketState {
        let name = self.interner.resolve(basket.name).to_string();
        match self.basket_internal(basket) {
            Ok(internal) => BasketState {
                name,
                capacity: Some(internal.capacity.rounded()),
                used: round_half_even(internal.used),
                available: Some(internal.available.rounded()),
                maximum: internal.maximum.map(|m| m.rounded()),
                blocked_by: internal.blocked_by,
                error: None,
            },
            Err(e) => BasketState {
                name,
                capacity: None,
                used: 0.0,
                available: None,
                maximum: None,
                blocked_by: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    fn basket_internal(
        &mut self,
        basket: &proviso_language::BasketStmt<'_>,
    ) -> Result<BasketInternal, EvalError> {
        let name = self.interner.resolve(basket.name).to_string();

        let (capacity, maximum) = match &basket.shape {
            BasketShape::Fixed {
                capacity,
                plus,
                floor,
            } => {
                let mut total = self.eval_expr(capacity)?;
                for addition in plus {
                    total = total.add(&self.eval_expr(addition)?)?;
                }
                if let Some(floor) = floor {
                    let floor = self.eval_expr(floor)?;
                    total = total.max_of(&floor)?;
                }
                (total, None)
            }
            BasketShape::Builder {
                builds_from,
                starting,
                maximum,
            } => {
                let accrued = self.eval_expr(builds_from)?;
                let starting = match starting {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::number(0.0),
                };
                let mut total = starting.add(&accrued)?;
                let maximum = match maximum {
                    Some(expr) => Some(self.eval_expr(expr)?),
                    None => None,
                };
                if let Some(max) = &maximum {
                    total = total.min_of(max)?;
                }
                (total, maximum)
            }
        };

        let used = self
            .snapshot
            .basket_usage
            .get(&name)
            .copied()
            .unwrap_or(0.0);

        // SUBJECT TO gating: every referenced condition must hold, or the
        // basket cannot be drawn at all.
        let mut blocked_by = Vec::new();
        for cond_name in &basket.subject_to {
            match self.condition_value(*cond_name) {
                Ok(true) => {}
                Ok(false) => blocked_by.push(self.interner.resolve(*cond_name).to_string()),
                Err(e) => return Err(e),
            }
        }

        let available = if blocked_by.is_empty() {
            // Clamp at zero and at the maximum.
            let used_value = match capacity.currency_code() {
                Some(code) => Value::currency(used, code),
                None => Value::number(used),
            };
            let mut remaining = capacity.sub(&used_value)?;
            let zero = match capacity.currency_code() {
                Some(code) => Value::currency(0.0, code),
                None => Value::number(0.0),
            };
            remaining = remaining.max_of(&zero)?;
            if let Some(max) = &maximum {
                remaining = remaining.min_of(max)?;
            }
            remaining
        } else {
            match capacity.currency_code() {
                Some(code) => Value::currency(0.0, code),
                None => Value::number(0.0),
            }
        };

        Ok(BasketInternal {
            capacity,
            used,
            available,
            maximum,
            blocked_by,
        })
    }

    // ── Conditions ──────────────────────────────────────────────────────

    fn condition_result(&mut self, cond: &proviso_language::ConditionStmt<'_>) -> ConditionResult {
        let name = self.interner.resolve(cond.name).to_string();
        match self.eval_expr(cond.body) {
            Ok(value) => {
                let mut trace = Vec::new();
                self.explain(cond.body, &mut trace);
                ConditionResult {
                    name,
                    value: Some(value.is_truthy()),
                    trace,
                    error: None,
                }
            }
            Err(e) => ConditionResult {
                name,
                value: None,
                trace: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    /// Boolean reading of a declared condition by name.
    fn condition_value(&mut self, name: Symbol) -> Result<bool, EvalError> {
        match self.table.lookup(SymbolKind::Condition, name) {
            Some(index) => {
                let Stmt::Condition(cond) = &self.program.statements[index] else {
                    return Err(EvalError::UnresolvedField {
                        name: self.interner.resolve(name).to_string(),
                    });
                };
                self.enter(SymbolKind::Condition, name)?;
                let value = self.eval_expr(cond.body);
                self.leave();
                Ok(value?.is_truthy())
            }
            // Conditions referenced by name but supplied as snapshot data.
            None => Ok(self.resolve_ident(name)?.is_truthy()),
        }
    }

    /// Builds the proof trace: logical nodes recurse, leaves render with
    /// their evaluated outcome.
    fn explain(&mut self, expr: &Expr<'_>, trace: &mut Vec<String>) {
        match expr {
            Expr::Logical { left, right, .. } => {
                self.explain(left, trace);
                self.explain(right, trace);
            }
            other => {
                if let Ok(value) = self.eval_expr(other) {
                    trace.push(format!(
                        "{} = {}",
                        render_expr(other, self.interner),
                        value.display()
                    ));
                }
            }
        }
    }

    // ── Events ──────────────────────────────────────────────────────────

    fn event_status(&mut self, event: &proviso_language::EventStmt<'_>) -> EventStatus {
        let name = self.interner.resolve(event.name).to_string();
        let consequence = event
            .consequence
            .map(|c| self.interner.resolve(c).to_string());

        match self.eval_expr(event.trigger) {
            Ok(value) => {
                let triggered = value.is_truthy();
                let grace_elapsed = match event.grace_days {
                    Some(days) => {
                        let elapsed = self
                            .overlay
                            .and_then(|o| o.elapsed_days.get(&name).copied())
                            .unwrap_or(0.0);
                        triggered && elapsed >= days
                    }
                    None => triggered,
                };
                EventStatus {
                    name,
                    triggered: Some(triggered),
                    grace_days: event.grace_days,
                    grace_elapsed: Some(grace_elapsed),
                    consequence,
                    error: None,
                }
            }
            Err(e) => EventStatus {
                name,
                triggered: None,
                grace_days: event.grace_days,
                grace_elapsed: None,
                consequence,
                error: Some(e.to_string()),
            },
        }
    }

    // ── Prohibitions ────────────────────────────────────────────────────

    pub fn decide(&mut self, action: &str, amount: Value) -> ActionDecision {
        self.reset_walk_state();
        let prohibit = self.program.statements.iter().find_map(|stmt| match stmt {
            Stmt::Prohibit(pro) if self.interner.resolve(pro.target) == action => Some(pro),
            _ => None,
        });

        let Some(prohibit) = prohibit else {
            // Nothing in the agreement restricts this action.
            return ActionDecision {
                action: action.to_string(),
                amount,
                permitted: true,
                exception_path: None,
                prohibited_by_agreement: false,
                error: None,
            };
        };

        self.amount = Some(amount.clone());
        let mut first_error: Option<EvalError> = None;

        for exception in &prohibit.exceptions {
            match self.exception_permits(exception, &amount) {
                Ok(Some(path)) => {
                    self.amount = None;
                    return ActionDecision {
                        action: action.to_string(),
                        amount,
                        permitted: true,
                        exception_path: Some(path),
                        prohibited_by_agreement: true,
                        error: None,
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        self.amount = None;
        ActionDecision {
            action: action.to_string(),
            amount,
            permitted: false,
            exception_path: None,
            prohibited_by_agreement: true,
            error: first_error.map(|e| e.to_string()),
        }
    }

    /// Returns the rendered exception path when the exception permits the
    /// proposed action.
    fn exception_permits(
        &mut self,
        exception: &Exception<'_>,
        amount: &Value,
    ) -> Result<Option<String>, EvalError> {
        match exception {
            Exception::When { conditions, .. } => {
                for condition in conditions {
                    if !self.eval_expr(condition)?.is_truthy() {
                        return Ok(None);
                    }
                }
                let parts: Vec<String> = conditions
                    .iter()
                    .map(|c| render_expr(c, self.interner))
                    .collect();
                Ok(Some(parts.join(" AND ")))
            }
            Exception::Basket { name, .. } => {
                let index = self.table.lookup(SymbolKind::Basket, *name).ok_or_else(|| {
                    EvalError::UnresolvedField {
                        name: self.interner.resolve(*name).to_string(),
                    }
                })?;
                let Stmt::Basket(basket) = &self.program.statements[index] else {
                    return Ok(None);
                };
                let internal = self.basket_internal(basket)?;
                if amount.compare(proviso_language::CompareOp::LtEq, &internal.available)? {
                    Ok(Some(format!(
                        "AVAILABLE({})",
                        self.interner.resolve(*name)
                    )))
                } else {
                    Ok(None)
                }
            }
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn eval_expr(&mut self, expr: &Expr<'_>) -> Result<Value, EvalError> {
        match expr {
            Expr::Number { value, .. } => Ok(Value::number(*value)),
            Expr::Currency { value, code, .. } => Ok(Value::currency(
                *value,
                self.interner.resolve(*code),
            )),
            Expr::Percent { value, .. } => Ok(Value::Percent { value: *value }),
            Expr::Ratio { value, .. } => Ok(Value::Ratio { value: *value }),
            Expr::Ident { name, .. } => self.resolve_ident(*name),
            Expr::Binary {
                op, left, right, ..
            } => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                match op {
                    proviso_language::BinaryOp::Add => lhs.add(&rhs),
                    proviso_language::BinaryOp::Sub => lhs.sub(&rhs),
                    proviso_language::BinaryOp::Mul => lhs.mul(&rhs),
                    proviso_language::BinaryOp::Div => lhs.div(&rhs),
                }
            }
            Expr::Logical {
                op, left, right, ..
            } => {
                let lhs = self.eval_expr(left)?.is_truthy();
                let value = match op {
                    LogicalOp::And => lhs && self.eval_expr(right)?.is_truthy(),
                    LogicalOp::Or => lhs || self.eval_expr(right)?.is_truthy(),
                };
                Ok(Value::Bool { value })
            }
            Expr::Unary { op, operand, .. } => {
                let value = self.eval_expr(operand)?;
                match op {
                    UnaryOp::Neg => value.neg(),
                    UnaryOp::Not => Ok(Value::Bool {
                        value: !value.is_truthy(),
                    }),
                }
            }
            Expr::Compare {
                op, left, right, ..
            } => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                Ok(Value::Bool {
                    value: lhs.compare(*op, &rhs)?,
                })
            }
            Expr::Call { func, args, .. } => self.eval_call(*func, args),
            Expr::Trailing { inner, .. } => {
                if self.snapshot.trailing.is_none() {
                    return Err(EvalError::MissingView {
                        view: "trailing-twelve-months",
                    });
                }
                let saved = self.view;
                self.view = View::Trailing;
                let result = self.eval_expr(inner);
                self.view = saved;
                result
            }
        }
    }

    fn eval_call(&mut self, func: Func, args: &[&Expr<'_>]) -> Result<Value, EvalError> {
        match func {
            Func::Available => {
                let name = self.named_arg(args)?;
                let index = self.table.lookup(SymbolKind::Basket, name).ok_or_else(|| {
                    EvalError::UnresolvedField {
                        name: self.interner.resolve(name).to_string(),
                    }
                })?;
                let Stmt::Basket(basket) = &self.program.statements[index] else {
                    return Err(EvalError::UnresolvedField {
                        name: self.interner.resolve(name).to_string(),
                    });
                };
                self.enter(SymbolKind::Basket, name)?;
                let internal = self.basket_internal(basket);
                self.leave();
                Ok(internal?.available)
            }
            Func::Compliant => {
                let name = self.named_arg(args)?;
                let index = self
                    .table
                    .lookup(SymbolKind::Covenant, name)
                    .ok_or_else(|| EvalError::UnresolvedField {
                        name: self.interner.resolve(name).to_string(),
                    })?;
                Ok(Value::Bool {
                    value: self.covenant_passes(index, name)?,
                })
            }
            Func::Exists => {
                let name = self.named_arg(args)?;
                let text = self.interner.resolve(name).to_string();
                let live = match self.table.lookup(SymbolKind::Event, name) {
                    Some(index) => {
                        let Stmt::Event(event) = &self.program.statements[index] else {
                            return Err(EvalError::UnresolvedField { name: text });
                        };
                        self.enter(SymbolKind::Event, name)?;
                        let fired = self.eval_expr(event.trigger);
                        self.leave();
                        fired?.is_truthy() || self.snapshot.active_states.contains(&text)
                    }
                    // Predefined states and anything else consult the
                    // active-state set; unknown names answer false.
                    None => self.snapshot.active_states.contains(&text),
                };
                Ok(Value::Bool { value: live })
            }
            Func::GreaterOf => {
                let a = self.eval_expr(args[0])?;
                let b = self.eval_expr(args[1])?;
                a.max_of(&b)
            }
            Func::LesserOf => {
                let a = self.eval_expr(args[0])?;
                let b = self.eval_expr(args[1])?;
                a.min_of(&b)
            }
            Func::Not => {
                let value = self.eval_expr(args[0])?;
                Ok(Value::Bool {
                    value: !value.is_truthy(),
                })
            }
            Func::ProForma => {
                let saved = self.proforma;
                self.proforma = true;
                let result = self.eval_expr(args[0]);
                self.proforma = saved;
                result
            }
            Func::Sum => {
                if self.snapshot.periods.is_empty() {
                    return Err(EvalError::MissingView {
                        view: "period series",
                    });
                }
                let saved = self.view;
                let mut total = Ok(Value::number(0.0));
                for i in 0..self.snapshot.periods.len() {
                    self.view = View::Period(i);
                    let period_value = self.eval_expr(args[0]);
                    total = total.and_then(|t| t.add(&period_value?));
                    if total.is_err() {
                        break;
                    }
                }
                self.view = saved;
                total
            }
        }
    }

    /// `AVAILABLE`/`COMPLIANT`/`EXISTS` take a bare name; the validator
    /// guarantees it, this is the runtime backstop.
    fn named_arg(&self, args: &[&Expr<'_>]) -> Result<Symbol, EvalError> {
        match args.first() {
            Some(Expr::Ident { name, .. }) => Ok(*name),
            _ => Err(EvalError::TypeMismatch {
                wanted: "a name argument",
                found: "expression",
            }),
        }
    }

    fn resolve_ident(&mut self, name: Symbol) -> Result<Value, EvalError> {
        // Excluded components of the enclosing definition read as zero.
        if let Some(frame) = self.exclusions.last() {
            if frame.contains(&name) {
                return Ok(Value::number(0.0));
            }
        }

        if let Some(index) = self.table.lookup(SymbolKind::Define, name) {
            return self.eval_define(index, name);
        }

        if self.table.lookup(SymbolKind::Condition, name).is_some() {
            return Ok(Value::Bool {
                value: self.condition_value(name)?,
            });
        }

        if let Some(index) = self.table.lookup(SymbolKind::Covenant, name) {
            return Ok(Value::Bool {
                value: self.covenant_passes(index, name)?,
            });
        }

        if name == Symbol::AMOUNT {
            if let Some(amount) = &self.amount {
                return Ok(amount.clone());
            }
        }

        self.field_value(name)
    }

    fn eval_define(&mut self, index: usize, name: Symbol) -> Result<Value, EvalError> {
        let Stmt::Define(def) = &self.program.statements[index] else {
            return Err(EvalError::UnresolvedField {
                name: self.interner.resolve(name).to_string(),
            });
        };

        self.enter(SymbolKind::Define, name)?;
        self.exclusions
            .push(def.excluding.iter().copied().collect());
        let value = self.eval_expr(def.body);
        self.exclusions.pop();

        // The cap evaluates outside the exclusion frame but still inside
        // the cycle-detection frame, so `DEFINE X AS Y CAP X` reports a
        // cycle instead of recursing.
        let result = value.and_then(|v| match def.cap {
            Some(cap) => {
                let cap = self.eval_expr(cap)?;
                v.min_of(&cap)
            }
            None => Ok(v),
        });
        self.leave();
        result
    }

    fn field_value(&self, name: Symbol) -> Result<Value, EvalError> {
        let text = self.interner.resolve(name);
        let map = match self.view {
            View::Current => &self.snapshot.fields,
            View::Trailing => self.snapshot.trailing.as_ref().ok_or(EvalError::MissingView {
                view: "trailing-twelve-months",
            })?,
            View::Period(i) => &self.snapshot.periods[i],
        };
        let base = map
            .get(text)
            .copied()
            .ok_or_else(|| EvalError::UnresolvedField {
                name: text.to_string(),
            })?;
        let value = if self.proforma {
            let delta = self
                .overlay
                .and_then(|o| o.adjustments.get(text).copied())
                .unwrap_or(0.0);
            base + delta
        } else {
            base
        };
        Ok(Value::number(value))
    }

    // ── Cycle bookkeeping ───────────────────────────────────────────────

    fn enter(&mut self, kind: SymbolKind, name: Symbol) -> Result<(), EvalError> {
        if self.eval_stack.contains(&(kind, name)) {
            let mut path: Vec<String> = self
                .eval_stack
                .iter()
                .map(|(_, n)| self.interner.resolve(*n).to_string())
                .collect();
            path.push(self.interner.resolve(name).to_string());
            return Err(EvalError::Cycle { path });
        }
        self.eval_stack.push((kind, name));
        Ok(())
    }

    fn leave(&mut self) {
        self.eval_stack.pop();
    }
}

struct BasketInternal {
    capacity: Value,
    used: f64,
    available: Value,
    maximum: Option<Value>,
    blocked_by: Vec<String>,
}

/// Signed distance to breach in the operator's direction: positive while
/// compliant, negative once breached. Equality operators have no
/// meaningful direction.
fn headroom(
    op: proviso_language::CompareOp,
    lhs: &Value,
    rhs: &Value,
) -> Option<f64> {
    use proviso_language::CompareOp;
    let left = lhs.scalar().ok()?;
    let right = rhs.scalar().ok()?;
    match op {
        CompareOp::LtEq | CompareOp::Lt => Some(round_half_even(right - left)),
        CompareOp::GtEq | CompareOp::Gt => Some(round_half_even(left - right)),
        CompareOp::Eq | CompareOp::NotEq => None,
    }
}

fn apply_error(status: &mut ComplianceStatus, slot: &mut Option<String>, e: EvalError) {
    *status = if e.is_unknown_data() {
        ComplianceStatus::UnknownData
    } else {
        ComplianceStatus::ComputationError
    };
    *slot = Some(e.to_string());
}
