//! Runtime values and unit-aware arithmetic.
//!
//! All arithmetic runs in double precision. Units follow the agreement's
//! conventions: currency amounts keep their ISO code and refuse to mix
//! codes, percentages scale by 0.01 when they enter arithmetic, ratios
//! are bare scalars, and a ratio never compares against a percentage.
//! Final outputs round to four decimals with banker's rounding.

use serde::Serialize;

use proviso_language::CompareOp;

/// A value produced during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Value {
    Number { value: f64 },
    Currency { amount: f64, code: String },
    /// The written percentage figure: `Percent { value: 15.0 }` is 15%.
    Percent { value: f64 },
    Ratio { value: f64 },
    Bool { value: bool },
}

impl Value {
    pub fn number(value: f64) -> Value {
        Value::Number { value }
    }

    pub fn currency(amount: f64, code: &str) -> Value {
        Value::Currency {
            amount,
            code: code.to_string(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number { .. } => "number",
            Value::Currency { .. } => "currency",
            Value::Percent { .. } => "percentage",
            Value::Ratio { .. } => "ratio",
            Value::Bool { .. } => "boolean",
        }
    }

    /// The scalar magnitude used in arithmetic: percentages convert to
    /// their fraction, ratios and currency to their bare figure.
    pub fn scalar(&self) -> Result<f64, EvalError> {
        match self {
            Value::Number { value } => Ok(*value),
            Value::Currency { amount, .. } => Ok(*amount),
            Value::Percent { value } => Ok(value * 0.01),
            Value::Ratio { value } => Ok(*value),
            Value::Bool { .. } => Err(EvalError::TypeMismatch {
                wanted: "a numeric value",
                found: "boolean",
            }),
        }
    }

    /// Truthiness for boolean contexts: false, zero, and zero amounts are
    /// falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool { value } => *value,
            Value::Number { value } | Value::Ratio { value } | Value::Percent { value } => {
                *value != 0.0
            }
            Value::Currency { amount, .. } => *amount != 0.0,
        }
    }

    /// The ISO code when this is a currency amount.
    pub fn currency_code(&self) -> Option<&str> {
        match self {
            Value::Currency { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Rounds the carried figure to four decimals, banker's rounding.
    /// Applied to final outputs only; intermediates keep full precision.
    pub fn rounded(&self) -> Value {
        match self {
            Value::Number { value } => Value::Number {
                value: round_half_even(*value),
            },
            Value::Currency { amount, code } => Value::Currency {
                amount: round_half_even(*amount),
                code: code.clone(),
            },
            Value::Percent { value } => Value::Percent {
                value: round_half_even(*value),
            },
            Value::Ratio { value } => Value::Ratio {
                value: round_half_even(*value),
            },
            Value::Bool { .. } => self.clone(),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, EvalError> {
        self.additive(other, f64::add2)
    }

    pub fn sub(&self, other: &Value) -> Result<Value, EvalError> {
        self.additive(other, f64::sub2)
    }

    fn additive(&self, other: &Value, op: fn(f64, f64) -> f64) -> Result<Value, EvalError> {
        match (self.currency_code(), other.currency_code()) {
            (Some(a), Some(b)) if a != b => Err(EvalError::CurrencyMismatch {
                left: a.to_string(),
                right: b.to_string(),
            }),
            (Some(code), _) | (_, Some(code)) => Ok(Value::Currency {
                amount: op(self.scalar()?, other.scalar()?),
                code: code.to_string(),
            }),
            (None, None) => Ok(Value::Number {
                value: op(self.scalar()?, other.scalar()?),
            }),
        }
    }

    pub fn mul(&self, other: &Value) -> Result<Value, EvalError> {
        match (self.currency_code(), other.currency_code()) {
            (Some(_), Some(_)) => Err(EvalError::TypeMismatch {
                wanted: "at most one currency operand in a product",
                found: "currency * currency",
            }),
            (Some(code), None) | (None, Some(code)) => Ok(Value::Currency {
                amount: self.scalar()? * other.scalar()?,
                code: code.to_string(),
            }),
            (None, None) => Ok(Value::Number {
                value: self.scalar()? * other.scalar()?,
            }),
        }
    }

    pub fn div(&self, other: &Value) -> Result<Value, EvalError> {
        let divisor = other.scalar()?;
        if divisor == 0.0 {
            return Err(EvalError::DivideByZero);
        }
        match (self.currency_code(), other.currency_code()) {
            // Same-code currency over currency cancels to a bare ratio.
            (Some(a), Some(b)) => {
                if a != b {
                    Err(EvalError::CurrencyMismatch {
                        left: a.to_string(),
                        right: b.to_string(),
                    })
                } else {
                    Ok(Value::Number {
                        value: self.scalar()? / divisor,
                    })
                }
            }
            (Some(code), None) => Ok(Value::Currency {
                amount: self.scalar()? / divisor,
                code: code.to_string(),
            }),
            (None, Some(_)) => Err(EvalError::TypeMismatch {
                wanted: "a scalar divisor",
                found: "currency",
            }),
            (None, None) => Ok(Value::Number {
                value: self.scalar()? / divisor,
            }),
        }
    }

    pub fn neg(&self) -> Result<Value, EvalError> {
        match self {
            Value::Number { value } => Ok(Value::Number { value: -value }),
            Value::Currency { amount, code } => Ok(Value::Currency {
                amount: -amount,
                code: code.clone(),
            }),
            Value::Ratio { value } => Ok(Value::Ratio { value: -value }),
            Value::Percent { value } => Ok(Value::Percent { value: -value }),
            Value::Bool { .. } => Err(EvalError::TypeMismatch {
                wanted: "a numeric value",
                found: "boolean",
            }),
        }
    }

    /// Applies a comparison operator under the comparability matrix:
    /// currency only against same-code currency, ratio never against
    /// percentage, everything else through scalar magnitudes.
    pub fn compare(&self, op: CompareOp, other: &Value) -> Result<bool, EvalError> {
        match (self, other) {
            (Value::Currency { code: a, .. }, Value::Currency { code: b, .. }) if a != b => {
                return Err(EvalError::CurrencyMismatch {
                    left: a.clone(),
                    right: b.clone(),
                });
            }
            (Value::Ratio { .. }, Value::Percent { .. })
            | (Value::Percent { .. }, Value::Ratio { .. }) => {
                return Err(EvalError::TypeMismatch {
                    wanted: "comparable units",
                    found: "ratio vs percentage",
                });
            }
            _ => {}
        }
        let left = self.scalar()?;
        let right = other.scalar()?;
        Ok(match op {
            CompareOp::LtEq => left <= right,
            CompareOp::GtEq => left >= right,
            CompareOp::Lt => left < right,
            CompareOp::Gt => left > right,
            CompareOp::Eq => left == right,
            CompareOp::NotEq => left != right,
        })
    }

    /// Unit-aware maximum (used by `GreaterOf` and basket floors). When
    /// either side is a currency amount, the result stays a currency
    /// amount whichever side wins — `max($15,000,000, 15% * EBITDA)` is
    /// still money.
    pub fn max_of(&self, other: &Value) -> Result<Value, EvalError> {
        let winner = if self.compare(CompareOp::GtEq, other)? {
            self
        } else {
            other
        };
        self.reconcile_currency(other, winner)
    }

    /// Unit-aware minimum (used by `LesserOf` and caps).
    pub fn min_of(&self, other: &Value) -> Result<Value, EvalError> {
        let winner = if self.compare(CompareOp::LtEq, other)? {
            self
        } else {
            other
        };
        self.reconcile_currency(other, winner)
    }

    fn reconcile_currency(&self, other: &Value, winner: &Value) -> Result<Value, EvalError> {
        match (self.currency_code(), other.currency_code()) {
            (None, None) => Ok(winner.clone()),
            (Some(code), _) | (_, Some(code)) => Ok(Value::Currency {
                amount: winner.scalar()?,
                code: code.to_string(),
            }),
        }
    }

    /// Grouped-thousands display: `$25,000,000`, `4.5x`, `15%`.
    pub fn display(&self) -> String {
        match self {
            Value::Number { value } => format_grouped(*value),
            Value::Currency { amount, code } => {
                if code == "USD" {
                    format!("${}", format_grouped(*amount))
                } else {
                    format!("${} {}", format_grouped(*amount), code)
                }
            }
            Value::Percent { value } => format!("{}%", trim_decimal(*value)),
            Value::Ratio { value } => format!("{:.2}x", value),
            Value::Bool { value } => value.to_string(),
        }
    }
}

/// Arithmetic helpers named so they can be passed as fn pointers.
trait Arith {
    fn add2(a: f64, b: f64) -> f64;
    fn sub2(a: f64, b: f64) -> f64;
}

impl Arith for f64 {
    fn add2(a: f64, b: f64) -> f64 {
        a + b
    }
    fn sub2(a: f64, b: f64) -> f64 {
        a - b
    }
}

/// Four-decimal banker's rounding: ties go to the even neighbor.
pub fn round_half_even(x: f64) -> f64 {
    const SCALE: f64 = 10_000.0;
    let scaled = x * SCALE;
    let floor = scaled.floor();
    let diff = scaled - floor;
    // Tolerance absorbs the representation error of decimal inputs like
    // 0.00005, which land a few ulps off the exact halfway point.
    let rounded = if (diff - 0.5).abs() < 1e-9 {
        // Exactly halfway: pick the even neighbor.
        if (floor as i64) % 2 == 0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        scaled.round()
    };
    rounded / SCALE
}

/// Locale-independent grouped-thousands formatting with a period decimal.
pub fn format_grouped(value: f64) -> String {
    let negative = value < 0.0;
    let abs = value.abs();
    let whole = abs.trunc() as u64;
    let frac = abs.fract();

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if frac > 0.0 {
        // Up to four decimals, trailing zeros trimmed.
        let frac_str = format!("{:.4}", frac);
        let trimmed = frac_str.trim_start_matches("0.").trim_end_matches('0');
        if !trimmed.is_empty() {
            out.push('.');
            out.push_str(trimmed);
        }
    }
    out
}

fn trim_decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Evaluation failure for one entity. Never aborts the program-level run.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// An identifier resolved neither in the symbol table nor the snapshot.
    UnresolvedField { name: String },
    /// Binary operation over two different ISO codes.
    CurrencyMismatch { left: String, right: String },
    DivideByZero,
    /// `DEFINE` recursion, reported with the cycle path.
    Cycle { path: Vec<String> },
    /// Operand units the operation cannot take.
    TypeMismatch {
        wanted: &'static str,
        found: &'static str,
    },
    /// `TRAILING` without a trailing view, or `SUM` without a period
    /// series.
    MissingView { view: &'static str },
}

impl EvalError {
    /// `true` for failures that mean "data was not supplied" rather than
    /// "the program computed something invalid".
    pub fn is_unknown_data(&self) -> bool {
        matches!(
            self,
            EvalError::UnresolvedField { .. } | EvalError::MissingView { .. }
        )
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::UnresolvedField { name } => {
                write!(f, "unresolved data field '{}'", name)
            }
            EvalError::CurrencyMismatch { left, right } => {
                write!(f, "currency mismatch: {} vs {}", left, right)
            }
            EvalError::DivideByZero => write!(f, "division by zero"),
            EvalError::Cycle { path } => {
                write!(f, "definition cycle: {}", path.join(" -> "))
            }
            EvalError::TypeMismatch { wanted, found } => {
                write!(f, "type mismatch: wanted {}, found {}", wanted, found)
            }
            EvalError::MissingView { view } => {
                write!(f, "snapshot does not expose the {} view", view)
            }
        }
    }
}

impl std::error::Error for EvalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_scales_in_products() {
        let pct = Value::Percent { value: 15.0 };
        let ebitda = Value::currency(50_000_000.0, "USD");
        let result = pct.mul(&ebitda).unwrap();
        assert_eq!(result, Value::currency(7_500_000.0, "USD"));
    }

    #[test]
    fn currency_codes_must_match_in_addition() {
        let usd = Value::currency(100.0, "USD");
        let eur = Value::currency(100.0, "EUR");
        assert!(matches!(
            usd.add(&eur),
            Err(EvalError::CurrencyMismatch { .. })
        ));
        assert_eq!(
            usd.add(&Value::currency(50.0, "USD")).unwrap(),
            Value::currency(150.0, "USD")
        );
    }

    #[test]
    fn currency_over_currency_cancels_to_a_number() {
        let debt = Value::currency(400.0, "USD");
        let ebitda = Value::currency(100.0, "USD");
        assert_eq!(debt.div(&ebitda).unwrap(), Value::number(4.0));
    }

    #[test]
    fn divide_by_zero_is_an_error() {
        let a = Value::number(1.0);
        assert_eq!(a.div(&Value::number(0.0)), Err(EvalError::DivideByZero));
    }

    #[test]
    fn ratio_vs_percentage_comparison_errors() {
        let ratio = Value::Ratio { value: 4.5 };
        let pct = Value::Percent { value: 15.0 };
        assert!(matches!(
            ratio.compare(CompareOp::LtEq, &pct),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn ratio_compares_against_bare_numbers() {
        let leverage = Value::number(4.0);
        let threshold = Value::Ratio { value: 4.5 };
        assert!(leverage.compare(CompareOp::LtEq, &threshold).unwrap());
    }

    #[test]
    fn bankers_rounding_ties_to_even() {
        assert_eq!(round_half_even(0.00005), 0.0);
        assert_eq!(round_half_even(0.00015), 0.0002);
        assert_eq!(round_half_even(1.23456), 1.2346);
        assert_eq!(round_half_even(-2.5), -2.5);
    }

    #[test]
    fn grouped_formatting_is_locale_independent() {
        assert_eq!(format_grouped(25_000_000.0), "25,000,000");
        assert_eq!(format_grouped(1_234.5), "1,234.5");
        assert_eq!(format_grouped(999.0), "999");
        assert_eq!(format_grouped(-1_000.0), "-1,000");
    }

    #[test]
    fn display_keeps_iso_codes() {
        assert_eq!(Value::currency(15_000_000.0, "USD").display(), "$15,000,000");
        assert_eq!(
            Value::currency(10_000_000.0, "EUR").display(),
            "$10,000,000 EUR"
        );
        assert_eq!(Value::Ratio { value: 4.5 }.display(), "4.50x");
        assert_eq!(Value::Percent { value: 15.0 }.display(), "15%");
    }

    #[test]
    fn max_and_min_are_unit_aware() {
        let fixed = Value::currency(15_000_000.0, "USD");
        let grown = Value::currency(7_500_000.0, "USD");
        assert_eq!(fixed.max_of(&grown).unwrap(), fixed);
        assert_eq!(fixed.min_of(&grown).unwrap(), grown);
    }

    #[test]
    fn truthiness_follows_magnitude() {
        assert!(Value::number(5.0).is_truthy());
        assert!(!Value::number(0.0).is_truthy());
        assert!(!Value::Bool { value: false }.is_truthy());
        assert!(Value::currency(1.0, "USD").is_truthy());
    }
}
