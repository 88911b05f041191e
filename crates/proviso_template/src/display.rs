//! Shared display tables for document rendering.
//!
//! The form word templates, the prose renderer, and the drift suggester
//! all speak through these tables, so the same metric spells the same way
//! everywhere. Formatting is locale-independent: grouped thousands with
//! commas, period decimal.

use proviso_language::{CompareOp, Frequency};

/// `$25,000,000`; fractional cents kept to two decimals.
pub fn format_currency_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("${}", group_thousands(amount))
    } else {
        let whole = amount.trunc();
        let cents = ((amount - whole) * 100.0).round() as u64;
        format!("${}.{:02}", group_thousands(whole), cents)
    }
}

/// `15%` for whole figures, `4.5%` otherwise. Percentages are written as
/// integer percent everywhere in templates; evaluation converts.
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}%", value as i64)
    } else {
        format!("{}%", value)
    }
}

/// Code spelling of a ratio: `4.50x`.
pub fn format_ratio(value: f64) -> String {
    format!("{:.2}x", value)
}

/// Prose spelling of a ratio: `4.50 to 1.00`.
pub fn format_ratio_prose(value: f64) -> String {
    format!("{:.2} to 1.00", value)
}

/// `2026-07-15` → `July 15, 2026`. Inputs that are not ISO dates pass
/// through unchanged.
pub fn format_date_long(iso: &str) -> String {
    let mut parts = iso.splitn(3, '-');
    let (year, month, day) = match (parts.next(), parts.next(), parts.next()) {
        (Some(y), Some(m), Some(d)) => (y, m, d),
        _ => return iso.to_string(),
    };
    let month_name = match month {
        "01" => "January",
        "02" => "February",
        "03" => "March",
        "04" => "April",
        "05" => "May",
        "06" => "June",
        "07" => "July",
        "08" => "August",
        "09" => "September",
        "10" => "October",
        "11" => "November",
        "12" => "December",
        _ => return iso.to_string(),
    };
    let day = day.trim_start_matches('0');
    format!("{} {}, {}", month_name, day, year)
}

pub fn group_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let digits = format!("{}", value.abs().trunc() as u64);
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Display names for the metrics that recur in credit agreements. Unknown
/// names fall back to a camel-case split.
pub fn metric_display(name: &str) -> String {
    let known = match name {
        "EBITDA" => "Consolidated EBITDA",
        "AdjustedEBITDA" => "Consolidated Adjusted EBITDA",
        "TotalDebt" => "Consolidated Total Debt",
        "NetDebt" => "Consolidated Net Debt",
        "SeniorDebt" => "Consolidated Senior Debt",
        "Leverage" => "Consolidated Total Leverage Ratio",
        "SeniorLeverage" => "Consolidated Senior Leverage Ratio",
        "NetLeverage" => "Consolidated Net Leverage Ratio",
        "InterestCoverage" => "Consolidated Interest Coverage Ratio",
        "FixedChargeCoverage" => "Fixed Charge Coverage Ratio",
        "InterestExpense" => "Consolidated Interest Expense",
        "NetIncome" => "Consolidated Net Income",
        "CumulativeNetIncome" => "Cumulative Consolidated Net Income",
        "ExcessCashFlow" => "Excess Cash Flow",
        "Liquidity" => "Liquidity",
        "Revenue" => "Consolidated Revenue",
        "CapEx" => "Capital Expenditures",
        "TotalAssets" => "Consolidated Total Assets",
        _ => return split_camel_case(name),
    };
    known.to_string()
}

/// `RetainedExcessCash` → `Retained Excess Cash`; runs of capitals stay
/// together (`OtherECFAmount` → `Other ECF Amount`).
pub fn split_camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev_lower = chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            if prev_lower || (chars[i - 1].is_uppercase() && next_lower) {
                out.push(' ');
            }
        }
        if c == '_' {
            out.push(' ');
            continue;
        }
        out.push(c);
    }
    out
}

/// Prose comparison phrases for requirement sentences.
pub fn compare_phrase(op: CompareOp) -> &'static str {
    match op {
        CompareOp::LtEq => "does not exceed",
        CompareOp::Lt => "is less than",
        CompareOp::GtEq => "is not less than",
        CompareOp::Gt => "exceeds",
        CompareOp::Eq => "equals",
        CompareOp::NotEq => "does not equal",
    }
}

/// Testing-frequency phrases for covenant prose.
pub fn frequency_phrase(freq: Frequency) -> &'static str {
    match freq {
        Frequency::Quarterly => "as of the last day of each fiscal quarter",
        Frequency::Monthly => "as of the last day of each calendar month",
        Frequency::Annually => "as of the last day of each fiscal year",
        Frequency::SemiAnnually => "as of the last day of each semi-annual period",
    }
}

/// Operator words used by form enrichment (`operator_display`).
pub fn operator_display(op: &str) -> &'static str {
    match op {
        "<=" => "shall not exceed",
        "<" => "shall be less than",
        ">=" => "shall not be less than",
        ">" => "shall exceed",
        "=" => "shall equal",
        "!=" => "shall not equal",
        _ => "shall satisfy",
    }
}
