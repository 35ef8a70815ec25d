// ============================================================
// NUMERIC NORMALIZER
// ============================================================
// Total conversion of heterogeneous cell values into numbers.
// Handles "R$ 1.234,56", "1.234,56", "1234.56", "1,5", "850.000"...

use crate::domain::table::{CellValue, Numeric};
use once_cell::sync::Lazy;
use regex::Regex;

/// Currency markers and whitespace stripped before separator analysis.
static CURRENCY_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[R$€£US\s]").unwrap());

/// Normalize any cell value into a number or the not-a-number sentinel.
/// Never fails: the sentinel is the only error signal.
pub fn normalize(value: &CellValue) -> Numeric {
    match value {
        CellValue::Empty => Numeric::NotANumber,
        CellValue::Number(n) => {
            if n.is_finite() {
                Numeric::Number(*n)
            } else {
                Numeric::NotANumber
            }
        }
        CellValue::Text(s) => normalize_str(s),
    }
}

pub fn normalize_str(raw: &str) -> Numeric {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Numeric::NotANumber;
    }

    let cleaned = CURRENCY_CHARS.replace_all(trimmed, "").to_string();
    if cleaned.is_empty() {
        return Numeric::NotANumber;
    }

    let candidate = disambiguate_separators(&cleaned);
    match candidate.parse::<f64>() {
        Ok(n) if n.is_finite() => Numeric::Number(n),
        _ => Numeric::NotANumber,
    }
}

/// Decide which of `.` and `,` is the decimal point.
///
/// With both present the one appearing last wins; the other is a thousands
/// separator. A lone comma is decimal only for a fraction of at most two
/// digits ("1,5"), otherwise grouping ("1,234"). A lone dot is grouping when
/// it looks like European thousands notation ("850.000") or repeats.
fn disambiguate_separators(cleaned: &str) -> String {
    let has_comma = cleaned.contains(',');
    let has_dot = cleaned.contains('.');

    if has_comma && has_dot {
        let last_comma = cleaned.rfind(',').unwrap_or(0);
        let last_dot = cleaned.rfind('.').unwrap_or(0);
        if last_comma > last_dot {
            cleaned.replace('.', "").replace(',', ".")
        } else {
            cleaned.replace(',', "")
        }
    } else if has_comma {
        let parts: Vec<&str> = cleaned.split(',').collect();
        if parts.len() == 2 && parts[1].chars().count() <= 2 {
            cleaned.replace(',', ".")
        } else {
            cleaned.replace(',', "")
        }
    } else if has_dot {
        let parts: Vec<&str> = cleaned.split('.').collect();
        if parts.len() == 2
            && parts[1].chars().count() == 3
            && parts[0].chars().count() <= 3
        {
            cleaned.replace('.', "")
        } else if parts.len() > 2 {
            cleaned.replace('.', "")
        } else {
            cleaned.to_string()
        }
    } else {
        cleaned.to_string()
    }
}
