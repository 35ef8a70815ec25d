use serde::{Deserialize, Serialize};

/// A single grid position holding one value of unknown original type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// True for missing cells and for text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }

    /// String form used for header scoring and sample display.
    /// Numbers render the way `f64` displays (no trailing zeros).
    pub fn display_string(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    /// Preview/sample rendering: integers without a decimal point, other
    /// numbers to two decimal places, blanks as the empty string.
    pub fn format_brief(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number_brief(*n),
            CellValue::Text(s) => s.clone(),
        }
    }
}

pub(crate) fn format_number_brief(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{:.2}", n)
    }
}

/// Result of numeric normalization. A dedicated sum type instead of a float
/// NaN so "could not parse" never compares equal to anything by accident.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Number(f64),
    NotANumber,
}

impl Numeric {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Numeric::Number(n) => Some(n),
            Numeric::NotANumber => None,
        }
    }

    pub fn is_nan(self) -> bool {
        matches!(self, Numeric::NotANumber)
    }
}
