use serde::{Deserialize, Serialize};

/// Classification of a column's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Every non-null value is natively numeric.
    Numeric,
    /// Mostly free text; too few values parse as numbers.
    Text,
    /// Text that parses as numeric often enough to convert.
    TextNumeric,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::TextNumeric => write!(f, "text_numeric"),
        }
    }
}

/// Read-only per-column summary, recomputed on every load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
    pub convertible: bool,
    pub numeric_ratio: f64,
    pub sample_values: Vec<String>,
    pub non_null_count: usize,
}
