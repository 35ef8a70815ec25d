use super::TablePreview;
use serde::{Deserialize, Serialize};

fn default_divisor() -> f64 {
    1000.0
}

/// Columns to transform plus the divisor applied to every numeric value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub columns: Vec<String>,
    #[serde(default = "default_divisor")]
    pub divisor: f64,
}

/// What a rewriter reports back: which columns actually converted and the
/// per-column errors that did not abort the operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewriteReport {
    pub converted_columns: Vec<String>,
    pub errors: Vec<String>,
}

/// Full outcome of a Convert operation, preview included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub success: bool,
    pub converted_columns: Vec<String>,
    pub errors: Vec<String>,
    pub preview: TablePreview,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub output_filename: String,
}
