// ============================================================
// COLUMN CLASSIFIER
// ============================================================
// Numeric / text / convertible-text classification per column, driven by
// the normalizer's success ratio.

use crate::domain::table::{CellValue, ColumnInfo, ColumnKind, StructuredTable};
use crate::infrastructure::numeric::normalize;

/// Minimum fraction of non-blank values that must parse as numeric for a
/// text column to count as convertible.
pub const CONVERTIBLE_RATIO: f64 = 0.5;

/// How many sample values each column summary carries.
pub const SAMPLE_LIMIT: usize = 5;

pub fn classify_table(table: &StructuredTable) -> Vec<ColumnInfo> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<&CellValue> = table.column_values(idx).collect();
            classify_column(name, &values)
        })
        .collect()
}

pub fn classify_column(name: &str, values: &[&CellValue]) -> ColumnInfo {
    let non_null: Vec<&CellValue> = values
        .iter()
        .copied()
        .filter(|v| !matches!(v, CellValue::Empty))
        .collect();

    let uniformly_numeric = non_null.iter().all(|v| matches!(v, CellValue::Number(_)));

    if uniformly_numeric {
        return ColumnInfo {
            name: name.to_string(),
            kind: ColumnKind::Numeric,
            convertible: true,
            numeric_ratio: 1.0,
            sample_values: non_null
                .iter()
                .take(SAMPLE_LIMIT)
                .map(|v| v.format_brief())
                .collect(),
            non_null_count: non_null.len(),
        };
    }

    let non_blank = non_null.iter().filter(|v| !v.is_blank()).count();
    let parsed = values.iter().filter(|v| !normalize(v).is_nan()).count();

    let ratio = if non_blank == 0 {
        0.0
    } else {
        parsed as f64 / non_blank as f64
    };
    let ratio = (ratio * 100.0).round() / 100.0;
    let convertible = ratio >= CONVERTIBLE_RATIO;

    ColumnInfo {
        name: name.to_string(),
        kind: if convertible {
            ColumnKind::TextNumeric
        } else {
            ColumnKind::Text
        },
        convertible,
        numeric_ratio: ratio,
        sample_values: non_null
            .iter()
            .take(SAMPLE_LIMIT)
            .map(|v| match v {
                CellValue::Text(s) => s.clone(),
                other => other.format_brief(),
            })
            .collect(),
        non_null_count: non_null.len(),
    }
}
