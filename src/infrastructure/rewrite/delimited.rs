// ============================================================
// DELIMITED REWRITER
// ============================================================
// In-memory conversion for CSV tables. The table is mutated column by
// column and serialized back out comma-delimited in UTF-8, which is also
// how re-encoded legacy inputs leave the system.

use crate::domain::error::{AppError, Result};
use crate::domain::table::{CellValue, Numeric, RewriteReport, StructuredTable};
use crate::infrastructure::numeric;
use std::path::Path;

/// Divide every parseable value of the selected columns in place. Unknown
/// columns are reported without aborting the remaining ones.
pub fn rewrite(table: &mut StructuredTable, columns: &[String], divisor: f64) -> RewriteReport {
    let mut report = RewriteReport::default();

    for name in columns {
        let Some(index) = table.column_index(name) else {
            report
                .errors
                .push(format!("Coluna \"{}\" não encontrada", name));
            continue;
        };

        for row in table.rows_mut() {
            if let Some(cell) = row.get_mut(index) {
                match numeric::normalize(cell) {
                    Numeric::Number(n) => *cell = CellValue::Number(n / divisor),
                    Numeric::NotANumber => {
                        if !cell.is_blank() {
                            *cell = CellValue::Empty;
                        }
                    }
                }
            }
        }
        report.converted_columns.push(name.clone());
    }

    report
}

/// Write the table comma-delimited, numbers in machine form and blanks as
/// empty fields.
pub fn write_table(path: &Path, table: &StructuredTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::IoError(format!("Erro ao gravar arquivo: {}", e)))?;

    writer
        .write_record(table.columns())
        .map_err(|e| AppError::IoError(format!("Erro ao gravar arquivo: {}", e)))?;

    for row in table.rows() {
        let record: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                CellValue::Empty => String::new(),
                CellValue::Number(n) => n.to_string(),
                CellValue::Text(s) => s.clone(),
            })
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| AppError::IoError(format!("Erro ao gravar arquivo: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::IoError(format!("Erro ao gravar arquivo: {}", e)))?;
    Ok(())
}
