// ============================================================
// LOAD TABLE USE CASE
// ============================================================
// Upload-time pipeline: raw grid, header detection, structure, column
// classification. The outcome is what the interface shows the user before
// any conversion happens.

use crate::domain::error::{AppError, Result};
use crate::domain::source_format::SourceFormat;
use crate::domain::table::{ColumnInfo, TablePreview};
use crate::infrastructure::{classify, grid, header};
use serde::Serialize;
use std::path::Path;

/// Rows shown in upload and conversion previews.
pub const PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    pub columns: Vec<String>,
    pub columns_info: Vec<ColumnInfo>,
    pub row_count: usize,
    pub header_row: usize,
    pub preview: TablePreview,
    pub filename: String,
}

pub fn load_table(path: &Path, format: SourceFormat, filename: &str) -> Result<LoadOutcome> {
    let raw = grid::load_raw(path, format)?;
    if raw.is_empty() {
        return Err(AppError::ValidationError("Arquivo vazio".to_string()));
    }
    let header_row = header::detect_header_row(&raw);
    let table = grid::build_structured(&raw, header_row);
    let columns_info = classify::classify_table(&table);

    Ok(LoadOutcome {
        columns: table.columns().to_vec(),
        columns_info,
        row_count: table.row_count(),
        header_row,
        preview: table.preview(PREVIEW_ROWS),
        filename: filename.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::ColumnKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_a_csv_with_decorative_rows_above_the_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vendas.csv");
        fs::write(
            &path,
            "Relatório de Vendas,,\n,,\nProduto,Preço,Obs\nA,1500,ok\nB,\"2.500,00\",ok\n",
        )
        .unwrap();

        let outcome = load_table(&path, SourceFormat::Csv, "vendas.csv").unwrap();

        assert_eq!(outcome.header_row, 2);
        assert_eq!(outcome.columns, ["Produto", "Preço", "Obs"]);
        assert_eq!(outcome.row_count, 2);
        assert_eq!(outcome.preview.len(), 2);
        assert_eq!(outcome.filename, "vendas.csv");

        let preco = &outcome.columns_info[1];
        assert!(preco.convertible);
        assert_eq!(preco.kind, ColumnKind::TextNumeric);
        let obs = &outcome.columns_info[2];
        assert!(!obs.convertible);
    }

    #[test]
    fn rejects_an_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vazio.csv");
        fs::write(&path, "").unwrap();

        let err = load_table(&path, SourceFormat::Csv, "vazio.csv").unwrap_err();
        assert!(matches!(err, crate::domain::error::AppError::ValidationError(_)));
    }
}
