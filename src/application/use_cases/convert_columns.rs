// ============================================================
// CONVERT COLUMNS USE CASE
// ============================================================
// Runs the rewrite for a session's current file and reloads the result so
// the response preview reflects the converted output, not the upload.

use super::load_table::PREVIEW_ROWS;
use crate::domain::error::{AppError, Result};
use crate::domain::session::{OutputArtifact, SessionContext};
use crate::domain::source_format::SourceFormat;
use crate::domain::table::{ConversionOutcome, ConversionRequest};
use crate::infrastructure::{grid, rewrite};
use std::path::Path;

const OUTPUT_PREFIX: &str = "convertido_";

pub fn convert_columns(
    session: &mut SessionContext,
    session_dir: &Path,
    request: &ConversionRequest,
) -> Result<ConversionOutcome> {
    if request.columns.is_empty() {
        return Err(AppError::ValidationError(
            "Nenhuma coluna selecionada".to_string(),
        ));
    }

    let output_filename = output_filename(&session.original_filename, session.format);
    let output_path = session_dir.join(&output_filename);

    let report = if session.format.is_delimited() {
        let mut table =
            grid::load_structured(&session.source_path, session.format, session.header_row)?;
        let report = rewrite::delimited::rewrite(&mut table, &request.columns, request.divisor);
        rewrite::delimited::write_table(&output_path, &table)?;
        report
    } else {
        rewrite::rewrite_spreadsheet(
            &session.source_path,
            &output_path,
            session.format,
            session.header_row,
            &request.columns,
            request.divisor,
        )?
    };

    // The CSV writer emits the header as row 0; workbooks keep their layout.
    let (output_format, output_header) = if session.format.is_delimited() {
        (SourceFormat::Csv, 0)
    } else {
        (SourceFormat::Xlsx, session.header_row)
    };
    let table = grid::load_structured(&output_path, output_format, output_header)?;

    session.output = Some(OutputArtifact {
        path: output_path,
        filename: output_filename.clone(),
    });

    Ok(ConversionOutcome {
        // Partial success: the operation completing is success; columns that
        // failed are reported through `errors`, not by flipping this flag.
        success: true,
        converted_columns: report.converted_columns,
        errors: report.errors,
        preview: table.preview(PREVIEW_ROWS),
        columns: table.columns().to_vec(),
        row_count: table.row_count(),
        output_filename,
    })
}

/// Delimited files keep their name; workbook output is always xlsx, even
/// when the upload was a legacy container.
fn output_filename(original: &str, format: SourceFormat) -> String {
    if format.is_delimited() {
        format!("{}{}", OUTPUT_PREFIX, original)
    } else {
        let stem = Path::new(original)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("arquivo");
        format!("{}{}.xlsx", OUTPUT_PREFIX, stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::{CellValue, RawGrid};
    use crate::infrastructure::rewrite::write_values_xlsx;
    use serde_json::Value;
    use std::fs;
    use tempfile::tempdir;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn converts_a_csv_session_end_to_end() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("current_file.csv");
        fs::write(&source, "Produto,Preço\nA,1500\nB,\"R$ 2.500,00\"\n").unwrap();

        let mut session = SessionContext::new(
            source,
            SourceFormat::Csv,
            "vendas.csv".to_string(),
            0,
        );
        let request = ConversionRequest {
            columns: vec!["Preço".to_string()],
            divisor: 1000.0,
        };

        let outcome = convert_columns(&mut session, dir.path(), &request).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.converted_columns, ["Preço"]);
        assert_eq!(outcome.output_filename, "convertido_vendas.csv");
        assert_eq!(outcome.preview[0]["Preço"], Value::String("1.50".into()));
        assert_eq!(outcome.preview[1]["Preço"], Value::String("2.50".into()));
        assert!(session.output.is_some());
        assert!(dir.path().join("convertido_vendas.csv").exists());
    }

    #[test]
    fn converts_a_workbook_session_with_header_offset() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("current_file.xlsx");
        let grid = RawGrid::new(vec![
            vec![text("Tabela de Preços"), CellValue::Empty],
            vec![text("Produto"), text("Preço")],
            vec![text("A"), CellValue::Number(1500.0)],
        ]);
        write_values_xlsx(&source, &grid).unwrap();

        let mut session = SessionContext::new(
            source,
            SourceFormat::Xlsx,
            "precos.xlsx".to_string(),
            1,
        );
        let request = ConversionRequest {
            columns: vec!["Preço".to_string()],
            divisor: 1000.0,
        };

        let outcome = convert_columns(&mut session, dir.path(), &request).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.output_filename, "convertido_precos.xlsx");
        assert_eq!(outcome.columns, ["Produto", "Preço"]);
        assert_eq!(outcome.preview[0]["Preço"], Value::String("1.50".into()));
    }

    #[test]
    fn completed_run_with_only_failed_columns_still_succeeds() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("current_file.csv");
        fs::write(&source, "Produto,Preço\nA,1500\n").unwrap();

        let mut session = SessionContext::new(
            source,
            SourceFormat::Csv,
            "vendas.csv".to_string(),
            0,
        );
        let request = ConversionRequest {
            columns: vec!["Inexistente".to_string()],
            divisor: 1000.0,
        };

        let outcome = convert_columns(&mut session, dir.path(), &request).unwrap();

        assert!(outcome.success);
        assert!(outcome.converted_columns.is_empty());
        assert_eq!(outcome.errors, ["Coluna \"Inexistente\" não encontrada"]);
    }

    #[test]
    fn rejects_an_empty_column_selection() {
        let dir = tempdir().unwrap();
        let mut session = SessionContext::new(
            dir.path().join("x.csv"),
            SourceFormat::Csv,
            "x.csv".to_string(),
            0,
        );
        let request = ConversionRequest {
            columns: vec![],
            divisor: 1000.0,
        };

        let err = convert_columns(&mut session, dir.path(), &request).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
