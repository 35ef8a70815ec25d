// ============================================================
// SHEET GRID LOADER
// ============================================================
// Spreadsheet reading via calamine: first sheet only, grid addressed from
// sheet row 1 so detected header indices map directly onto container rows.

use crate::domain::error::{AppError, Result};
use crate::domain::table::{CellValue, RawGrid};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

pub fn load_sheet_grid(path: &Path) -> Result<RawGrid> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::ParseError(format!("Erro ao ler arquivo: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::ParseError("Erro ao ler arquivo: planilha vazia".to_string()))?
        .map_err(|e| AppError::ParseError(format!("Erro ao ler arquivo: {}", e)))?;

    let (row_offset, col_offset) = match range.start() {
        Some((row, col)) => (row as usize, col as usize),
        None => return Ok(RawGrid::new(Vec::new())),
    };

    let mut rows: Vec<Vec<CellValue>> = Vec::with_capacity(row_offset + range.height());
    // Leading empty sheet rows keep absolute addressing intact.
    rows.resize_with(row_offset, Vec::new);

    for sheet_row in range.rows() {
        let mut row = Vec::with_capacity(col_offset + sheet_row.len());
        row.resize(col_offset, CellValue::Empty);
        row.extend(sheet_row.iter().map(convert_cell));
        rows.push(row);
    }

    Ok(RawGrid::new(rows))
}

fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        // Booleans behave as 0/1 the way spreadsheet formulas treat them.
        Data::Bool(b) => CellValue::Number(if *b { 1.0 } else { 0.0 }),
        Data::DateTime(_) => CellValue::Text(data.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}
