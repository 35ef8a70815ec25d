// ============================================================
// GRID LOADER
// ============================================================
// Reads a source file into a headerless raw grid and, once the header row
// is known, into a structured table. Format decoding stays behind this
// boundary; everything above works on grids and tables only.

mod csv_loader;
mod sheet_loader;

pub use csv_loader::CsvGridLoader;
pub use sheet_loader::load_sheet_grid;

use crate::domain::error::Result;
use crate::domain::source_format::SourceFormat;
use crate::domain::table::{CellValue, RawGrid, StructuredTable};
use std::path::Path;

/// Load the raw, headerless grid for any supported container.
pub fn load_raw(path: &Path, format: SourceFormat) -> Result<RawGrid> {
    if format.is_delimited() {
        CsvGridLoader::open(path)?.load_raw(path)
    } else {
        load_sheet_grid(path)
    }
}

/// Load the structured table given a detected header row.
pub fn load_structured(
    path: &Path,
    format: SourceFormat,
    header_row: usize,
) -> Result<StructuredTable> {
    let grid = load_raw(path, format)?;
    Ok(build_structured(&grid, header_row))
}

/// Shape a raw grid into a structured table: the header row provides the
/// column names (blank header cells become `Unnamed: <idx>`), everything
/// below it becomes data rows.
pub fn build_structured(grid: &RawGrid, header_row: usize) -> StructuredTable {
    let width = grid.column_count();
    let header = grid.row(header_row).unwrap_or(&[]);

    let columns: Vec<String> = (0..width)
        .map(|idx| {
            header
                .get(idx)
                .and_then(CellValue::display_string)
                .unwrap_or_else(|| format!("Unnamed: {}", idx))
        })
        .collect();

    let rows: Vec<Vec<CellValue>> = grid
        .rows()
        .iter()
        .skip(header_row + 1)
        .cloned()
        .collect();

    StructuredTable::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn builds_table_below_header() {
        let grid = RawGrid::new(vec![
            vec![text("título"), CellValue::Empty],
            vec![text("Produto"), text("Preço")],
            vec![text("A"), CellValue::Number(10.0)],
        ]);
        let table = build_structured(&grid, 1);
        assert_eq!(table.columns(), ["Produto", "Preço"]);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn blank_header_cells_get_positional_names() {
        let grid = RawGrid::new(vec![
            vec![text("a"), CellValue::Empty, text("c")],
            vec![text("1"), text("2"), text("3")],
        ]);
        let table = build_structured(&grid, 0);
        assert_eq!(table.columns(), ["a", "Unnamed: 1", "c"]);
    }
}
