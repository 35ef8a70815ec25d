// ============================================================
// REWRITE
// ============================================================
// Column conversion with the container preserved. Workbooks are patched
// part by part inside their zip; delimited files are rewritten from the
// structured table. Legacy containers are re-saved to xlsx first.

pub mod delimited;
mod sheet_package;
mod sheet_patch;
mod styles;
mod xlsx_write;

pub use xlsx_write::write_values_xlsx;

use crate::domain::error::Result;
use crate::domain::source_format::SourceFormat;
use crate::domain::table::{CellValue, Numeric, RawGrid, RewriteReport};
use crate::infrastructure::grid::load_sheet_grid;
use crate::infrastructure::numeric;
use sheet_package::SheetPackage;
use sheet_patch::{CellAddress, CellEdit};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use styles::StyleTable;

/// Convert the selected columns of a workbook, dividing every parseable
/// value by `divisor`, and save the result to `output`. Cells outside the
/// selected columns, and unparseable cells inside them, keep their original
/// content and formatting.
pub fn rewrite_spreadsheet(
    source: &Path,
    output: &Path,
    format: SourceFormat,
    header_row: usize,
    columns: &[String],
    divisor: f64,
) -> Result<RewriteReport> {
    // Legacy containers go through a values-only xlsx first; their own
    // formatting cannot be carried across.
    let package_path: &Path = if format.needs_resave() {
        let grid = crate::infrastructure::grid::load_raw(source, format)?;
        xlsx_write::write_values_xlsx(output, &grid)?;
        output
    } else {
        source
    };

    let grid = load_sheet_grid(package_path)?;
    let header = header_names(&grid, header_row);

    let mut report = RewriteReport::default();
    let mut values: BTreeMap<CellAddress, f64> = BTreeMap::new();

    for name in columns {
        let Some(&col) = header.get(name.as_str()) else {
            report
                .errors
                .push(format!("Coluna \"{}\" não encontrada", name));
            continue;
        };

        let mut parsed_any = false;
        for row in header_row + 1..grid.row_count() {
            if let Numeric::Number(n) = numeric::normalize(grid.cell(row, col)) {
                values.insert((row as u32 + 1, col as u32), n / divisor);
                parsed_any = true;
            }
        }

        if parsed_any {
            report.converted_columns.push(name.clone());
        } else {
            report
                .errors
                .push(format!("Nenhum valor numérico encontrado em \"{}\"", name));
        }
    }

    let mut package = SheetPackage::open(package_path)?;
    let sheet_part = package.first_worksheet_part()?;

    let edits = plan_edits(&mut package, &sheet_part, values)?;
    if !edits.is_empty() {
        let sheet_xml = package
            .part(&sheet_part)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        let (patched, formula_removed) = sheet_patch::patch_worksheet(&sheet_xml, &edits)?;
        package.set_part(&sheet_part, patched);

        if formula_removed {
            // Cached results referencing the dropped formula are stale now.
            package.remove_part("xl/calcChain.xml");
            if let Some(workbook) = package.part("xl/workbook.xml") {
                let updated = sheet_patch::ensure_full_calc_on_load(workbook)?;
                package.set_part("xl/workbook.xml", updated);
            }
        }
    }

    package.save(output)?;
    Ok(report)
}

/// Column names of the header row the way the structured loader names them,
/// mapped to 0-based column positions. Duplicates resolve to the last one.
fn header_names(grid: &RawGrid, header_row: usize) -> HashMap<String, usize> {
    let header = grid.row(header_row).unwrap_or(&[]);
    let mut map = HashMap::new();
    for idx in 0..grid.column_count() {
        let name = header
            .get(idx)
            .and_then(CellValue::display_string)
            .unwrap_or_else(|| format!("Unnamed: {}", idx));
        map.insert(name, idx);
    }
    map
}

/// Turn planned values into cell edits, deriving a two-decimal number
/// format for cells that rendered as General so divided values do not show
/// as long fractions.
fn plan_edits(
    package: &mut SheetPackage,
    sheet_part: &str,
    values: BTreeMap<CellAddress, f64>,
) -> Result<BTreeMap<CellAddress, CellEdit>> {
    let targets: BTreeSet<CellAddress> = values.keys().copied().collect();
    let existing_styles = match package.part(sheet_part) {
        Some(sheet_xml) => sheet_patch::scan_cell_styles(sheet_xml, &targets)?,
        None => HashMap::new(),
    };

    let mut style_table = package
        .part("xl/styles.xml")
        .map(StyleTable::parse)
        .transpose()?;

    let mut edits = BTreeMap::new();
    for (address, value) in values {
        let current = existing_styles.get(&address).copied().flatten();
        let style_override = match style_table.as_mut() {
            Some(table) if table.is_general(current) => {
                Some(table.derived_two_decimals(current))
            }
            _ => None,
        };
        edits.insert(
            address,
            CellEdit {
                value,
                style_override,
            },
        );
    }

    if let Some(table) = style_table {
        if table.has_derived() {
            let styles_xml = package
                .part("xl/styles.xml")
                .map(<[u8]>::to_vec)
                .unwrap_or_default();
            package.set_part("xl/styles.xml", table.apply(&styles_xml)?);
        }
    }

    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn fixture_grid() -> RawGrid {
        RawGrid::new(vec![
            vec![text("Relatório de Vendas"), CellValue::Empty, CellValue::Empty],
            vec![text("Produto"), text("Preço"), text("Obs")],
            vec![text("A"), CellValue::Number(1500.0), text("ok")],
            vec![text("B"), text("R$ 2.500,00"), text("-")],
            vec![text("C"), text("sem preço"), CellValue::Empty],
        ])
    }

    #[test]
    fn converts_a_workbook_column_end_to_end() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("entrada.xlsx");
        let output = dir.path().join("convertido.xlsx");
        write_values_xlsx(&source, &fixture_grid()).unwrap();

        let report = rewrite_spreadsheet(
            &source,
            &output,
            SourceFormat::Xlsx,
            1,
            &["Preço".to_string()],
            1000.0,
        )
        .unwrap();

        assert_eq!(report.converted_columns, ["Preço"]);
        assert!(report.errors.is_empty());

        let result = load_sheet_grid(&output).unwrap();
        assert_eq!(result.cell(2, 1), &CellValue::Number(1.5));
        assert_eq!(result.cell(3, 1), &CellValue::Number(2.5));
        // Unparseable text keeps its original content.
        assert_eq!(result.cell(4, 1), &text("sem preço"));
        // Neighboring columns and the header are untouched.
        assert_eq!(result.cell(1, 1), &text("Preço"));
        assert_eq!(result.cell(2, 2), &text("ok"));
    }

    #[test]
    fn untargeted_parts_survive_byte_identical() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("entrada.xlsx");
        let output = dir.path().join("convertido.xlsx");
        write_values_xlsx(&source, &fixture_grid()).unwrap();

        rewrite_spreadsheet(
            &source,
            &output,
            SourceFormat::Xlsx,
            1,
            &["Preço".to_string()],
            1000.0,
        )
        .unwrap();

        let before = SheetPackage::open(&source).unwrap();
        let after = SheetPackage::open(&output).unwrap();
        for part in ["[Content_Types].xml", "_rels/.rels", "xl/workbook.xml"] {
            assert_eq!(before.part(part), after.part(part), "{part} changed");
        }
        // The worksheet and styles are the only rewritten parts.
        assert_ne!(
            before.part("xl/worksheets/sheet1.xml"),
            after.part("xl/worksheets/sheet1.xml")
        );
    }

    #[test]
    fn reports_missing_and_non_numeric_columns() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("entrada.xlsx");
        let output = dir.path().join("convertido.xlsx");
        write_values_xlsx(&source, &fixture_grid()).unwrap();

        let report = rewrite_spreadsheet(
            &source,
            &output,
            SourceFormat::Xlsx,
            1,
            &["Inexistente".to_string(), "Obs".to_string()],
            1000.0,
        )
        .unwrap();

        assert!(report.converted_columns.is_empty());
        assert_eq!(
            report.errors,
            [
                "Coluna \"Inexistente\" não encontrada",
                "Nenhum valor numérico encontrado em \"Obs\""
            ]
        );
        // The output is still produced, byte-for-byte equivalent in content.
        assert!(output.exists());
    }
}
