// ============================================================
// HEADER ROW DETECTOR
// ============================================================
// Scores the first rows of a raw grid as header candidates. Real headers
// mix short non-numeric labels with a reasonable fill and are usually
// followed by a row of numeric data.

use crate::domain::table::{CellValue, RawGrid};
use crate::infrastructure::numeric::normalize;
use once_cell::sync::Lazy;
use regex::Regex;

/// How many leading rows are considered as header candidates.
pub const MAX_SCAN_ROWS: usize = 15;

/// Labels at least this long score lower even when non-numeric.
pub const LONG_LABEL_LEN: usize = 60;

/// A candidate row must fill at least this fraction of the grid's columns.
pub const MIN_FILL_RATIO: f64 = 0.3;

/// A candidate row needs at least this many filled cells.
pub const MIN_FILLED_CELLS: usize = 2;

/// Score multiplier when the following row contains numeric data.
pub const DATA_LOOKAHEAD_BOOST: f64 = 1.5;

/// Cells matching only digits, separators, currency symbols and signs are
/// data, not labels.
static PURE_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9.,R$€£\s\-+%]+$").unwrap());

/// Returns the 0-based index of the most plausible header row. Defaults to
/// row 0 for empty grids and when no candidate qualifies.
pub fn detect_header_row(grid: &RawGrid) -> usize {
    if grid.is_empty() {
        return 0;
    }

    let num_cols = grid.column_count();
    let max_check = MAX_SCAN_ROWS.min(grid.row_count());

    let mut best_row = 0usize;
    let mut best_score = -1.0f64;

    for i in 0..max_check {
        let row = grid.row(i).unwrap_or(&[]);
        let mut score = 0u32;
        let mut filled = 0usize;

        for cell in row {
            let Some(text) = cell.display_string() else {
                continue;
            };
            filled += 1;

            let is_pure_number = PURE_NUMBER_PATTERN.is_match(&text);
            let is_short = text.chars().count() < LONG_LABEL_LEN;

            if !is_pure_number && is_short {
                score += 2;
            } else if !is_pure_number {
                score += 1;
            }
        }

        let fill_gate = (MIN_FILLED_CELLS as f64).max(num_cols as f64 * MIN_FILL_RATIO);
        let mut normalized = if filled > 0 && filled as f64 >= fill_gate {
            (score as f64 / filled as f64) * (filled as f64 / num_cols as f64)
        } else {
            0.0
        };

        if next_row_has_numbers(grid, i) {
            normalized *= DATA_LOOKAHEAD_BOOST;
        }

        // Strict comparison: ties keep the earliest-scanned row.
        if normalized > best_score {
            best_score = normalized;
            best_row = i;
        }
    }

    best_row
}

fn next_row_has_numbers(grid: &RawGrid, row: usize) -> bool {
    let Some(next) = grid.row(row + 1) else {
        return false;
    };
    next.iter().any(|cell| match cell {
        CellValue::Number(_) => true,
        CellValue::Empty => false,
        CellValue::Text(_) => !normalize(cell).is_nan(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn grid(rows: Vec<Vec<CellValue>>) -> RawGrid {
        RawGrid::new(rows)
    }

    #[test]
    fn empty_grid_defaults_to_zero() {
        assert_eq!(detect_header_row(&grid(vec![])), 0);
    }

    #[test]
    fn skips_decorative_title_rows() {
        let g = grid(vec![
            vec![text("Tabela de Preços 2024"), CellValue::Empty, CellValue::Empty],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
            vec![text("Produto"), text("Preço Milheiro"), text("Quantidade")],
            vec![text("Tijolo"), text("1.500,00"), CellValue::Number(10.0)],
            vec![text("Telha"), text("2.750,50"), CellValue::Number(4.0)],
        ]);
        assert_eq!(detect_header_row(&g), 2);
    }

    #[test]
    fn all_numeric_rows_default_to_zero() {
        let g = grid(vec![
            vec![CellValue::Number(1.0), CellValue::Number(2.0)],
            vec![CellValue::Number(3.0), CellValue::Number(4.0)],
        ]);
        assert_eq!(detect_header_row(&g), 0);
    }

    #[test]
    fn first_row_header_wins_over_data() {
        let g = grid(vec![
            vec![text("nome"), text("valor")],
            vec![text("a"), CellValue::Number(10.0)],
            vec![text("b"), CellValue::Number(20.0)],
        ]);
        assert_eq!(detect_header_row(&g), 0);
    }

    #[test]
    fn sparse_rows_do_not_qualify() {
        // One filled cell out of four columns stays under both fill gates.
        let g = grid(vec![
            vec![text("nota"), CellValue::Empty, CellValue::Empty, CellValue::Empty],
            vec![text("id"), text("descrição"), text("preço"), text("total")],
            vec![CellValue::Number(1.0), text("x"), text("2,5"), text("25,0")],
        ]);
        assert_eq!(detect_header_row(&g), 1);
    }

    #[test]
    fn lookahead_boost_breaks_label_ties() {
        // Two equally label-like rows; the one followed by numbers wins.
        let g = grid(vec![
            vec![text("relatório"), text("mensal")],
            vec![text("produto"), text("preço")],
            vec![text("tijolo"), text("1,5")],
        ]);
        assert_eq!(detect_header_row(&g), 1);
    }
}
