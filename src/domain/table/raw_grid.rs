use super::CellValue;

/// A headerless grid of cells, addressed the way the source container
/// addresses rows: row 0 here is row 1 of the sheet, even when the sheet's
/// used range starts lower.
#[derive(Debug, Clone, Default)]
pub struct RawGrid {
    rows: Vec<Vec<CellValue>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row wins; ragged rows are shorter rows with missing trailing cells.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_report_widest_width() {
        let grid = RawGrid::new(vec![
            vec![CellValue::Text("a".into())],
            vec![CellValue::Text("b".into()), CellValue::Number(1.0)],
        ]);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.cell(0, 1), &CellValue::Empty);
    }
}
