use super::CellValue;
use serde_json::{Map, Value};

/// A table with named columns and rows aligned to them. Column names are
/// whitespace-trimmed; uniqueness is not enforced.
#[derive(Debug, Clone)]
pub struct StructuredTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// First-N-rows preview, one JSON object per row keyed by column name.
pub type TablePreview = Vec<Map<String, Value>>;

impl StructuredTable {
    /// Builds the table, trimming column names and dropping rows that are
    /// blank across every column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.trim().to_string()).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_blank()))
            .map(|mut row| {
                // resize both pads short rows and shrinks long ones.
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Vec<CellValue>] {
        &mut self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by name. With duplicate names the last position
    /// wins, mirroring a name→index map built in column order.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().rposition(|c| c == name)
    }

    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&CellValue::Empty))
    }

    /// First `limit` rows with cells rendered for display: integers without
    /// decimals, other numbers to two decimal places, blanks as "".
    pub fn preview(&self, limit: usize) -> TablePreview {
        self.rows
            .iter()
            .take(limit)
            .map(|row| {
                let mut object = Map::new();
                for (idx, name) in self.columns.iter().enumerate() {
                    let cell = row.get(idx).unwrap_or(&CellValue::Empty);
                    object.insert(name.clone(), Value::String(cell.format_brief()));
                }
                object
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn drops_fully_blank_rows() {
        let table = StructuredTable::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![text("x"), CellValue::Empty],
                vec![CellValue::Empty, text("  ")],
                vec![CellValue::Number(1.0), text("y")],
            ],
        );
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn rows_are_resized_to_the_column_width() {
        let table = StructuredTable::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![text("x")],
                vec![text("y"), CellValue::Number(1.0), text("excedente")],
            ],
        );
        assert_eq!(table.rows()[0], vec![text("x"), CellValue::Empty]);
        assert_eq!(table.rows()[1].len(), 2);
    }

    #[test]
    fn trims_column_names() {
        let table = StructuredTable::new(vec![" Preço ".into()], vec![]);
        assert_eq!(table.columns(), ["Preço"]);
    }

    #[test]
    fn duplicate_names_resolve_to_last_position() {
        let table = StructuredTable::new(vec!["a".into(), "a".into()], vec![]);
        assert_eq!(table.column_index("a"), Some(1));
    }

    #[test]
    fn preview_formats_cells() {
        let table = StructuredTable::new(
            vec!["n".into()],
            vec![vec![CellValue::Number(1500.0)], vec![CellValue::Number(2.5)]],
        );
        let preview = table.preview(10);
        assert_eq!(preview[0]["n"], Value::String("1500".into()));
        assert_eq!(preview[1]["n"], Value::String("2.50".into()));
    }
}
