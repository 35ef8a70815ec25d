// ============================================================
// TABLE DOMAIN TYPES
// ============================================================
// Cell values, grids, structured tables and per-column summaries

mod cell;
mod column_info;
mod conversion;
mod raw_grid;
mod structured;

pub use cell::{CellValue, Numeric};
pub use column_info::{ColumnInfo, ColumnKind};
pub use conversion::{ConversionOutcome, ConversionRequest, RewriteReport};
pub use raw_grid::RawGrid;
pub use structured::{StructuredTable, TablePreview};
