pub mod convert_columns;
pub mod load_table;
