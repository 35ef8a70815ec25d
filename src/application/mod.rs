pub mod use_cases;

pub use use_cases::convert_columns::convert_columns;
pub use use_cases::load_table::{load_table, LoadOutcome};
