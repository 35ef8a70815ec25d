// ============================================================
// DOMAIN LAYER
// ============================================================
// Core types and value objects for table loading and conversion
// No I/O, no async, no external collaborators

pub mod error;
pub mod session;
pub mod source_format;
pub mod table;

pub use error::{AppError, Result};
pub use session::{OutputArtifact, SessionContext};
pub use source_format::SourceFormat;
