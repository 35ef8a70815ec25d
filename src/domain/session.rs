// ============================================================
// SESSION CONTEXT
// ============================================================
// Per-session state the core needs between operations. Passed explicitly
// into each use case; never read from shared mutable storage, so concurrent
// sessions cannot collide on a single "current file" slot.

use crate::domain::source_format::SourceFormat;
use std::path::PathBuf;

/// Where the last Convert wrote its result.
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub filename: String,
}

/// State for one uploaded document. A repeated upload replaces the whole
/// context, clearing any previous output artifact.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub source_path: PathBuf,
    pub format: SourceFormat,
    pub original_filename: String,
    pub header_row: usize,
    pub output: Option<OutputArtifact>,
}

impl SessionContext {
    pub fn new(
        source_path: PathBuf,
        format: SourceFormat,
        original_filename: String,
        header_row: usize,
    ) -> Self {
        Self {
            source_path,
            format,
            original_filename,
            header_row,
            output: None,
        }
    }
}
