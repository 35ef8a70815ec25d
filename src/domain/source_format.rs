// ============================================================
// SOURCE FORMAT
// ============================================================
// Supported containers and extension handling

use crate::domain::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// File containers the converter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Xlsx,
    Xls,
    Ods,
    Csv,
}

impl SourceFormat {
    /// Resolve the format from a filename extension. Unsupported extensions
    /// are rejected before any parsing is attempted.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" => Ok(SourceFormat::Xlsx),
            "xls" => Ok(SourceFormat::Xls),
            "ods" => Ok(SourceFormat::Ods),
            "csv" => Ok(SourceFormat::Csv),
            _ => Err(AppError::ValidationError(
                "Formato não suportado. Use .xlsx, .xls, .csv ou .ods".to_string(),
            )),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
            SourceFormat::Ods => "ods",
            SourceFormat::Csv => "csv",
        }
    }

    pub fn is_delimited(&self) -> bool {
        matches!(self, SourceFormat::Csv)
    }

    /// Legacy and OpenDocument containers are not rewritten in place; their
    /// output is normalized to the modern container.
    pub fn needs_resave(&self) -> bool {
        matches!(self, SourceFormat::Xls | SourceFormat::Ods)
    }
}
