// ============================================================
// CSV GRID LOADER
// ============================================================
// Delimited-text loading with delimiter auto-detection and encoding
// fallback. The delimiter is never assumed to be a comma.

use crate::domain::error::{AppError, Result};
use crate::domain::table::{CellValue, RawGrid};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;

/// Candidate delimiters, scored by per-line count consistency.
const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Lines sampled when scoring delimiter candidates.
const DETECTION_SAMPLE_LINES: usize = 10;

pub struct CsvGridLoader {
    delimiter: u8,
}

impl CsvGridLoader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Open a file and pick the delimiter from its first lines.
    pub fn open(path: &Path) -> Result<Self> {
        let content = read_with_encoding_fallback(path)?;
        Ok(Self::new(Self::detect_delimiter(&content)))
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Score by average count per line divided by count spread; the most
    /// frequent and most consistent candidate wins, comma on a total tie.
    pub fn detect_delimiter(content: &str) -> u8 {
        let sample_lines: Vec<&str> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(DETECTION_SAMPLE_LINES)
            .collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f64;

        for &delimiter in &DELIMITER_CANDIDATES {
            if sample_lines.is_empty() {
                continue;
            }

            let counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            let avg = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            let variance = counts
                .iter()
                .map(|&c| (c as f64 - avg).powi(2))
                .sum::<f64>()
                / counts.len() as f64;

            let score = avg / (1.0 + variance.sqrt());
            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }

    pub fn load_raw(&self, path: &Path) -> Result<RawGrid> {
        let content = read_with_encoding_fallback(path)?;
        self.parse_content(&content)
    }

    pub fn parse_content(&self, content: &str) -> Result<RawGrid> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Erro ao ler arquivo: linha {}: {}", index + 1, e))
            })?;
            rows.push(record.iter().map(parse_field).collect());
        }

        Ok(RawGrid::new(rows))
    }
}

/// UTF-8 when valid, Windows-1252 otherwise. Spreadsheet exports from
/// Portuguese-locale tools are routinely in the legacy encoding.
fn read_with_encoding_fallback(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).map_err(|e| AppError::IoError(format!("Erro ao ler arquivo: {}", e)))?;
    match String::from_utf8(bytes) {
        Ok(content) => Ok(content),
        Err(err) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

/// A field parses to a number only in its plain machine form; locale forms
/// like "1.234,56" stay text until the normalizer runs.
fn parse_field(field: &str) -> CellValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(field.to_string()),
    }
}
