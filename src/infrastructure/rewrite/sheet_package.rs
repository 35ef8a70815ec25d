// ============================================================
// SHEET PACKAGE
// ============================================================
// An opened xlsx container as an ordered map of parts. Parts that are never
// set are written back byte-identical, which is what keeps styles, merges,
// widths and every untouched cell intact.

use crate::domain::error::{AppError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub struct SheetPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl SheetPackage {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| AppError::IoError(format!("Erro ao abrir arquivo: {}", e)))?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            parts.push((name, bytes));
        }

        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(part, _)| part == name)
            .map(|(_, bytes)| bytes.as_slice())
    }

    pub fn set_part(&mut self, name: &str, bytes: Vec<u8>) {
        if let Some(slot) = self.parts.iter_mut().find(|(part, _)| part == name) {
            slot.1 = bytes;
        } else {
            self.parts.push((name.to_string(), bytes));
        }
    }

    pub fn remove_part(&mut self, name: &str) {
        self.parts.retain(|(part, _)| part != name);
    }

    /// Write every part back out in original order. Fatal on any failure:
    /// a half-written output is worse than none.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .map_err(|e| AppError::IoError(format!("Erro ao gravar arquivo: {}", e)))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, bytes) in &self.parts {
            zip.start_file(name.clone(), options)?;
            zip.write_all(bytes)?;
        }

        let mut inner = zip.finish()?;
        inner
            .flush()
            .map_err(|e| AppError::IoError(format!("Erro ao gravar arquivo: {}", e)))?;
        Ok(())
    }

    /// Part name of the workbook's first worksheet, resolved through
    /// `xl/workbook.xml` and its relationships part.
    pub fn first_worksheet_part(&self) -> Result<String> {
        let workbook = self
            .part("xl/workbook.xml")
            .ok_or_else(|| AppError::ParseError("xl/workbook.xml ausente".to_string()))?;
        let rel_id = first_sheet_rel_id(workbook)?;

        let rels = self
            .part("xl/_rels/workbook.xml.rels")
            .ok_or_else(|| AppError::ParseError("xl/_rels/workbook.xml.rels ausente".to_string()))?;
        let target = relationship_target(rels, &rel_id)?;

        Ok(if let Some(absolute) = target.strip_prefix('/') {
            absolute.to_string()
        } else {
            format!("xl/{}", target)
        })
    }
}

pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|b| *b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

fn first_sheet_rel_id(workbook_xml: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(workbook_xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"sheet" => {
                for attr in e.attributes() {
                    let attr = attr?;
                    if local_name(attr.key.as_ref()) == b"id" {
                        return Ok(attr.unescape_value()?.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Err(AppError::ParseError(
        "nenhuma planilha declarada em xl/workbook.xml".to_string(),
    ))
}

fn relationship_target(rels_xml: &[u8], rel_id: &str) -> Result<String> {
    let mut reader = Reader::from_reader(rels_xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e)
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    match local_name(attr.key.as_ref()) {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if id.as_deref() == Some(rel_id) {
                    if let Some(target) = target {
                        return Ok(target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Err(AppError::ParseError(format!(
        "relacionamento {} não encontrado",
        rel_id
    )))
}
