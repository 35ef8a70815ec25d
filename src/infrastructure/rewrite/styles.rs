// ============================================================
// STYLE TABLE
// ============================================================
// Just enough of xl/styles.xml to answer "does this cell render as
// General?" and to append derived number formats. Existing xf entries are
// never reordered or rewritten, so every untouched cell keeps its index.

use super::sheet_package::local_name;
use crate::domain::error::{AppError, Result};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;

/// Builtin number format 4: `#,##0.00`. Assigned to rewritten cells whose
/// effective format was General so the divided value still renders sanely.
pub const THOUSANDS_TWO_DECIMALS_FMT_ID: u32 = 4;

const GENERAL_FMT_ID: u32 = 0;

#[derive(Debug, Clone, Default)]
struct CellXf {
    attrs: Vec<(String, String)>,
    children_xml: Vec<u8>,
    num_fmt_id: u32,
}

/// Parsed `cellXfs` plus the derived entries allocated during a rewrite.
pub struct StyleTable {
    xfs: Vec<CellXf>,
    derived: Vec<CellXf>,
    derived_index: HashMap<Option<u32>, u32>,
}

impl StyleTable {
    pub fn parse(styles_xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(styles_xml);
        reader.config_mut().trim_text(false);
        let mut buf = Vec::new();

        let mut xfs = Vec::new();
        let mut in_cell_xfs = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if local_name(e.name().as_ref()) == b"cellXfs" => {
                    in_cell_xfs = true;
                }
                Event::End(e) if local_name(e.name().as_ref()) == b"cellXfs" => {
                    in_cell_xfs = false;
                }
                Event::Empty(e) if in_cell_xfs && local_name(e.name().as_ref()) == b"xf" => {
                    xfs.push(read_xf(&e, Vec::new())?);
                }
                Event::Start(e) if in_cell_xfs && local_name(e.name().as_ref()) == b"xf" => {
                    let start = e.into_owned();
                    let children = copy_until_end(&mut reader, b"xf")?;
                    xfs.push(read_xf(&start, children)?);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self {
            xfs,
            derived: Vec::new(),
            derived_index: HashMap::new(),
        })
    }

    /// True when the style renders as General: no style at all, an index we
    /// cannot resolve, or an xf pointing at numFmtId 0.
    pub fn is_general(&self, style: Option<u32>) -> bool {
        match style {
            None => true,
            Some(idx) => self
                .xfs
                .get(idx as usize)
                .map(|xf| xf.num_fmt_id == GENERAL_FMT_ID)
                .unwrap_or(true),
        }
    }

    /// Index of a derived xf carrying `#,##0.00` on top of `base`. Derived
    /// entries are appended past the existing ones and deduplicated per base.
    pub fn derived_two_decimals(&mut self, base: Option<u32>) -> u32 {
        if let Some(&idx) = self.derived_index.get(&base) {
            return idx;
        }

        let mut xf = base
            .and_then(|idx| self.xfs.get(idx as usize).cloned())
            .unwrap_or_else(|| CellXf {
                attrs: vec![
                    ("numFmtId".to_string(), "0".to_string()),
                    ("fontId".to_string(), "0".to_string()),
                    ("fillId".to_string(), "0".to_string()),
                    ("borderId".to_string(), "0".to_string()),
                    ("xfId".to_string(), "0".to_string()),
                ],
                children_xml: Vec::new(),
                num_fmt_id: GENERAL_FMT_ID,
            });

        set_attr(&mut xf.attrs, "numFmtId", &THOUSANDS_TWO_DECIMALS_FMT_ID.to_string());
        set_attr(&mut xf.attrs, "applyNumberFormat", "1");
        xf.num_fmt_id = THOUSANDS_TWO_DECIMALS_FMT_ID;

        let idx = (self.xfs.len() + self.derived.len()) as u32;
        self.derived.push(xf);
        self.derived_index.insert(base, idx);
        idx
    }

    pub fn has_derived(&self) -> bool {
        !self.derived.is_empty()
    }

    /// Re-emit styles.xml with the derived xfs appended to `cellXfs` and its
    /// count updated. Everything else passes through untouched.
    pub fn apply(&self, styles_xml: &[u8]) -> Result<Vec<u8>> {
        if self.derived.is_empty() {
            return Ok(styles_xml.to_vec());
        }

        let total = self.xfs.len() + self.derived.len();
        let mut reader = Reader::from_reader(styles_xml);
        reader.config_mut().trim_text(false);
        let mut writer = Writer::new(Vec::with_capacity(styles_xml.len() + 256));
        let mut buf = Vec::new();
        let mut seen_cell_xfs = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if local_name(e.name().as_ref()) == b"cellXfs" => {
                    seen_cell_xfs = true;
                    writer.write_event(Event::Start(with_count(&e, total)?))?;
                }
                Event::Empty(e) if local_name(e.name().as_ref()) == b"cellXfs" => {
                    seen_cell_xfs = true;
                    writer.write_event(Event::Start(with_count(&e, total)?))?;
                    for xf in &self.derived {
                        write_xf(&mut writer, xf)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new("cellXfs")))?;
                }
                Event::End(e) if local_name(e.name().as_ref()) == b"cellXfs" => {
                    for xf in &self.derived {
                        write_xf(&mut writer, xf)?;
                    }
                    writer.write_event(Event::End(e.into_owned()))?;
                }
                Event::Eof => break,
                ev => writer.write_event(ev.into_owned())?,
            }
            buf.clear();
        }

        if !seen_cell_xfs {
            return Err(AppError::ParseError(
                "styles.xml sem seção cellXfs".to_string(),
            ));
        }
        Ok(writer.into_inner())
    }
}

fn read_xf(start: &BytesStart<'_>, children_xml: Vec<u8>) -> Result<CellXf> {
    let mut attrs = Vec::new();
    let mut num_fmt_id = GENERAL_FMT_ID;
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        if local_name(attr.key.as_ref()) == b"numFmtId" {
            num_fmt_id = value.parse().unwrap_or(GENERAL_FMT_ID);
        }
        attrs.push((key, value));
    }
    Ok(CellXf {
        attrs,
        children_xml,
        num_fmt_id,
    })
}

/// Copy the inner events of the current element verbatim, consuming its end
/// tag.
fn copy_until_end(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    let mut depth = 1usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e.into_owned()))?;
            }
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && local_name(e.name().as_ref()) == tag {
                    break;
                }
                writer.write_event(Event::End(e.into_owned()))?;
            }
            Event::Eof => {
                return Err(AppError::ParseError(
                    "fim inesperado de styles.xml".to_string(),
                ))
            }
            ev => writer.write_event(ev.into_owned())?,
        }
        buf.clear();
    }
    Ok(writer.into_inner())
}

fn with_count(start: &BytesStart<'_>, total: usize) -> Result<BytesStart<'static>> {
    let mut out = BytesStart::new("cellXfs");
    let mut had_count = false;
    for attr in start.attributes() {
        let attr = attr?;
        if local_name(attr.key.as_ref()) == b"count" {
            out.push_attribute(("count", total.to_string().as_str()));
            had_count = true;
        } else {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            out.push_attribute((key.as_str(), value.as_str()));
        }
    }
    if !had_count {
        out.push_attribute(("count", total.to_string().as_str()));
    }
    Ok(out)
}

fn write_xf(writer: &mut Writer<Vec<u8>>, xf: &CellXf) -> Result<()> {
    let mut start = BytesStart::new("xf");
    for (key, value) in &xf.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if xf.children_xml.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        writer.get_mut().extend_from_slice(&xf.children_xml);
        writer.write_event(Event::End(BytesEnd::new("xf")))?;
    }
    Ok(())
}

fn set_attr(attrs: &mut Vec<(String, String)>, key: &str, value: &str) {
    if let Some(slot) = attrs.iter_mut().find(|(k, _)| k == key) {
        slot.1 = value.to_string();
    } else {
        attrs.push((key.to_string(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="1"><font/></fonts>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
    <xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0"><alignment horizontal="center"/></xf>
  </cellXfs>
</styleSheet>"#;

    #[test]
    fn parses_num_fmt_ids() {
        let table = StyleTable::parse(STYLES.as_bytes()).unwrap();
        assert!(table.is_general(None));
        assert!(table.is_general(Some(0)));
        assert!(!table.is_general(Some(1)));
        assert!(table.is_general(Some(2)));
        assert!(table.is_general(Some(99)));
    }

    #[test]
    fn derives_stable_deduplicated_indices() {
        let mut table = StyleTable::parse(STYLES.as_bytes()).unwrap();
        let a = table.derived_two_decimals(None);
        let b = table.derived_two_decimals(Some(2));
        assert_eq!(a, 3);
        assert_eq!(b, 4);
        assert_eq!(table.derived_two_decimals(None), a);
    }

    #[test]
    fn apply_appends_and_updates_count() {
        let mut table = StyleTable::parse(STYLES.as_bytes()).unwrap();
        table.derived_two_decimals(Some(2));
        let out = table.apply(STYLES.as_bytes()).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains(r#"<cellXfs count="4">"#));
        assert!(xml.contains(r#"numFmtId="4""#));
        assert!(xml.contains(r#"applyNumberFormat="1""#));
        // The derived xf keeps its base's alignment child.
        assert_eq!(xml.matches("alignment horizontal=\"center\"").count(), 2);
    }

    #[test]
    fn apply_without_derived_is_identity() {
        let table = StyleTable::parse(STYLES.as_bytes()).unwrap();
        assert_eq!(table.apply(STYLES.as_bytes()).unwrap(), STYLES.as_bytes());
    }
}
