// ============================================================
// WORKSHEET PATCH
// ============================================================
// Streaming cell replacement inside a worksheet part. Only cells named in
// the edit map are rewritten; every other event is copied through verbatim,
// including row attributes, merges and dimension metadata.

use super::sheet_package::local_name;
use crate::domain::error::{AppError, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A single cell replacement. Rows are 1-based sheet rows, columns 0-based.
#[derive(Debug, Clone, Copy)]
pub struct CellEdit {
    pub value: f64,
    /// Style index to stamp on the cell; `None` keeps whatever the cell had.
    pub style_override: Option<u32>,
}

pub type CellAddress = (u32, u32);

/// First pass: the `s` attribute of every target cell that exists in the
/// sheet. Cells absent from the XML simply do not appear in the result.
pub fn scan_cell_styles(
    sheet_xml: &[u8],
    targets: &BTreeSet<CellAddress>,
) -> Result<HashMap<CellAddress, Option<u32>>> {
    let mut reader = Reader::from_reader(sheet_xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut styles = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"c" => {
                if let Some((address, style)) = cell_reference_and_style(&e)? {
                    if targets.contains(&address) {
                        styles.insert(address, style);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(styles)
}

/// Second pass: rewrite each edited cell to a plain numeric cell. Returns the
/// patched XML and whether any formula was dropped along the way.
pub fn patch_worksheet(
    sheet_xml: &[u8],
    edits: &BTreeMap<CellAddress, CellEdit>,
) -> Result<(Vec<u8>, bool)> {
    let mut reader = Reader::from_reader(sheet_xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(sheet_xml.len()));
    let mut buf = Vec::new();
    let mut formula_removed = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"c" => {
                match matching_edit(&e, edits)? {
                    Some((address, style, edit)) => {
                        formula_removed |= skip_cell_content(&mut reader)?;
                        write_numeric_cell(&mut writer, address, style, edit)?;
                    }
                    None => writer.write_event(Event::Start(e.into_owned()))?,
                }
            }
            Event::Empty(e) if local_name(e.name().as_ref()) == b"c" => {
                match matching_edit(&e, edits)? {
                    Some((address, style, edit)) => {
                        write_numeric_cell(&mut writer, address, style, edit)?
                    }
                    None => writer.write_event(Event::Empty(e.into_owned()))?,
                }
            }
            Event::Eof => break,
            ev => writer.write_event(ev.into_owned())?,
        }
        buf.clear();
    }

    Ok((writer.into_inner(), formula_removed))
}

/// Rewrite `xl/workbook.xml` so the application recalculates on open. Used
/// when patching removed a formula another cell may reference.
pub fn ensure_full_calc_on_load(workbook_xml: &[u8]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(workbook_xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(workbook_xml.len() + 64));
    let mut buf = Vec::new();
    let mut seen_calc_pr = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) if local_name(e.name().as_ref()) == b"calcPr" => {
                seen_calc_pr = true;
                writer.write_event(Event::Empty(calc_pr_with_full_calc(&e)?))?;
            }
            Event::Start(e) if local_name(e.name().as_ref()) == b"calcPr" => {
                seen_calc_pr = true;
                writer.write_event(Event::Start(calc_pr_with_full_calc(&e)?))?;
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"workbook" && !seen_calc_pr => {
                seen_calc_pr = true;
                let mut calc_pr = BytesStart::new("calcPr");
                calc_pr.push_attribute(("fullCalcOnLoad", "1"));
                writer.write_event(Event::Empty(calc_pr))?;
                writer.write_event(Event::End(e.into_owned()))?;
            }
            Event::Eof => break,
            ev => writer.write_event(ev.into_owned())?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn calc_pr_with_full_calc(start: &BytesStart<'_>) -> Result<BytesStart<'static>> {
    let mut out = BytesStart::new("calcPr");
    for attr in start.attributes() {
        let attr = attr?;
        if local_name(attr.key.as_ref()) == b"fullCalcOnLoad" {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        out.push_attribute((key.as_str(), value.as_str()));
    }
    out.push_attribute(("fullCalcOnLoad", "1"));
    Ok(out)
}

fn matching_edit(
    start: &BytesStart<'_>,
    edits: &BTreeMap<CellAddress, CellEdit>,
) -> Result<Option<(CellAddress, Option<u32>, CellEdit)>> {
    Ok(match cell_reference_and_style(start)? {
        Some((address, style)) => edits
            .get(&address)
            .map(|edit| (address, style, *edit)),
        None => None,
    })
}

fn cell_reference_and_style(
    start: &BytesStart<'_>,
) -> Result<Option<(CellAddress, Option<u32>)>> {
    let mut reference = None;
    let mut style = None;
    for attr in start.attributes() {
        let attr = attr?;
        match local_name(attr.key.as_ref()) {
            b"r" => reference = parse_a1(&attr.unescape_value()?),
            b"s" => style = attr.unescape_value()?.parse::<u32>().ok(),
            _ => {}
        }
    }
    Ok(reference.map(|address| (address, style)))
}

/// Consume the inner events of an open `<c>` element, reporting whether a
/// formula was among them.
fn skip_cell_content(reader: &mut Reader<&[u8]>) -> Result<bool> {
    let mut buf = Vec::new();
    let mut depth = 1usize;
    let mut had_formula = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if depth == 1 && local_name(e.name().as_ref()) == b"f" {
                    had_formula = true;
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 1 && local_name(e.name().as_ref()) == b"f" {
                    had_formula = true;
                }
            }
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(had_formula);
                }
            }
            Event::Eof => {
                return Err(AppError::ParseError(
                    "célula sem fechamento na planilha".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
}

fn write_numeric_cell(
    writer: &mut Writer<Vec<u8>>,
    address: CellAddress,
    existing_style: Option<u32>,
    edit: CellEdit,
) -> Result<()> {
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", to_a1(address.0, address.1).as_str()));
    if let Some(style) = edit.style_override.or(existing_style) {
        cell.push_attribute(("s", style.to_string().as_str()));
    }
    writer.write_event(Event::Start(cell))?;
    writer.write_event(Event::Start(BytesStart::new("v")))?;
    writer.write_event(Event::Text(BytesText::new(&format_number(edit.value))))?;
    writer.write_event(Event::End(BytesEnd::new("v")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

/// Integers serialize without a fractional part, matching how spreadsheet
/// applications store them.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// `"B5"` to `(5, 1)`: 1-based row, 0-based column.
pub fn parse_a1(reference: &str) -> Option<CellAddress> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        col = col.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row, col - 1))
}

pub fn to_a1(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("{}{}", String::from_utf8_lossy(&letters), row)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
    <row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2" s="3"><v>1500</v></c></row>
    <row r="3"><c r="A3" t="s"><v>4</v></c><c r="B3" s="3"><f>B2*2</f><v>3000</v></c></row>
  </sheetData>
  <mergeCells count="1"><mergeCell ref="A1:B1"/></mergeCells>
</worksheet>"#;

    #[test]
    fn a1_round_trips() {
        assert_eq!(parse_a1("A1"), Some((1, 0)));
        assert_eq!(parse_a1("B5"), Some((5, 1)));
        assert_eq!(parse_a1("AA10"), Some((10, 26)));
        assert_eq!(to_a1(5, 1), "B5");
        assert_eq!(to_a1(10, 26), "AA10");
        assert_eq!(parse_a1("12"), None);
        assert_eq!(parse_a1("ABC"), None);
    }

    #[test]
    fn scans_styles_of_target_cells() {
        let targets: BTreeSet<CellAddress> = [(2, 1), (3, 1), (9, 9)].into_iter().collect();
        let styles = scan_cell_styles(SHEET.as_bytes(), &targets).unwrap();
        assert_eq!(styles.get(&(2, 1)), Some(&Some(3)));
        assert_eq!(styles.get(&(3, 1)), Some(&Some(3)));
        assert!(!styles.contains_key(&(9, 9)));
    }

    #[test]
    fn patches_values_and_preserves_the_rest() {
        let mut edits = BTreeMap::new();
        edits.insert(
            (2, 1),
            CellEdit {
                value: 1.5,
                style_override: None,
            },
        );
        let (out, formula_removed) = patch_worksheet(SHEET.as_bytes(), &edits).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains(r#"<c r="B2" s="3"><v>1.5</v></c>"#));
        // Untouched cells and merges pass through.
        assert!(xml.contains(r#"<c r="A2" t="s"><v>2</v></c>"#));
        assert!(xml.contains(r#"<mergeCell ref="A1:B1"/>"#));
        assert!(!formula_removed);
    }

    #[test]
    fn dropping_a_formula_cell_is_reported() {
        let mut edits = BTreeMap::new();
        edits.insert(
            (3, 1),
            CellEdit {
                value: 3.0,
                style_override: Some(7),
            },
        );
        let (out, formula_removed) = patch_worksheet(SHEET.as_bytes(), &edits).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert!(formula_removed);
        assert!(xml.contains(r#"<c r="B3" s="7"><v>3</v></c>"#));
        assert!(!xml.contains("B2*2"));
    }

    #[test]
    fn full_calc_on_load_is_inserted_or_updated() {
        let with_calc = br#"<workbook><sheets/><calcPr calcId="1"/></workbook>"#;
        let out = ensure_full_calc_on_load(with_calc).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains(r#"<calcPr calcId="1" fullCalcOnLoad="1"/>"#));

        let without = br#"<workbook><sheets/></workbook>"#;
        let out = ensure_full_calc_on_load(without).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains(r#"<calcPr fullCalcOnLoad="1"/></workbook>"#));
    }
}
