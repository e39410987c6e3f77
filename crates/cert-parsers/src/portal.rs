//! CA-portal HTML export extraction
//!
//! The portal's markup is an external contract we do not control: repeated
//! `div.cert-item` blocks with a fixed nested div/table structure. All
//! structural selectors live in this module; upstream code only ever sees
//! [`HtmlCertificateStub`]. A malformed block is dropped, never fatal.

use crate::{ParseError, ParseResult};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// One certificate block as advertised by the portal export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlCertificateStub {
    /// Certificate number with all whitespace stripped.
    pub number: String,
    /// Free-text type label, matched against the type catalog downstream.
    pub type_label: String,
    /// Owner full name as printed by the portal.
    pub owner_name: String,
    /// Expiry date, `DD.MM.YYYY` in the source.
    pub expiry_date: NaiveDate,
}

struct BlockSelectors {
    item: Selector,
    cont_width1: Selector,
    cont_width2: Selector,
    content_right: Selector,
    owner_name: Selector,
    div: Selector,
    bold: Selector,
    table: Selector,
    row: Selector,
    cell: Selector,
}

impl BlockSelectors {
    fn new() -> Self {
        Self {
            item: Selector::parse("div.cert-item").unwrap(),
            cont_width1: Selector::parse("div.contWidth1").unwrap(),
            cont_width2: Selector::parse("div.contWidth2").unwrap(),
            content_right: Selector::parse("div.cert-item-content-right").unwrap(),
            owner_name: Selector::parse("div.owner-name").unwrap(),
            div: Selector::parse("div").unwrap(),
            bold: Selector::parse("b").unwrap(),
            table: Selector::parse("table").unwrap(),
            row: Selector::parse("tr").unwrap(),
            cell: Selector::parse("td").unwrap(),
        }
    }
}

/// Extract every well-formed certificate block from a portal export.
///
/// Pure function of its input: same bytes, same stubs, every call. Blocks
/// with structural mismatches are skipped with a debug log; only a document
/// that cannot be read at all fails.
pub fn extract_stubs(data: &[u8]) -> ParseResult<Vec<HtmlCertificateStub>> {
    let text = decode_document(data)?;
    let document = Html::parse_document(&text);
    let selectors = BlockSelectors::new();

    let mut stubs = Vec::new();
    for (idx, block) in document.select(&selectors.item).enumerate() {
        match extract_block(&block, &selectors) {
            Ok(stub) => stubs.push(stub),
            Err(e) => tracing::debug!(block = idx, "skipping certificate block: {e}"),
        }
    }

    tracing::debug!(found = stubs.len(), "portal export extraction finished");
    Ok(stubs)
}

/// Decode the export bytes: UTF-8, then Windows-1251, then UTF-8 with
/// replacement characters.
fn decode_document(data: &[u8]) -> ParseResult<String> {
    if data.is_empty() {
        return Err(ParseError::Encoding("empty document".into()));
    }
    if let Ok(text) = std::str::from_utf8(data) {
        return Ok(text.to_string());
    }
    let (text, _, had_errors) = encoding_rs::WINDOWS_1251.decode(data);
    if !had_errors {
        return Ok(text.into_owned());
    }
    let (text, _, _) = encoding_rs::UTF_8.decode(data);
    Ok(text.into_owned())
}

fn extract_block(
    block: &ElementRef,
    sel: &BlockSelectors,
) -> ParseResult<HtmlCertificateStub> {
    // Type label and number live under contWidth1, in the first and second
    // inner divs of its wrapper div.
    let cont1 = block
        .select(&sel.cont_width1)
        .next()
        .ok_or_else(|| structural("contWidth1 container missing"))?;
    let wrapper = cont1
        .select(&sel.div)
        .next()
        .ok_or_else(|| structural("contWidth1 wrapper div missing"))?;
    let mut inner = wrapper.select(&sel.div);
    let type_div = inner
        .next()
        .ok_or_else(|| structural("type label div missing"))?;
    let number_div = inner
        .next()
        .ok_or_else(|| structural("certificate number div missing"))?;

    let type_label = type_div
        .select(&sel.bold)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| structural("type label not bolded or empty"))?;

    let number_text = element_text(number_div);
    let after_marker = match number_text.split_once('№') {
        Some((_, rest)) => rest,
        None => number_text.as_str(),
    };
    let number: String = after_marker.split_whitespace().collect();
    if number.is_empty() {
        return Err(structural("empty certificate number"));
    }

    // Owner name: bolded text of div.owner-name under contWidth2.
    let cont2 = block
        .select(&sel.cont_width2)
        .next()
        .ok_or_else(|| structural("contWidth2 container missing"))?;
    let owner_name = cont2
        .select(&sel.owner_name)
        .next()
        .and_then(|div| div.select(&sel.bold).next())
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| structural("owner name missing"))?;

    // Expiry date: last non-empty bolded cell of the trailing table, scanned
    // backward to tolerate decorative rows after the date.
    let table = block
        .select(&sel.content_right)
        .next()
        .and_then(|right| right.select(&sel.table).next())
        .ok_or_else(|| structural("validity table missing"))?;
    let expiry_text = last_bold_cell_text(&table, sel)
        .ok_or_else(|| structural("expiry cell missing"))?;
    let expiry_date = NaiveDate::parse_from_str(&expiry_text, "%d.%m.%Y")
        .map_err(|_| structural("expiry date not DD.MM.YYYY"))?;

    Ok(HtmlCertificateStub {
        number,
        type_label,
        owner_name,
        expiry_date,
    })
}

fn last_bold_cell_text(table: &ElementRef, sel: &BlockSelectors) -> Option<String> {
    let rows: Vec<_> = table.select(&sel.row).collect();
    for row in rows.iter().rev() {
        let cells: Vec<_> = row.select(&sel.cell).collect();
        for cell in cells.iter().rev() {
            if let Some(bold) = cell.select(&sel.bold).next() {
                let text = element_text(bold);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn structural(what: &str) -> ParseError {
    ParseError::Structural(what.to_string())
}
