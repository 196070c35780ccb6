use crate::common::error::Result;
use crate::common::types::{RawRecord, SourceFeed};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static HEADER_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th").expect("valid selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("valid selector"));

/// Header names and cell text of one HTML table
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HtmlTable {
    /// One raw record per row, keyed by header name
    pub fn into_records(self) -> SourceFeed {
        let headers = self.headers;
        self.rows
            .into_iter()
            .map(|row| {
                headers
                    .iter()
                    .zip(row)
                    .map(|(h, cell)| (h.clone(), Value::String(cell)))
                    .collect::<RawRecord>()
            })
            .collect()
    }
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Parse the first table on the page with a non-blank header.
///
/// Headers come from the first row containing `th` cells, or the first row
/// when the table has none. Blank rows are dropped.
pub fn first_table(html: &str) -> Option<HtmlTable> {
    let document = Html::parse_document(html);

    document.select(&TABLE).find_map(|table| {
        let rows: Vec<ElementRef> = table.select(&ROW).collect();
        let header_idx = rows
            .iter()
            .position(|row| row.select(&HEADER_CELL).next().is_some())
            .unwrap_or(0);

        let headers: Vec<String> = rows.get(header_idx)?.select(&CELL).map(cell_text).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return None;
        }

        let data = rows
            .iter()
            .skip(header_idx + 1)
            .map(|row| row.select(&CELL).map(cell_text).collect::<Vec<_>>())
            .filter(|cells| cells.iter().any(|c| !c.is_empty()))
            .collect();

        Some(HtmlTable { headers, rows: data })
    })
}

/// A form located by its submit control, ready to be replayed as a POST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitForm {
    pub action: String,
    pub control_name: String,
    pub control_value: String,
}

/// Locate the submit input with the given name and value and return the
/// action of its enclosing form.
pub fn find_submit_form(html: &str, name: &str, value: &str) -> Option<SubmitForm> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!(
        "input[type=\"submit\"][name=\"{}\"][value=\"{}\"]",
        name, value
    ))
    .ok()?;

    let input = document.select(&selector).next()?;
    let form = input
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "form")?;

    Some(SubmitForm {
        action: form.value().attr("action")?.trim().to_string(),
        control_name: name.to_string(),
        control_value: value.to_string(),
    })
}

/// Resolve a link or form action against the URL of the page it came from
pub fn join_url(base: &str, action: &str) -> Result<String> {
    Ok(Url::parse(base)?.join(action)?.to_string())
}
