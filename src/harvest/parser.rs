//! HTML table extraction
//!
//! Turns a fetched page into rows of named columns:
//! - The first table on a detail page
//! - A specific table (by `id`) on a listing or section page

use scraper::{ElementRef, Html, Selector};

/// A table extracted from a page: column names plus data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Extracts the first table in the document
///
/// Returns `None` when the page has no `<table>` at all. A table with a header
/// but no data rows is returned as an empty `Table`.
///
/// # Example
///
/// ```
/// use nav_harvest::harvest::extract_first_table;
///
/// let html = r#"<table><thead><tr><th>Stock</th><th>Units</th></tr></thead>
///               <tbody><tr><td>NABIL</td><td>1,200</td></tr></tbody></table>"#;
/// let table = extract_first_table(html).unwrap();
/// assert_eq!(table.headers, vec!["Stock", "Units"]);
/// assert_eq!(table.rows, vec![vec!["NABIL", "1,200"]]);
/// ```
pub fn extract_first_table(html: &str) -> Option<Table> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").ok()?;

    document.select(&table_selector).next().map(parse_table)
}

/// Extracts the table whose `id` attribute equals `table_id`
pub fn extract_table_by_id(html: &str, table_id: &str) -> Option<Table> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").ok()?;

    document
        .select(&table_selector)
        .find(|table| table.value().id() == Some(table_id))
        .map(parse_table)
}

/// Reads headers and data rows out of a `<table>` element
///
/// Headers come from `<th>` cells in `<thead>`, or from the first row made of
/// `<th>` cells. Rows whose cell count differs from the header count are
/// dropped. Without any header cells, columns are numbered from 1.
fn parse_table(table: ElementRef<'_>) -> Table {
    let (Ok(thead_th), Ok(tr), Ok(th), Ok(td)) = (
        Selector::parse("thead th"),
        Selector::parse("tr"),
        Selector::parse("th"),
        Selector::parse("td"),
    ) else {
        return Table::default();
    };

    let mut headers: Vec<String> = table.select(&thead_th).map(cell_text).collect();
    let mut rows = Vec::new();

    for row in table.select(&tr) {
        let cells: Vec<String> = row.select(&td).map(cell_text).collect();

        if cells.is_empty() {
            if headers.is_empty() {
                headers = row.select(&th).map(cell_text).collect();
            }
            continue;
        }

        rows.push(cells);
    }

    if headers.is_empty() {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        headers = (1..=width).map(|i| format!("Column {}", i)).collect();
    }

    let before = rows.len();
    rows.retain(|cells| cells.len() == headers.len());
    if rows.len() < before {
        tracing::debug!(
            "Dropped {} malformed rows (expected {} cells)",
            before - rows.len(),
            headers.len()
        );
    }

    Table { headers, rows }
}

/// Cell text with whitespace runs collapsed
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
