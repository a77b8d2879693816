use crate::core::{ScraperError, ScraperResult};
use crate::locator::collapse_whitespace;
use crate::storage::{NoticeRow, HEADER};
use log::{debug, trace};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Header and rows read from one results grid snapshot. Every row has exactly
/// `header.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn into_notice_rows(self) -> Vec<NoticeRow> {
        self.rows.iter().map(|cells| NoticeRow::from_cells(cells)).collect()
    }
}

fn selector(css: &str) -> ScraperResult<Selector> {
    Selector::parse(css)
        .map_err(|e| ScraperError::ExtractionError(format!("invalid selector {:?}: {:?}", css, e)))
}

struct CellSelectors {
    no_wrap: Selector,
    link: Selector,
}

/// Reads the data rows of the first table in `grid_html`.
pub fn extract(grid_html: &str) -> ScraperResult<ExtractedTable> {
    let fragment = Html::parse_fragment(grid_html);
    let table_selector = selector("table")?;
    let cells = CellSelectors {
        no_wrap: selector(r#"nobr, [class*="nowrap"]"#)?,
        link: selector("a")?,
    };

    let table = match fragment.select(&table_selector).next() {
        Some(table) => table,
        None => {
            return Err(ScraperError::ExtractionError(
                "grid markup contains no table".to_string(),
            ))
        }
    };

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for row in table_rows(table) {
        let values: Vec<String> = child_elements(row)
            .filter(|cell| cell.value().name() == "td")
            .map(|cell| cell_text(cell, &cells))
            .collect();

        if values.iter().all(|v| v.is_empty()) {
            trace!("Dropping empty row ({} cells)", values.len());
            continue;
        }
        raw_rows.push(values);
    }

    let widest = raw_rows.iter().map(Vec::len).max().unwrap_or(HEADER.len());
    let width = widest.min(HEADER.len());
    let header: Vec<String> = HEADER[..width].iter().map(|h| h.to_string()).collect();

    let rows: Vec<Vec<String>> = raw_rows
        .into_iter()
        .map(|mut cells| {
            cells.resize(width, String::new());
            cells
        })
        .collect();

    debug!("Extracted {} row(s), width {}", rows.len(), width);
    Ok(ExtractedTable { header, rows })
}

fn child_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Rows that belong to `table` itself, never those of a nested table.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in child_elements(table) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child_elements(child).filter(|el| el.value().name() == "tr"))
            }
            _ => {}
        }
    }
    rows
}

fn cell_text(cell: ElementRef<'_>, selectors: &CellSelectors) -> String {
    let preferred = cell
        .select(&selectors.no_wrap)
        .next()
        .or_else(|| cell.select(&selectors.link).next())
        .map(text_of)
        .filter(|text| !text.is_empty());

    preferred.unwrap_or_else(|| text_of(cell))
}

fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
