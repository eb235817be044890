// src/fetch/extract.rs

use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::trace;

use crate::browser::{BrowserError, Locator, Session};
use crate::error::{Result, RunContext, ScrapeError};
use crate::process::utils::clean_cell;
use crate::process::{Page, Row};

/// Reads the target table out of the currently rendered view.
pub struct PageExtractor {
    table_css: String,
    table: Selector,
    rows: Selector,
    wait: Duration,
}

impl PageExtractor {
    pub fn new(table_css: &str, wait: Duration) -> Result<Self> {
        let table = Selector::parse(table_css).map_err(|e| {
            ScrapeError::Config(format!("table selector {:?}: {:?}", table_css, e))
        })?;
        let rows = Selector::parse("tr").expect("row selector should parse");
        Ok(Self {
            table_css: table_css.to_string(),
            table,
            rows,
            wait,
        })
    }

    pub fn locator(&self) -> Locator {
        Locator::Css(self.table_css.clone())
    }

    /// All rows of the first matching table, or `None` if the document has
    /// no such table. Rows without cells are skipped.
    pub fn rows_in(&self, document: &Html) -> Option<Page> {
        let table = document.select(&self.table).next()?;
        let page = table
            .select(&self.rows)
            .map(row_cells)
            .filter(|cells| !cells.is_empty())
            .collect();
        Some(page)
    }

    /// Wait for the table, then read every row of it.
    pub fn extract(&self, session: &mut Session<'_>, ctx: &RunContext) -> Result<Page> {
        session
            .wait_for(&self.locator(), self.wait)
            .map_err(|e| match e {
                BrowserError::Timeout { waited, .. } => ScrapeError::Extraction {
                    detail: format!("table `{}` not present after {:?}", self.table_css, waited),
                    context: ctx.clone(),
                },
                other => ScrapeError::Browser {
                    source: other,
                    context: ctx.clone(),
                },
            })?;

        let markup = session
            .rendered_markup()
            .map_err(|source| ScrapeError::Browser {
                source,
                context: ctx.clone(),
            })?;
        let document = Html::parse_document(&markup);
        let page = self
            .rows_in(&document)
            .ok_or_else(|| ScrapeError::Extraction {
                detail: format!("table `{}` missing from rendered markup", self.table_css),
                context: ctx.clone(),
            })?;
        trace!(rows = page.len(), "extracted page");
        Ok(page)
    }
}

/// Direct `th`/`td` children of a row, in document order.
fn row_cells(row: ElementRef<'_>) -> Row {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "th" | "td"))
        .map(|cell| clean_cell(&cell.text().collect::<String>()))
        .collect()
}
