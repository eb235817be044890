// src/fetch/navigate.rs

use scraper::Html;
use tracing::debug;

use crate::browser::{Browser, BrowserError, Locator, Session};
use crate::config::TargetConfig;
use crate::criteria::Criteria;
use crate::error::{Result, RunContext, ScrapeError};
use crate::observe::{RunEvent, RunObserver};

/// Result of submitting a search.
pub enum Navigation<'o> {
    /// Results are on screen; the session is handed to pagination.
    Ready(Session<'o>),
    /// The site reported no matching records. The session is already closed.
    Empty,
}

/// Opens the target page and submits the search for one run.
pub struct NavigationController<'t> {
    target: &'t TargetConfig,
}

impl<'t> NavigationController<'t> {
    pub fn new(target: &'t TargetConfig) -> Self {
        Self { target }
    }

    pub fn open<'o>(
        &self,
        browser: Box<dyn Browser>,
        criteria: &Criteria,
        observer: &'o dyn RunObserver,
        ctx: &RunContext,
    ) -> Result<Navigation<'o>> {
        let target = self.target;
        let wait = target.timeouts.element_wait();
        let mut session = Session::new(browser, observer);

        let browser_err = |source: BrowserError| ScrapeError::Browser {
            source,
            context: ctx.clone(),
        };

        session.navigate(&target.url).map_err(browser_err)?;
        session
            .wait_for(&target.search.input, wait)
            .map_err(|e| control_timeout(e, &target.search.input, ctx))?;

        if let Some(text) = criteria.site_text(&target.date_format) {
            debug!(%text, "entering search criteria");
            session
                .type_text(&target.search.input, &text)
                .map_err(browser_err)?;
        }
        session
            .wait_for(&target.search.submit, wait)
            .map_err(|e| control_timeout(e, &target.search.submit, ctx))?;
        session.click(&target.search.submit).map_err(browser_err)?;
        observer.on_event(RunEvent::SearchSubmitted {
            url: target.url.clone(),
        });

        let markup = session.rendered_markup().map_err(browser_err)?;
        if contains_sentinel(&markup, &target.empty_sentinel) {
            observer.on_event(RunEvent::EmptyResult);
            session.close();
            return Ok(Navigation::Empty);
        }
        Ok(Navigation::Ready(session))
    }
}

fn control_timeout(err: BrowserError, control: &Locator, ctx: &RunContext) -> ScrapeError {
    match err {
        BrowserError::Timeout { .. } => ScrapeError::NavigationTimeout {
            control: control.to_string(),
            context: ctx.clone(),
        },
        other => ScrapeError::Browser {
            source: other,
            context: ctx.clone(),
        },
    }
}

/// Whether the page's visible text contains `sentinel`, ignoring how the
/// markup breaks and indents it.
pub fn contains_sentinel(markup: &str, sentinel: &str) -> bool {
    let wanted = sentinel.split_whitespace().collect::<Vec<_>>().join(" ");
    if wanted.is_empty() {
        return false;
    }
    let document = Html::parse_document(markup);
    let text = document.root_element().text().collect::<String>();
    text.split_whitespace().collect::<Vec<_>>().join(" ").contains(&wanted)
}
