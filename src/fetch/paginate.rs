// src/fetch/paginate.rs

use scraper::{ElementRef, Html, Selector};
use std::{
    thread,
    time::{Duration, Instant},
};
use tracing::debug;

use super::extract::PageExtractor;
use crate::browser::{normalize_link_text, BrowserError, Locator, Session};
use crate::config::AdvanceStyle;
use crate::error::{Result, RunContext, ScrapeError};
use crate::observe::RunEvent;
use crate::process::{Page, RawDataset};

/// A site's "next page" control.
pub trait PageAdvance {
    /// Whether the rendered page offers another page.
    fn is_available(&self, document: &Html) -> bool;
    /// Move the browser to the next page.
    fn activate(&self, session: &mut Session<'_>) -> Result<(), BrowserError>;
}

/// Link-style control: an anchor with a fixed text that is only rendered
/// while there is a next page.
pub struct LinkTextAdvance {
    text: String,
    anchors: Selector,
}

impl LinkTextAdvance {
    pub fn new(text: &str) -> Self {
        Self {
            text: normalize_link_text(text),
            anchors: Selector::parse("a").expect("anchor selector should parse"),
        }
    }
}

impl PageAdvance for LinkTextAdvance {
    fn is_available(&self, document: &Html) -> bool {
        document
            .select(&self.anchors)
            .any(|a| normalize_link_text(&a.text().collect::<String>()) == self.text)
    }

    fn activate(&self, session: &mut Session<'_>) -> Result<(), BrowserError> {
        session.click(&Locator::LinkText(self.text.clone()))
    }
}

/// Index-style control: always rendered, marked disabled on the last page.
pub struct IndexAdvance {
    selector: Selector,
    click: String,
    disabled_class: String,
}

impl IndexAdvance {
    pub fn new(selector: &str, disabled_class: &str, click: Option<&str>) -> Result<Self> {
        let parsed = Selector::parse(selector).map_err(|e| {
            ScrapeError::Config(format!("pagination selector {:?}: {:?}", selector, e))
        })?;
        Ok(Self {
            selector: parsed,
            click: click.unwrap_or(selector).to_string(),
            disabled_class: disabled_class.to_string(),
        })
    }

    fn is_disabled(&self, control: ElementRef<'_>) -> bool {
        let attrs = control.value();
        if attrs.attr("disabled").is_some()
            || attrs.attr("aria-disabled") == Some("true")
        {
            return true;
        }
        // the marker often sits on the wrapping <li>, not the control itself
        std::iter::once(*control)
            .chain(control.ancestors())
            .filter_map(ElementRef::wrap)
            .any(|el| el.value().classes().any(|c| c == self.disabled_class))
    }
}

impl PageAdvance for IndexAdvance {
    fn is_available(&self, document: &Html) -> bool {
        match document.select(&self.selector).next() {
            Some(control) => !self.is_disabled(control),
            None => false,
        }
    }

    fn activate(&self, session: &mut Session<'_>) -> Result<(), BrowserError> {
        session.click(&Locator::Css(self.click.clone()))
    }
}

/// Build the advance strategy a target is configured with.
pub fn advance_for(style: &AdvanceStyle) -> Result<Box<dyn PageAdvance>> {
    Ok(match style {
        AdvanceStyle::LinkText { text } => Box::new(LinkTextAdvance::new(text)),
        AdvanceStyle::Index {
            selector,
            disabled_class,
            click,
        } => Box::new(IndexAdvance::new(
            selector,
            disabled_class,
            click.as_deref(),
        )?),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fetching,
    Advancing,
    Exhausted,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// 1-based index of the page being fetched or last fetched.
    pub page_index: usize,
    pub phase: Phase,
}

/// Walks every page of the result table:
/// fetch → inspect the advance control → activate → wait for refresh → fetch …
/// until the control reports no next page (Exhausted) or a step fails (Error).
pub struct PaginationDriver<'a> {
    extractor: &'a PageExtractor,
    advance: &'a dyn PageAdvance,
    refresh_wait: Duration,
    refresh_poll: Duration,
    max_pages: Option<usize>,
    state: PaginationState,
}

impl<'a> PaginationDriver<'a> {
    pub fn new(
        extractor: &'a PageExtractor,
        advance: &'a dyn PageAdvance,
        refresh_wait: Duration,
        refresh_poll: Duration,
    ) -> Self {
        Self {
            extractor,
            advance,
            refresh_wait,
            refresh_poll,
            max_pages: None,
            state: PaginationState {
                page_index: 1,
                phase: Phase::Fetching,
            },
        }
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    fn fail(&mut self, err: ScrapeError) -> ScrapeError {
        self.state.phase = Phase::Error;
        err
    }

    pub fn run(&mut self, session: &mut Session<'_>, ctx: &RunContext) -> Result<RawDataset> {
        let observer = session.observer();
        let mut raw: RawDataset = Vec::new();
        self.state = PaginationState {
            page_index: 1,
            phase: Phase::Fetching,
        };

        loop {
            let index = self.state.page_index;
            let here = ctx.at_page(index);

            let page = self
                .extractor
                .extract(session, &here)
                .map_err(|e| self.fail(e))?;
            observer.on_event(RunEvent::PageFetched {
                index,
                rows: page.len(),
            });

            let markup = match session.rendered_markup() {
                Ok(m) => m,
                Err(source) => {
                    return Err(self.fail(ScrapeError::Browser {
                        source,
                        context: here,
                    }))
                }
            };
            let available = self.advance.is_available(&Html::parse_document(&markup));
            raw.push(page);

            if !available {
                self.state.phase = Phase::Exhausted;
                observer.on_event(RunEvent::Exhausted { pages: raw.len() });
                return Ok(raw);
            }
            if self.max_pages.map_or(false, |max| raw.len() >= max) {
                self.state.phase = Phase::Exhausted;
                observer.on_event(RunEvent::PageCapReached { pages: raw.len() });
                return Ok(raw);
            }

            self.state.phase = Phase::Advancing;
            observer.on_event(RunEvent::Advancing { from: index });
            if let Err(e) = self.advance.activate(session) {
                return Err(self.fail(ScrapeError::Pagination {
                    detail: format!("activating the next-page control: {}", e),
                    context: here,
                }));
            }
            let previous = raw.last().map(Vec::as_slice).unwrap_or(&[]);
            if let Err(e) = self.wait_for_refresh(session, previous, &here) {
                return Err(self.fail(e));
            }

            self.state.page_index += 1;
            self.state.phase = Phase::Fetching;
        }
    }

    /// Poll until the table is back and no longer shows `previous`.
    fn wait_for_refresh(
        &self,
        session: &mut Session<'_>,
        previous: &[Vec<String>],
        ctx: &RunContext,
    ) -> Result<()> {
        let deadline = Instant::now() + self.refresh_wait;
        loop {
            let markup = session
                .rendered_markup()
                .map_err(|source| ScrapeError::Browser {
                    source,
                    context: ctx.clone(),
                })?;
            let current: Option<Page> = self.extractor.rows_in(&Html::parse_document(&markup));
            if matches!(&current, Some(rows) if rows.as_slice() != previous) {
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ScrapeError::Pagination {
                    detail: format!("table did not refresh within {:?}", self.refresh_wait),
                    context: ctx.clone(),
                });
            }
            debug!("waiting for table refresh");
            thread::sleep(self.refresh_poll.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{
        header, index_pager, next_link, no_pager, results_frame, trade, ScriptedBrowser,
        TABLE_CSS,
    };
    use crate::observe::recording::RecordingObserver;
    use pretty_assertions::assert_eq;

    const WAIT: Duration = Duration::from_millis(40);
    const POLL: Duration = Duration::from_millis(5);

    fn extractor() -> PageExtractor {
        PageExtractor::new(TABLE_CSS, WAIT).unwrap()
    }

    fn index_advance() -> IndexAdvance {
        IndexAdvance::new("ul.pagination li.pagination-next", "disabled", None).unwrap()
    }

    fn link_frames(sizes: &[usize]) -> Vec<String> {
        let mut n = 0;
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let mut rows = Vec::new();
                if i == 0 {
                    rows.push(header());
                }
                while rows.len() < size {
                    n += 1;
                    rows.push(trade(n));
                }
                let pager = if i + 1 < sizes.len() { next_link() } else { no_pager() };
                results_frame(&rows, pager)
            })
            .collect()
    }

    #[test]
    fn link_style_runs_until_the_link_disappears() {
        let obs = RecordingObserver::default();
        let (browser, script) = ScriptedBrowser::new(link_frames(&[50, 50, 12]));
        let mut session = Session::new(Box::new(browser), &obs);
        let ex = extractor();
        let adv = LinkTextAdvance::new("Next");
        let mut driver = PaginationDriver::new(&ex, &adv, WAIT, POLL);

        let raw = driver.run(&mut session, &RunContext::new("x")).unwrap();
        assert_eq!(raw.iter().map(Vec::len).collect::<Vec<_>>(), vec![50, 50, 12]);
        assert_eq!(
            driver.state(),
            PaginationState {
                page_index: 3,
                phase: Phase::Exhausted
            }
        );
        assert_eq!(script.borrow().clicks(), 2);
        assert!(obs.saw(&RunEvent::Exhausted { pages: 3 }));
        assert_eq!(obs.count(|e| matches!(e, RunEvent::PageFetched { .. })), 3);
    }

    #[test]
    fn index_style_stops_on_disabled_marker() {
        let obs = RecordingObserver::default();
        let frames = vec![
            results_frame(&[header(), trade(1)], &index_pager(false)),
            results_frame(&[header(), trade(2)], &index_pager(true)),
            // never reached
            results_frame(&[header(), trade(3)], &index_pager(true)),
        ];
        let (browser, script) = ScriptedBrowser::new(frames);
        let mut session = Session::new(Box::new(browser), &obs);
        let ex = extractor();
        let adv = index_advance();
        let mut driver = PaginationDriver::new(&ex, &adv, WAIT, POLL);

        let raw = driver.run(&mut session, &RunContext::new("x")).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(driver.state().phase, Phase::Exhausted);
        assert_eq!(script.borrow().clicks(), 1);
        assert_eq!(script.borrow().current, 1);
    }

    #[test]
    fn single_page_fetches_once() {
        let obs = RecordingObserver::default();
        let (browser, script) = ScriptedBrowser::new(link_frames(&[5]));
        let mut session = Session::new(Box::new(browser), &obs);
        let ex = extractor();
        let adv = LinkTextAdvance::new("Next");
        let mut driver = PaginationDriver::new(&ex, &adv, WAIT, POLL);

        let raw = driver.run(&mut session, &RunContext::new("x")).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(script.borrow().clicks(), 0);
        assert_eq!(driver.state().page_index, 1);
    }

    #[test]
    fn stalled_refresh_is_a_pagination_error_with_page_index() {
        let obs = RecordingObserver::default();
        let (browser, script) = ScriptedBrowser::new(link_frames(&[10, 10, 10]));
        script.borrow_mut().stall_from = Some(1);
        let mut session = Session::new(Box::new(browser), &obs);
        let ex = extractor();
        let adv = LinkTextAdvance::new("Next");
        let mut driver = PaginationDriver::new(&ex, &adv, WAIT, POLL);

        let started = Instant::now();
        let err = driver.run(&mut session, &RunContext::new("x")).unwrap_err();
        assert!(started.elapsed() >= WAIT);
        assert!(matches!(err, ScrapeError::Pagination { .. }));
        assert_eq!(err.page(), Some(2));
        assert_eq!(driver.state().phase, Phase::Error);
        // one activation per page, no retry of the stalled one
        assert_eq!(script.borrow().clicks(), 2);
    }

    #[test]
    fn page_cap_stops_early() {
        let obs = RecordingObserver::default();
        let (browser, _script) = ScriptedBrowser::new(link_frames(&[3, 3, 3, 3]));
        let mut session = Session::new(Box::new(browser), &obs);
        let ex = extractor();
        let adv = LinkTextAdvance::new("Next");
        let mut driver = PaginationDriver::new(&ex, &adv, WAIT, POLL).with_max_pages(Some(2));

        let raw = driver.run(&mut session, &RunContext::new("x")).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(driver.state().phase, Phase::Exhausted);
        assert!(obs.saw(&RunEvent::PageCapReached { pages: 2 }));
    }

    #[test]
    fn index_control_disabled_by_attribute_or_missing() {
        let adv = index_advance();
        let enabled = Html::parse_document(&index_pager(false));
        let by_class = Html::parse_document(&index_pager(true));
        let by_aria = Html::parse_document(
            r#"<ul class="pagination"><li class="pagination-next" aria-disabled="true">»</li></ul>"#,
        );
        let missing = Html::parse_document("<p>no pager</p>");
        assert!(adv.is_available(&enabled));
        assert!(!adv.is_available(&by_class));
        assert!(!adv.is_available(&by_aria));
        assert!(!adv.is_available(&missing));
    }

    #[test]
    fn link_control_matches_exact_text() {
        let adv = LinkTextAdvance::new("Next");
        assert!(adv.is_available(&Html::parse_document(next_link())));
        assert!(!adv.is_available(&Html::parse_document(no_pager())));
        assert!(!adv.is_available(&Html::parse_document("<a>Next 10</a>")));
    }

    #[test]
    fn link_control_text_is_compared_after_normalizing() {
        let adv = LinkTextAdvance::new("Next »");
        assert!(adv.is_available(&Html::parse_document("<a>\n  Next\n   <span>»</span>\n</a>")));
        assert!(adv.is_available(&Html::parse_document("<a>Next&nbsp;»</a>")));
        assert!(!adv.is_available(&Html::parse_document("<a>Next</a>")));
    }

    #[test]
    fn available_link_control_can_be_clicked() {
        let obs = RecordingObserver::default();
        let first = results_frame(
            &[header(), trade(1)],
            "<div><a href=\"#\">\n  Next\n  »</a></div>",
        );
        let second = results_frame(&[header(), trade(2)], no_pager());
        let (browser, script) = ScriptedBrowser::new(vec![first, second]);
        let mut session = Session::new(Box::new(browser), &obs);
        let ex = extractor();
        let adv = LinkTextAdvance::new("Next »");
        let mut driver = PaginationDriver::new(&ex, &adv, WAIT, POLL);

        let raw = driver.run(&mut session, &RunContext::new("x")).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(script.borrow().clicks(), 1);
    }

    #[test]
    fn strategies_follow_configuration() {
        let link = advance_for(&AdvanceStyle::LinkText {
            text: "Next".into(),
        })
        .unwrap();
        assert!(link.is_available(&Html::parse_document(next_link())));

        let index = advance_for(&AdvanceStyle::Index {
            selector: "li.pagination-next".into(),
            disabled_class: "disabled".into(),
            click: Some("li.pagination-next a".into()),
        })
        .unwrap();
        assert!(!index.is_available(&Html::parse_document(&index_pager(true))));

        let bad = advance_for(&AdvanceStyle::Index {
            selector: "li[".into(),
            disabled_class: "disabled".into(),
            click: None,
        });
        assert!(matches!(bad, Err(ScrapeError::Config(_))));
    }
}
