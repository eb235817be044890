// src/browser/mock.rs
//
// Scripted browser for tests: serves a fixed list of rendered frames and
// moves to the next frame whenever a present element is clicked.

use scraper::{Html, Selector};
use std::{cell::RefCell, rc::Rc, time::Duration};

use super::{normalize_link_text, Browser, BrowserError, Locator};
use crate::config::TargetConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Navigate(String),
    WaitFor(Locator),
    Click(Locator),
    Type(Locator, String),
    Markup,
    Close,
}

#[derive(Debug, Default)]
pub struct Script {
    pub frames: Vec<String>,
    pub current: usize,
    /// Clicks made while on this frame or later leave the page unchanged.
    pub stall_from: Option<usize>,
    pub calls: Vec<Call>,
    pub closed: bool,
    pub close_calls: usize,
}

impl Script {
    fn frame(&self) -> &str {
        self.frames.get(self.current).map(String::as_str).unwrap_or("")
    }

    fn present(&self, locator: &Locator) -> bool {
        let doc = Html::parse_document(self.frame());
        match locator {
            Locator::Css(css) => Selector::parse(css)
                .map(|sel| doc.select(&sel).next().is_some())
                .unwrap_or(false),
            Locator::LinkText(text) => {
                let wanted = normalize_link_text(text);
                let anchors = Selector::parse("a").unwrap();
                doc.select(&anchors)
                    .any(|a| normalize_link_text(&a.text().collect::<String>()) == wanted)
            }
            Locator::XPath(_) => false,
        }
    }

    pub fn clicks(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Click(_)))
            .count()
    }
}

pub struct ScriptedBrowser {
    script: Rc<RefCell<Script>>,
}

impl ScriptedBrowser {
    pub fn new(frames: Vec<String>) -> (Self, Rc<RefCell<Script>>) {
        let script = Rc::new(RefCell::new(Script {
            frames,
            ..Default::default()
        }));
        (
            Self {
                script: Rc::clone(&script),
            },
            script,
        )
    }
}

impl Browser for ScriptedBrowser {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let mut s = self.script.borrow_mut();
        s.calls.push(Call::Navigate(url.to_string()));
        s.current = 0;
        Ok(())
    }

    fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        let mut s = self.script.borrow_mut();
        s.calls.push(Call::WaitFor(locator.clone()));
        if s.present(locator) {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                locator: locator.clone(),
                waited: timeout,
            })
        }
    }

    fn click(&mut self, locator: &Locator) -> Result<(), BrowserError> {
        let mut s = self.script.borrow_mut();
        s.calls.push(Call::Click(locator.clone()));
        if !s.present(locator) {
            return Err(BrowserError::NotFound(locator.clone()));
        }
        let stalled = s.stall_from.map_or(false, |from| s.current >= from);
        if !stalled && s.current + 1 < s.frames.len() {
            s.current += 1;
        }
        Ok(())
    }

    fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        let mut s = self.script.borrow_mut();
        s.calls.push(Call::Type(locator.clone(), text.to_string()));
        if s.present(locator) {
            Ok(())
        } else {
            Err(BrowserError::NotFound(locator.clone()))
        }
    }

    fn rendered_markup(&mut self) -> Result<String, BrowserError> {
        let mut s = self.script.borrow_mut();
        s.calls.push(Call::Markup);
        Ok(s.frame().to_string())
    }

    fn close(&mut self) -> Result<(), BrowserError> {
        let mut s = self.script.borrow_mut();
        s.calls.push(Call::Close);
        s.closed = true;
        s.close_calls += 1;
        Ok(())
    }
}

// ─── fixtures ──────────────────────────────────────────────────────────

pub const TABLE_CLASS: &str = "table table-bordered table-striped table-hover sortable";
pub const TABLE_CSS: &str = "table.table.table-bordered.table-striped.table-hover.sortable";
pub const SENTINEL: &str = "Could not find floorsheet matching the search criteria";

/// The merolagani target with CSS locators matching the fixture frames.
pub fn target() -> TargetConfig {
    let mut cfg = TargetConfig::builtin("merolagani").unwrap();
    cfg.search.input = Locator::Css("input#date".into());
    cfg.search.submit = Locator::Css("a#search".into());
    cfg.timeouts.element_wait_ms = 40;
    cfg.timeouts.refresh_poll_ms = 5;
    cfg
}

/// The search form as served before any criteria are applied.
pub fn search_frame() -> String {
    r#"<html><body><form>
        <input id="date" type="text"/>
        <a id="search" href="javascript:void(0)">Search</a>
    </form></body></html>"#
        .to_string()
}

pub fn empty_frame() -> String {
    format!(
        r#"<html><body><form>
        <input id="date" type="text"/>
        <a id="search" href="javascript:void(0)">Search</a>
        <div class="alert">{}</div>
    </form></body></html>"#,
        SENTINEL
    )
}

/// A results frame: the table (first row rendered with `th`) plus a pager.
pub fn results_frame(rows: &[Vec<String>], pager: &str) -> String {
    let mut html = format!(r#"<html><body><table class="{}">"#, TABLE_CLASS);
    for (i, row) in rows.iter().enumerate() {
        let tag = if i == 0 && row.first().map(String::as_str) == Some("#") {
            "th"
        } else {
            "td"
        };
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<{tag}>\r\n  {cell}\n</{tag}>"));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html.push_str(pager);
    html.push_str("</body></html>");
    html
}

pub fn next_link() -> &'static str {
    r#"<div class="pagging"><a href="javascript:__doPostBack('next','')">Next</a></div>"#
}

pub fn no_pager() -> &'static str {
    r#"<div class="pagging"><a href="javascript:__doPostBack('prev','')">Previous</a></div>"#
}

pub fn index_pager(disabled: bool) -> String {
    format!(
        r#"<ul class="pagination"><li class="pagination-next{}"><a>»</a></li></ul>"#,
        if disabled { " disabled" } else { "" }
    )
}

pub fn header() -> Vec<String> {
    ["#", "Transact. No.", "Symbol", "Buyer", "Seller", "Quantity", "Rate", "Amount"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// A floorsheet data row numbered `n`.
pub fn trade(n: usize) -> Vec<String> {
    vec![
        n.to_string(),
        format!("2024091601{:06}", n),
        "NABIL".to_string(),
        "58".to_string(),
        "34".to_string(),
        "10".to_string(),
        "1,234.50".to_string(),
        format!("{},345.00", 12 + n),
    ]
}
