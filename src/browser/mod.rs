// src/browser/mod.rs

use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use thiserror::Error;

use crate::observe::{RunEvent, RunObserver};

pub mod chrome;
#[cfg(test)]
pub(crate) mod mock;

pub use chrome::ChromeBrowser;

/// How to find an element in the rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    Css(String),
    #[serde(rename = "xpath")]
    XPath(String),
    /// An anchor whose text equals the given string once both are passed
    /// through `normalize_link_text`.
    LinkText(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css `{}`", s),
            Locator::XPath(s) => write!(f, "xpath `{}`", s),
            Locator::LinkText(s) => write!(f, "link text `{}`", s),
        }
    }
}

/// Text of a link as link-text locators compare it: runs of spaces, tabs,
/// line breaks and no-break spaces collapse to one space, ends trimmed.
pub fn normalize_link_text(text: &str) -> String {
    text.split(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{a0}'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("timed out after {waited:?} waiting for {locator}")]
    Timeout { locator: Locator, waited: Duration },
    #[error("element not found: {0}")]
    NotFound(Locator),
    #[error("{0}")]
    Driver(String),
}

/// Blocking browser automation. Every call returns once the browser reports
/// readiness or its bound elapses.
pub trait Browser {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;
    fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError>;
    fn click(&mut self, locator: &Locator) -> Result<(), BrowserError>;
    fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), BrowserError>;
    fn rendered_markup(&mut self) -> Result<String, BrowserError>;
    fn close(&mut self) -> Result<(), BrowserError>;
}

/// One live browser for one run. The browser is closed exactly once: by
/// `close`, or on drop when a run bails out early.
pub struct Session<'o> {
    browser: Box<dyn Browser>,
    observer: &'o dyn RunObserver,
    open: bool,
}

impl<'o> Session<'o> {
    pub fn new(browser: Box<dyn Browser>, observer: &'o dyn RunObserver) -> Self {
        Self {
            browser,
            observer,
            open: true,
        }
    }

    pub fn observer(&self) -> &'o dyn RunObserver {
        self.observer
    }

    pub fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.browser.navigate(url)
    }

    pub fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        self.browser.wait_for(locator, timeout)
    }

    pub fn click(&mut self, locator: &Locator) -> Result<(), BrowserError> {
        self.browser.click(locator)
    }

    pub fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        self.browser.type_text(locator, text)
    }

    pub fn rendered_markup(&mut self) -> Result<String, BrowserError> {
        self.browser.rendered_markup()
    }

    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        match self.browser.close() {
            Ok(()) => self.observer.on_event(RunEvent::SessionClosed),
            Err(e) => self.observer.on_event(RunEvent::SessionCloseFailed {
                reason: e.to_string(),
            }),
        }
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
