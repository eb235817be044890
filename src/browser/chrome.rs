// src/browser/chrome.rs

use headless_chrome::{Browser as Chrome, Element, LaunchOptions, Tab};
use std::{sync::Arc, time::Duration};
use tracing::debug;

use super::{normalize_link_text, Browser, BrowserError, Locator};

fn driver(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Driver(e.to_string())
}

/// XPath for an anchor whose text matches `text` under
/// `normalize_link_text`: no-break spaces become spaces before
/// `normalize-space` collapses the rest.
fn link_xpath(text: &str) -> String {
    let text = normalize_link_text(text);
    let anchor_text = "normalize-space(translate(., '\u{a0}', ' '))";
    if text.contains('\'') {
        format!("//a[{}=\"{}\"]", anchor_text, text)
    } else {
        format!("//a[{}='{}']", anchor_text, text)
    }
}

/// `Browser` backed by a local Chrome/Chromium driven over the DevTools
/// protocol.
pub struct ChromeBrowser {
    // keeps the browser process alive for as long as the tab is used
    _chrome: Chrome,
    tab: Arc<Tab>,
}

impl ChromeBrowser {
    /// Launch Chrome and open one tab. `page_load` bounds navigations and is
    /// also used as the idle timeout of the DevTools connection.
    pub fn launch(headless: bool, page_load: Duration) -> Result<Self, BrowserError> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .idle_browser_timeout(page_load)
            .build()
            .map_err(|e| BrowserError::Driver(format!("launch options: {}", e)))?;
        let chrome = Chrome::new(options).map_err(driver)?;
        let tab = chrome.new_tab().map_err(driver)?;
        tab.set_default_timeout(page_load);
        debug!(headless, ?page_load, "chrome launched");
        Ok(Self {
            _chrome: chrome,
            tab,
        })
    }

    fn find(&self, locator: &Locator) -> Result<Element<'_>, BrowserError> {
        let found = match locator {
            Locator::Css(css) => self.tab.find_element(css),
            Locator::XPath(xpath) => self.tab.find_element_by_xpath(xpath),
            Locator::LinkText(text) => self.tab.find_element_by_xpath(&link_xpath(text)),
        };
        found.map_err(|_| BrowserError::NotFound(locator.clone()))
    }
}

impl Browser for ChromeBrowser {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ())
            .map_err(driver)
    }

    fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        let waited = match locator {
            Locator::Css(css) => self
                .tab
                .wait_for_element_with_custom_timeout(css, timeout)
                .map(|_| ()),
            Locator::XPath(xpath) => self
                .tab
                .wait_for_xpath_with_custom_timeout(xpath, timeout)
                .map(|_| ()),
            Locator::LinkText(text) => self
                .tab
                .wait_for_xpath_with_custom_timeout(&link_xpath(text), timeout)
                .map(|_| ()),
        };
        waited.map_err(|_| BrowserError::Timeout {
            locator: locator.clone(),
            waited: timeout,
        })
    }

    fn click(&mut self, locator: &Locator) -> Result<(), BrowserError> {
        // script click: overlays on the results page swallow synthetic mouse events
        self.find(locator)?
            .call_js_fn("function() { this.click(); }", vec![], false)
            .map_err(driver)?;
        self.tab.wait_until_navigated().map_err(driver)?;
        Ok(())
    }

    fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        self.find(locator)?.type_into(text).map_err(driver)?;
        Ok(())
    }

    fn rendered_markup(&mut self) -> Result<String, BrowserError> {
        self.tab.get_content().map_err(driver)
    }

    fn close(&mut self) -> Result<(), BrowserError> {
        self.tab.close(true).map(|_| ()).map_err(driver)
    }
}
