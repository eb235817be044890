// src/config/mod.rs

use chrono::format::{Item, StrftimeItems};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use url::Url;

use crate::browser::Locator;
use crate::error::{Result, ScrapeError};
use crate::process::ColumnSchema;

/// Targets compiled into the binary, by name.
static BUILTIN_TARGETS: &[(&str, &str)] = &[
    ("merolagani", include_str!("../../targets/merolagani.yaml")),
    ("nepse", include_str!("../../targets/nepse.yaml")),
];

/// Everything that differs between one paginated-table site and another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub url: String,
    pub search: SearchForm,
    /// chrono format the search input expects.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Text the site shows when the search matched nothing.
    pub empty_sentinel: String,
    /// CSS selector of the data table.
    pub table: String,
    pub pagination: AdvanceStyle,
    /// Stop after this many pages even if the site offers more.
    #[serde(default)]
    pub max_pages: Option<usize>,
    #[serde(default)]
    pub schema: ColumnSchema,
    #[serde(default)]
    pub timeouts: Timeouts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchForm {
    pub input: Locator,
    pub submit: Locator,
}

/// The "next page" idiom a site uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum AdvanceStyle {
    /// A link found by its text; gone on the last page.
    LinkText { text: String },
    /// A pager item that is always rendered and carries a disabled marker on
    /// the last page.
    Index {
        selector: String,
        #[serde(default = "default_disabled_class")]
        disabled_class: String,
        /// What to click, when it is not the item itself.
        #[serde(default)]
        click: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub element_wait_ms: u64,
    pub page_load_ms: u64,
    pub refresh_poll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element_wait_ms: 20_000,
            page_load_ms: 240_000,
            refresh_poll_ms: 250,
        }
    }
}

impl Timeouts {
    pub fn element_wait(&self) -> Duration {
        Duration::from_millis(self.element_wait_ms)
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    pub fn refresh_poll(&self) -> Duration {
        Duration::from_millis(self.refresh_poll_ms)
    }
}

fn default_date_format() -> String {
    "%m/%d/%Y".to_string()
}

fn default_disabled_class() -> String {
    "disabled".to_string()
}

fn check_selector(what: &str, css: &str) -> Result<()> {
    Selector::parse(css)
        .map(|_| ())
        .map_err(|e| ScrapeError::Config(format!("{} selector {:?}: {:?}", what, css, e)))
}

fn check_date_format(fmt: &str) -> Result<()> {
    if fmt.trim().is_empty() || StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return Err(ScrapeError::Config(format!(
            "date_format {:?} is not a valid strftime format",
            fmt
        )));
    }
    Ok(())
}

impl TargetConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: TargetConfig =
            serde_yaml::from_str(text).map_err(|e| ScrapeError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ScrapeError::Config(format!("reading {:?}: {}", path, e)))?;
        Self::from_yaml(&text)
    }

    pub fn builtin(name: &str) -> Result<Self> {
        let (_, text) = BUILTIN_TARGETS
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| {
                ScrapeError::Config(format!(
                    "unknown target {:?}; built-in targets: {}",
                    name,
                    builtin_names().join(", ")
                ))
            })?;
        Self::from_yaml(text)
    }

    /// Reject configurations that could only fail once a browser is running.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.url)
            .map_err(|e| ScrapeError::Config(format!("url {:?}: {}", self.url, e)))?;
        check_selector("table", &self.table)?;
        check_date_format(&self.date_format)?;
        for loc in [&self.search.input, &self.search.submit] {
            if let Locator::Css(css) = loc {
                check_selector("search", css)?;
            }
        }
        if let AdvanceStyle::Index {
            selector, click, ..
        } = &self.pagination
        {
            check_selector("pagination", selector)?;
            if let Some(click) = click {
                check_selector("pagination click", click)?;
            }
        }
        if self.max_pages == Some(0) {
            return Err(ScrapeError::Config("max_pages must be at least 1".into()));
        }
        let t = &self.timeouts;
        if t.element_wait_ms == 0 || t.page_load_ms == 0 || t.refresh_poll_ms == 0 {
            return Err(ScrapeError::Config("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN_TARGETS.iter().map(|(n, _)| *n).collect()
}
