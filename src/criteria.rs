// src/criteria.rs

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::{Result, ScrapeError};

static PATH_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\s]"#).expect("path-unsafe pattern should compile"));

/// Input formats accepted on the command line.
const INPUT_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// The scope of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criteria {
    Date(NaiveDate),
    /// Whatever the site shows when no date is entered.
    Latest,
}

impl Criteria {
    /// `None` or an empty string means `Latest`.
    pub fn parse(input: Option<&str>) -> Result<Self> {
        let raw = match input.map(str::trim) {
            None | Some("") => return Ok(Criteria::Latest),
            Some(s) => s,
        };
        INPUT_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .map(Criteria::Date)
            .ok_or_else(|| {
                ScrapeError::Config(format!(
                    "date {:?} is neither mm/dd/yyyy nor yyyy-mm-dd",
                    raw
                ))
            })
    }

    /// Text to type into the site's search input, if any.
    pub fn site_text(&self, date_format: &str) -> Option<String> {
        match self {
            Criteria::Date(d) => Some(d.format(date_format).to_string()),
            Criteria::Latest => None,
        }
    }

    /// Human-readable label used in logs and error context.
    pub fn label(&self, date_format: &str) -> String {
        self.site_text(date_format)
            .unwrap_or_else(|| "latest".to_string())
    }

    /// Output file stem: the label with path-unsafe characters replaced by
    /// `_`, so `09/16/2024` becomes `09_16_2024`.
    pub fn file_stem(&self, date_format: &str) -> String {
        PATH_UNSAFE
            .replace_all(&self.label(date_format), "_")
            .into_owned()
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::Date(d) => write!(f, "{}", d),
            Criteria::Latest => f.write_str("latest"),
        }
    }
}
