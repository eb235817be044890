// src/error.rs

use std::{fmt, io, path::PathBuf};
use thiserror::Error;

use crate::browser::BrowserError;

/// Where in a run an error happened: the search criteria and, once
/// pagination has started, the 1-based page index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub criteria: String,
    pub page: Option<usize>,
}

impl RunContext {
    pub fn new(criteria: impl Into<String>) -> Self {
        Self {
            criteria: criteria.into(),
            page: None,
        }
    }

    pub fn at_page(&self, page: usize) -> Self {
        Self {
            criteria: self.criteria.clone(),
            page: Some(page),
        }
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(p) => write!(f, "criteria={} page={}", self.criteria, p),
            None => write!(f, "criteria={}", self.criteria),
        }
    }
}

/// Every way a run can fail. All variants are fatal to the run; an empty
/// search result is not an error and is reported as `RunOutcome::Empty`.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("navigation timed out waiting for {control} ({context})")]
    NavigationTimeout { control: String, context: RunContext },

    #[error("table extraction failed: {detail} ({context})")]
    Extraction { detail: String, context: RunContext },

    #[error("pagination failed: {detail} ({context})")]
    Pagination { detail: String, context: RunContext },

    #[error("column {column:?} row {row}: cannot parse {value:?} as a number")]
    TypeCoercion {
        column: String,
        value: String,
        row: usize,
    },

    #[error("schema violation: {0}")]
    Schema(String),

    #[error("writing {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("browser failure: {source} ({context})")]
    Browser {
        #[source]
        source: BrowserError,
        context: RunContext,
    },

    #[error("invalid target configuration: {0}")]
    Config(String),
}

impl ScrapeError {
    /// The page index recorded in the error context, if any.
    pub fn page(&self) -> Option<usize> {
        match self {
            Self::NavigationTimeout { context, .. }
            | Self::Extraction { context, .. }
            | Self::Pagination { context, .. }
            | Self::Browser { context, .. } => context.page,
            _ => None,
        }
    }

    pub(crate) fn persist(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
