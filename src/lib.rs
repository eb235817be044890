// src/lib.rs
//
// Scrape a paginated HTML table behind a search form into one typed file.

pub mod browser;
pub mod config;
pub mod criteria;
pub mod error;
pub mod fetch;
pub mod observe;
pub mod process;
pub mod run;
pub mod sink;

pub use error::{Result, ScrapeError};
pub use run::{execute, RunOutcome, RunRequest};
