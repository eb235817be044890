// src/run.rs

use serde::Serialize;
use std::path::PathBuf;

use crate::browser::Browser;
use crate::config::TargetConfig;
use crate::criteria::Criteria;
use crate::error::{Result, RunContext};
use crate::fetch::{advance_for, Navigation, NavigationController, PageExtractor, PaginationDriver};
use crate::observe::{RunEvent, RunObserver};
use crate::process::consolidate;
use crate::sink::{self, SinkFormat};

/// What one scrape should do.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub target: TargetConfig,
    pub criteria: Criteria,
    pub out_dir: PathBuf,
    pub format: SinkFormat,
}

impl RunRequest {
    pub fn output_path(&self) -> PathBuf {
        sink::output_path(
            &self.out_dir,
            &self.criteria.file_stem(&self.target.date_format),
            self.format,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The dataset was written.
    Persisted { path: PathBuf, rows: usize },
    /// The site had no records for the criteria. Nothing was written.
    Empty,
}

/// Run one scrape from search to file. The browser is closed before this
/// returns, whatever the outcome.
pub fn execute(
    browser: Box<dyn Browser>,
    request: &RunRequest,
    observer: &dyn RunObserver,
) -> Result<RunOutcome> {
    let outcome = scrape(browser, request, observer);
    if let Err(e) = &outcome {
        observer.on_event(RunEvent::Failed {
            reason: e.to_string(),
        });
    }
    outcome
}

fn scrape(
    browser: Box<dyn Browser>,
    request: &RunRequest,
    observer: &dyn RunObserver,
) -> Result<RunOutcome> {
    let target = &request.target;
    let ctx = RunContext::new(request.criteria.label(&target.date_format));

    let extractor = PageExtractor::new(&target.table, target.timeouts.element_wait())?;
    let advance = advance_for(&target.pagination)?;

    let mut session = match NavigationController::new(target).open(
        browser,
        &request.criteria,
        observer,
        &ctx,
    )? {
        Navigation::Ready(session) => session,
        Navigation::Empty => return Ok(RunOutcome::Empty),
    };

    let raw = PaginationDriver::new(
        &extractor,
        advance.as_ref(),
        target.timeouts.element_wait(),
        target.timeouts.refresh_poll(),
    )
    .with_max_pages(target.max_pages)
    .run(&mut session, &ctx)?;
    session.close();

    let merged = consolidate(raw, &target.schema)?;
    observer.on_event(RunEvent::Consolidated {
        raw_rows: merged.raw_rows,
        duplicates: merged.duplicates,
        rows: merged.dataset.len(),
    });

    let path = sink::persist(&merged.dataset, &request.output_path(), request.format)?;
    let rows = merged.dataset.len();
    observer.on_event(RunEvent::Persisted {
        path: path.clone(),
        rows,
    });
    Ok(RunOutcome::Persisted { path, rows })
}
