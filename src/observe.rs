// src/observe.rs

use std::path::PathBuf;
use tracing::{error, info, warn, Span};

/// Things worth knowing about while a run progresses.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    SearchSubmitted { url: String },
    EmptyResult,
    PageFetched { index: usize, rows: usize },
    Advancing { from: usize },
    Exhausted { pages: usize },
    PageCapReached { pages: usize },
    Consolidated {
        raw_rows: usize,
        duplicates: usize,
        rows: usize,
    },
    Persisted { path: PathBuf, rows: usize },
    SessionClosed,
    SessionCloseFailed { reason: String },
    Failed { reason: String },
}

/// Receives run events. One observer is created per run and handed down the
/// call chain by reference.
pub trait RunObserver {
    fn on_event(&self, event: RunEvent);
}

/// Emits run events as `tracing` events inside a span that lives as long as
/// the run.
pub struct TracingObserver {
    span: Span,
}

impl TracingObserver {
    pub fn new(target: &str, criteria: &str) -> Self {
        Self {
            span: tracing::info_span!("run", target = %target, criteria = %criteria),
        }
    }
}

impl RunObserver for TracingObserver {
    fn on_event(&self, event: RunEvent) {
        let _guard = self.span.enter();
        match event {
            RunEvent::SearchSubmitted { url } => info!(%url, "search submitted"),
            RunEvent::EmptyResult => info!("site reports no matching records"),
            RunEvent::PageFetched { index, rows } => info!(page = index, rows, "page fetched"),
            RunEvent::Advancing { from } => info!(page = from, "advancing"),
            RunEvent::Exhausted { pages } => info!(pages, "no more pages"),
            RunEvent::PageCapReached { pages } => {
                warn!(pages, "page cap reached; stopping pagination")
            }
            RunEvent::Consolidated {
                raw_rows,
                duplicates,
                rows,
            } => info!(raw_rows, duplicates, rows, "consolidated"),
            RunEvent::Persisted { path, rows } => {
                info!(path = %path.display(), rows, "dataset written")
            }
            RunEvent::SessionClosed => info!("session closed"),
            RunEvent::SessionCloseFailed { reason } => warn!(%reason, "closing session failed"),
            RunEvent::Failed { reason } => error!(%reason, "run failed"),
        }
    }
}
