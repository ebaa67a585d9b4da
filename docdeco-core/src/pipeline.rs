//! High-level pipeline: list → read → decorate → write for every page of a site.
//!
//! # Responsibilities
//! - Walk every page the [`PageStore`] reports, one after the other, in its order
//! - Hand each page to a [`PageDecorator`] and keep its [`PageReport`]
//! - Write back only pages whose markup changed, unless running dry
//! - Fail fast: the first store error stops the run and is returned
//!
//! # Navigation
//! - Main entrypoint: [`decorate_site`]
//! - Supporting types: [`PipelineOptions`], [`SiteReport`]

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::contract::{PageDecorator, PageReport, PageStore};
use crate::error::DecorateError;

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Decorate and report, but never write.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteReport {
    pub pages: Vec<PageEntry>,
    pub pages_modified: usize,
    pub pages_written: usize,
    pub totals: PageReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    pub path: PathBuf,
    /// Decoration changed the page markup.
    pub modified: bool,
    pub written: bool,
    #[serde(flatten)]
    pub report: PageReport,
}

impl SiteReport {
    fn record(&mut self, entry: PageEntry) {
        let report = &entry.report;
        self.totals.console_blocks += report.console_blocks;
        self.totals.clipboard_payloads += report.clipboard_payloads;
        self.totals.termy_upgraded += report.termy_upgraded;
        self.totals.terminals_mounted += report.terminals_mounted;
        self.totals.wrappers_inserted += report.wrappers_inserted;
        if entry.modified {
            self.pages_modified += 1;
        }
        if entry.written {
            self.pages_written += 1;
        }
        self.pages.push(entry);
    }
}

pub async fn decorate_site<S, D>(
    store: &S,
    decorator: &D,
    options: &PipelineOptions,
) -> Result<SiteReport, DecorateError>
where
    S: PageStore + ?Sized,
    D: PageDecorator + ?Sized,
{
    info!(dry_run = options.dry_run, "[DECORATE] Starting site decoration");

    let pages = store.list_pages().await.map_err(|e| {
        error!(error = %e, "[DECORATE][ERROR] Failed to list pages");
        e
    })?;

    let mut report = SiteReport::default();
    for page in pages {
        debug!(page = %page.display(), "[DECORATE] Reading page");
        let source = store.read_page(&page).await.map_err(|e| {
            error!(page = %page.display(), error = %e, "[DECORATE][ERROR] Failed to read page");
            e
        })?;

        let decorated = decorator.decorate(&source);
        let write = decorated.changed && !options.dry_run;
        if write {
            store
                .write_page(&page, &decorated.html)
                .await
                .map_err(|e| {
                    error!(page = %page.display(), error = %e, "[DECORATE][ERROR] Failed to write page");
                    e
                })?;
            info!(page = %page.display(), report = ?decorated.report, "[DECORATE] Page decorated");
        } else {
            debug!(page = %page.display(), changed = decorated.changed, "[DECORATE] Page left untouched");
        }

        report.record(PageEntry {
            path: page,
            modified: decorated.changed,
            written: write,
            report: decorated.report,
        });
    }

    info!(
        pages = report.pages.len(),
        modified = report.pages_modified,
        written = report.pages_written,
        "[DECORATE] Site decoration complete"
    );
    Ok(report)
}
