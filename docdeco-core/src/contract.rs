//! # contract: the seams of the decoration pipeline
//!
//! This module defines the traits the pipeline is written against, plus the
//! plain data types that cross them:
//!
//! - [`PageStore`]: where pages come from and where decorated pages go
//!   (a rendered site directory in production, a mock in tests).
//! - [`PageDecorator`]: turns the source of one page into decorated markup.
//! - [`TerminalWidget`]: mounts the terminal animation widget on an element.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; the mocks are exported with the
//!   `test-export-mocks` feature so integration tests and downstream crates
//!   can use them.
//!
//! ## Adding New Page Sources
//! - Implement [`PageStore`] for the new location.
//! - Report paths relative to the site root and keep them stable between
//!   `list_pages` and `write_page`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::Serialize;

use crate::document::{ElementId, PageDocument};
use crate::error::DecorateError;
use crate::termy::WidgetOptions;

/// What happened to one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub console_blocks: usize,
    pub clipboard_payloads: usize,
    pub termy_upgraded: usize,
    pub terminals_mounted: usize,
    pub wrappers_inserted: usize,
}

impl PageReport {
    /// Whether any transform found work on the page.
    ///
    /// Re-stamping an already mounted terminal counts as work, so this can be
    /// true for a page whose markup ends up unchanged. See [`DecoratedPage::changed`].
    pub fn is_modified(&self) -> bool {
        self.console_blocks > 0
            || self.clipboard_payloads > 0
            || self.termy_upgraded > 0
            || self.terminals_mounted > 0
            || self.wrappers_inserted > 0
    }
}

/// A decorated page: serialized markup plus its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedPage {
    pub html: String,
    pub report: PageReport,
    /// The serialized markup differs from the parsed source.
    pub changed: bool,
}

/// Mounts a terminal animation widget on one element.
///
/// Implementations receive the whole document so they can stamp attributes
/// or add sibling markup next to the element.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait TerminalWidget: Send + Sync {
    fn mount(&self, document: &mut PageDocument, element: ElementId, options: &WidgetOptions);
}

/// Decorates the source of a single page.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait PageDecorator: Send + Sync {
    fn decorate(&self, source: &str) -> DecoratedPage;
}

/// Source and destination of the pages of one rendered site.
///
/// Page paths are relative to the site root.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Every page to decorate, in a stable order.
    async fn list_pages(&self) -> Result<Vec<PathBuf>, DecorateError>;

    async fn read_page(&self, page: &Path) -> Result<String, DecorateError>;

    async fn write_page(&self, page: &Path, html: &str) -> Result<(), DecorateError>;
}
