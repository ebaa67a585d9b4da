use tracing::{debug, info};

use crate::config::DecorateConfig;
use crate::console::ConsoleStyler;
use crate::contract::{DecoratedPage, PageDecorator, PageReport, TerminalWidget};
use crate::document::PageDocument;
use crate::error::DecorateError;
use crate::termy::{TermynalWidget, TerminalMounter};

/// Runs the enabled transforms over one fully parsed page.
///
/// This is the page-ready handler: the console styler and the terminal
/// mounter work on disjoint elements, each runs once, console first.
pub struct Decorator<W = TermynalWidget> {
    console: Option<ConsoleStyler>,
    termy: Option<TerminalMounter>,
    widget: W,
}

impl Decorator<TermynalWidget> {
    pub fn new(config: &DecorateConfig) -> Result<Self, DecorateError> {
        Self::with_widget(config, TermynalWidget)
    }
}

impl<W: TerminalWidget> Decorator<W> {
    pub fn with_widget(config: &DecorateConfig, widget: W) -> Result<Self, DecorateError> {
        let console = match config.console.enabled {
            true => Some(ConsoleStyler::new(config.console.clone())?),
            false => None,
        };
        let termy = match config.termy.enabled {
            true => Some(TerminalMounter::new(config.termy.clone())?),
            false => None,
        };
        info!(
            console = console.is_some(),
            termy = termy.is_some(),
            "Decorator ready"
        );
        Ok(Self {
            console,
            termy,
            widget,
        })
    }

    /// Apply the transforms to an already parsed document.
    pub fn decorate_document(&self, doc: &mut PageDocument) -> PageReport {
        let mut report = PageReport::default();

        if let Some(console) = &self.console {
            let outcome = console.apply(doc);
            report.console_blocks = outcome.blocks_styled;
            report.clipboard_payloads = outcome.payloads_attached;
        }
        if let Some(termy) = &self.termy {
            let outcome = termy.apply(doc, &self.widget);
            report.termy_upgraded = outcome.upgraded;
            report.terminals_mounted = outcome.mounted;
            report.wrappers_inserted = outcome.wrapped;
        }

        debug!(?report, "Page decorated");
        report
    }
}

impl<W: TerminalWidget> PageDecorator for Decorator<W> {
    fn decorate(&self, source: &str) -> DecoratedPage {
        let mut doc = PageDocument::parse(source);
        // Compare against the re-serialized source, not the raw text, so parser
        // normalisation alone never counts as a change.
        let before = doc.to_html();
        let report = self.decorate_document(&mut doc);
        let html = doc.to_html();
        DecoratedPage {
            changed: html != before,
            html,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>t</title></head><body>
<div class="language-console highlight"><pre><code># install
$ pip install tome
Successfully installed tome</code></pre></div>
<div class="termy"><pre><code>$ tome --version
tome 1.0</code></pre></div>
</body></html>"#;

    #[test]
    fn test_decorate_runs_both_transforms() {
        let decorator = Decorator::new(&DecorateConfig::default()).unwrap();

        let page = decorator.decorate(PAGE);

        assert_eq!(
            page.report,
            PageReport {
                console_blocks: 1,
                clipboard_payloads: 1,
                termy_upgraded: 1,
                terminals_mounted: 1,
                wrappers_inserted: 1,
            }
        );
        assert!(page.html.contains(r#"<span class="console-line comment-line"># install</span>"#));
        assert!(page.html.contains(r#"data-clipboard-text="pip install tome""#));
        assert!(page.html.contains(r#"<span data-ty="input">tome --version</span>"#));
        assert!(page.html.contains(r#"<div class="termy-wrapper">"#));
    }

    #[test]
    fn test_disabled_transforms_leave_page_alone() {
        let mut config = DecorateConfig::default();
        config.console.enabled = false;
        config.termy.enabled = false;
        let decorator = Decorator::new(&config).unwrap();

        let page = decorator.decorate(PAGE);

        assert!(!page.report.is_modified());
        assert!(!page.changed);
        assert!(!page.html.contains("console-line"));
        assert!(!page.html.contains("data-termynal"));
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let decorator = Decorator::new(&DecorateConfig::default()).unwrap();
        let first = decorator.decorate(PAGE);
        assert!(first.changed);

        let second = decorator.decorate(&first.html);

        assert!(!second.changed);
        assert_eq!(second.html, first.html);
        assert_eq!(second.report.console_blocks, 0);
        assert_eq!(second.report.termy_upgraded, 0);
        assert_eq!(second.report.wrappers_inserted, 0);
        // The mounted terminal is stamped again with the same values.
        assert_eq!(second.report.terminals_mounted, 1);
        assert!(second.html.contains(r#"<span class="console-line comment-line"># install</span>"#));
        assert!(second.html.contains(r#"data-clipboard-text="pip install tome""#));
    }

    #[test]
    fn test_invalid_selector_fails_construction() {
        let mut config = DecorateConfig::default();
        config.termy.container_selector = "div[".to_string();
        assert!(matches!(
            Decorator::new(&config),
            Err(DecorateError::Selector { .. })
        ));
    }
}
