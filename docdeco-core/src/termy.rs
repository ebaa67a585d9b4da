//! # termy: terminal animation blocks
//!
//! A termy block is a `.termy` container around an ordinary code block that
//! uses a shorthand transcript: a line whose trimmed text starts with `$` is
//! typed input, every other line is printed output. The mounter rewrites such
//! containers into the markup the Termynal widget animates:
//!
//! ```text
//! <div data-termynal>
//!   <span data-ty="input">echo hi</span>
//!   <span data-ty>hi</span>
//! </div>
//! ```
//!
//! It then mounts the widget on every `[data-termynal]` element of the page and
//! wraps each one in a `div.termy-wrapper` exactly once.
//!
//! Both steps are idempotent. Upgraded content carries the marker attribute
//! and no longer contains a code block, and an element whose parent already
//! has the wrapper class is not wrapped again.

use serde::{Deserialize, Serialize};
use tracing::debug;

use scraper::Selector;

use crate::config::TermyConfig;
use crate::contract::TerminalWidget;
use crate::document::{compile_selector, ElementId, PageDocument};
use crate::error::DecorateError;
use crate::escape::escape_html;

const INPUT_MARKER: char = '$';

pub const LINE_DELAY_ATTRIBUTE: &str = "data-ty-linedelay";
pub const START_DELAY_ATTRIBUTE: &str = "data-ty-startdelay";
pub const TYPE_DELAY_ATTRIBUTE: &str = "data-ty-typedelay";

/// Widget construction options, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetOptions {
    /// Pause between rendered lines.
    pub line_delay_ms: u64,
    /// Pause before the animation starts.
    pub start_delay_ms: u64,
    /// Time per typed character.
    pub type_delay_ms: u64,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            line_delay_ms: 400,
            start_delay_ms: 600,
            type_delay_ms: 35,
        }
    }
}

/// Mounts Termynal by stamping its options onto the element.
///
/// Termynal's constructor falls back to `data-ty-lineDelay`,
/// `data-ty-startDelay` and `data-ty-typeDelay` when no explicit option is
/// passed, and HTML attribute names are case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermynalWidget;

impl TerminalWidget for TermynalWidget {
    fn mount(&self, document: &mut PageDocument, element: ElementId, options: &WidgetOptions) {
        document.set_attribute(element, LINE_DELAY_ATTRIBUTE, &options.line_delay_ms.to_string());
        document.set_attribute(element, START_DELAY_ATTRIBUTE, &options.start_delay_ms.to_string());
        document.set_attribute(element, TYPE_DELAY_ATTRIBUTE, &options.type_delay_ms.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermyLine<'a> {
    /// Command to be typed, marker and surrounding whitespace removed.
    Input(&'a str),
    /// Line printed as-is.
    Output(&'a str),
}

impl<'a> TermyLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.trim().strip_prefix(INPUT_MARKER) {
            Some(command) => TermyLine::Input(command.trim()),
            None => TermyLine::Output(line),
        }
    }

    pub fn render(&self, out: &mut String) {
        match self {
            TermyLine::Input(command) => out.push_str(&format!(
                r#"<span data-ty="input">{}</span>"#,
                escape_html(command)
            )),
            TermyLine::Output(line) => {
                out.push_str(&format!("<span data-ty>{}</span>", escape_html(line)))
            }
        }
    }
}

/// Build the widget markup for a block of shorthand text.
pub fn termy_markup(text: &str, marker_attribute: &str) -> String {
    let mut inner = String::with_capacity(text.len() * 2);
    for line in text.split('\n') {
        TermyLine::parse(line).render(&mut inner);
    }
    format!("<div {marker_attribute}>{inner}</div>")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MountOutcome {
    pub mounted: usize,
    pub wrapped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TermyOutcome {
    pub upgraded: usize,
    pub mounted: usize,
    pub wrapped: usize,
}

#[derive(Debug, Clone)]
pub struct TerminalMounter {
    config: TermyConfig,
    containers: Selector,
    code: Selector,
    marked: Selector,
}

impl TerminalMounter {
    pub fn new(config: TermyConfig) -> Result<Self, DecorateError> {
        let containers = compile_selector(&config.container_selector)?;
        let code = compile_selector(&config.code_selector)?;
        let marked = compile_selector(&format!("[{}]", config.marker_attribute))?;
        Ok(Self {
            config,
            containers,
            code,
            marked,
        })
    }

    /// Rewrite unmarked shorthand containers. Returns how many were rewritten.
    pub fn upgrade(&self, doc: &mut PageDocument) -> usize {
        let mut upgraded = 0;

        for container in doc.select(&self.containers) {
            if doc.attribute(container, &self.config.marker_attribute).is_some() {
                continue;
            }
            let Some(code) = doc.first_within(container, &self.code) else {
                debug!("Termy container has no code block, skipped");
                continue;
            };

            let markup = termy_markup(&doc.text_content(code), &self.config.marker_attribute);
            doc.set_inner_html(container, &markup);
            upgraded += 1;
        }

        upgraded
    }

    /// Mount the widget on every marked element and wrap it once.
    pub fn mount(&self, doc: &mut PageDocument, widget: &dyn TerminalWidget) -> MountOutcome {
        let mut outcome = MountOutcome::default();

        for element in doc.select(&self.marked) {
            widget.mount(doc, element, &self.config.widget);
            outcome.mounted += 1;

            let already_wrapped = doc
                .parent_element(element)
                .is_some_and(|parent| doc.has_class(parent, &self.config.wrapper_class));
            if already_wrapped {
                continue;
            }
            if doc.wrap_in(element, "div", &self.config.wrapper_class).is_some() {
                outcome.wrapped += 1;
            }
        }

        outcome
    }

    pub fn apply(&self, doc: &mut PageDocument, widget: &dyn TerminalWidget) -> TermyOutcome {
        let upgraded = self.upgrade(doc);
        let MountOutcome { mounted, wrapped } = self.mount(doc, widget);
        TermyOutcome {
            upgraded,
            mounted,
            wrapped,
        }
    }
}
