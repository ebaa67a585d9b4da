//! # console: styling of console transcript blocks
//!
//! A console block is a code sample written as a shell transcript: lines that
//! start with `# ` are comments, lines that start with `$ ` are commands, and
//! everything else is output. This module classifies each line, renders it as
//! an HTML span the site stylesheet can target, and derives the text a copy
//! button should place on the clipboard.
//!
//! # Markup
//! ```text
//! <span class="console-line comment-line"># setup</span>
//! <span class="console-line command-line"><span class="prompt">$</span><span class="cmd-text"> pip install foo</span></span>
//! <span class="console-line empty-line"></span>
//! <span class="console-line output-line">Done</span>
//! ```
//! Spans are concatenated without separators; the stylesheet turns each one
//! into a block.
//!
//! # Clipboard payload
//! Only command lines contribute, with the prompt stripped and the remainder
//! trimmed. See [`ClipboardPolicy`] for how several commands combine.
//!
//! A block that already holds `span.console-line` children is left alone, so
//! running the styler over its own output changes nothing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use scraper::Selector;

use crate::config::ConsoleConfig;
use crate::document::{compile_selector, ElementId, PageDocument};
use crate::error::DecorateError;
use crate::escape::escape_html;

const COMMENT_PREFIX: &str = "# ";
const PROMPT: &str = "$";
const STYLED_LINE_SELECTOR: &str = "span.console-line";

/// How a command line is recognised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMatch {
    /// The line starts with `"$ "`.
    #[default]
    Strict,
    /// The line starts with `"$"`, so `$ls` and a lone `$` count too.
    Loose,
}

/// How command lines combine into the clipboard payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardPolicy {
    /// Every command, one per line.
    #[default]
    Accumulate,
    /// Only the first command, so a multi-step sequence is never pasted at once.
    FirstOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Comment,
    Command,
    Blank,
    Output,
}

impl LineKind {
    pub fn css_class(self) -> &'static str {
        match self {
            LineKind::Comment => "comment-line",
            LineKind::Command => "command-line",
            LineKind::Blank => "empty-line",
            LineKind::Output => "output-line",
        }
    }
}

/// Classify one line. Comment wins over command, command over blank.
pub fn classify_line(line: &str, prompt: PromptMatch) -> LineKind {
    if line.starts_with(COMMENT_PREFIX) {
        LineKind::Comment
    } else if is_command(line, prompt) {
        LineKind::Command
    } else if line.is_empty() {
        LineKind::Blank
    } else {
        LineKind::Output
    }
}

fn is_command(line: &str, prompt: PromptMatch) -> bool {
    match prompt {
        PromptMatch::Strict => line.starts_with("$ "),
        PromptMatch::Loose => line.starts_with(PROMPT),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleLine<'a> {
    pub kind: LineKind,
    pub text: &'a str,
}

impl<'a> ConsoleLine<'a> {
    pub fn parse(line: &'a str, prompt: PromptMatch) -> Self {
        Self {
            kind: classify_line(line, prompt),
            text: line,
        }
    }

    /// Prompt and untouched remainder of a command line.
    pub fn split_prompt(&self) -> Option<(&'a str, &'a str)> {
        match self.kind {
            LineKind::Command => Some(self.text.split_at(PROMPT.len())),
            _ => None,
        }
    }

    /// The command as it should be pasted: prompt stripped, whitespace trimmed.
    pub fn command_text(&self) -> Option<&'a str> {
        self.split_prompt().map(|(_, rest)| rest.trim())
    }

    pub fn render(&self, out: &mut String) {
        let class = self.kind.css_class();
        match self.split_prompt() {
            Some((prompt, rest)) => out.push_str(&format!(
                r#"<span class="console-line {class}"><span class="prompt">{}</span><span class="cmd-text">{}</span></span>"#,
                escape_html(prompt),
                escape_html(rest),
            )),
            None if self.kind == LineKind::Blank => {
                out.push_str(&format!(r#"<span class="console-line {class}"></span>"#))
            }
            None => out.push_str(&format!(
                r#"<span class="console-line {class}">{}</span>"#,
                escape_html(self.text)
            )),
        }
    }
}

/// Split block text the way the browser's `split("\n")` does: a trailing
/// newline yields a trailing blank line.
pub fn parse_lines(text: &str, prompt: PromptMatch) -> Vec<ConsoleLine<'_>> {
    text.split('\n')
        .map(|line| ConsoleLine::parse(line, prompt))
        .collect()
}

/// Derive the clipboard payload. Commands with nothing after the prompt are
/// ignored; `None` means there is nothing worth copying.
pub fn clipboard_text(lines: &[ConsoleLine<'_>], policy: ClipboardPolicy) -> Option<String> {
    let mut commands = lines
        .iter()
        .filter_map(ConsoleLine::command_text)
        .filter(|command| !command.is_empty());

    let payload = match policy {
        ClipboardPolicy::Accumulate => commands.collect::<Vec<_>>().join("\n"),
        ClipboardPolicy::FirstOnly => commands.next()?.to_string(),
    };
    (!payload.is_empty()).then_some(payload)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledBlock {
    pub markup: String,
    pub clipboard: Option<String>,
}

/// Style a whole block of transcript text.
pub fn style_console_text(text: &str, config: &ConsoleConfig) -> StyledBlock {
    let lines = parse_lines(text, config.prompt_match);
    let mut markup = String::with_capacity(text.len() * 2);
    for line in &lines {
        line.render(&mut markup);
    }
    StyledBlock {
        markup,
        clipboard: clipboard_text(&lines, config.clipboard_policy),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsoleOutcome {
    pub blocks_styled: usize,
    pub payloads_attached: usize,
}

/// Applies [`style_console_text`] to every console block of a page.
#[derive(Debug, Clone)]
pub struct ConsoleStyler {
    config: ConsoleConfig,
    blocks: Selector,
    styled_line: Selector,
    copy_button: Option<Selector>,
}

impl ConsoleStyler {
    pub fn new(config: ConsoleConfig) -> Result<Self, DecorateError> {
        let blocks = compile_selector(&config.block_selector)?;
        let styled_line = compile_selector(STYLED_LINE_SELECTOR)?;
        let copy_button = config
            .copy_button_selector
            .as_deref()
            .map(compile_selector)
            .transpose()?;
        Ok(Self {
            config,
            blocks,
            styled_line,
            copy_button,
        })
    }

    pub fn apply(&self, doc: &mut PageDocument) -> ConsoleOutcome {
        let mut outcome = ConsoleOutcome::default();

        for code in doc.select(&self.blocks) {
            if doc.first_within(code, &self.styled_line).is_some() {
                debug!("Console block already styled, skipped");
                continue;
            }
            let text = doc.text_content(code);
            let styled = style_console_text(&text, &self.config);
            doc.set_inner_html(code, &styled.markup);
            outcome.blocks_styled += 1;

            let Some(payload) = styled.clipboard else {
                debug!("Console block has no command to copy");
                continue;
            };
            let Some(container) = doc.closest(code, "pre") else {
                debug!("Console block has no pre container, payload dropped");
                continue;
            };
            self.attach_payload(doc, container, &payload);
            outcome.payloads_attached += 1;
            debug!(payload_len = payload.len(), "Attached clipboard payload");
        }

        outcome
    }

    fn attach_payload(&self, doc: &mut PageDocument, container: ElementId, payload: &str) {
        if let Some(selector) = &self.copy_button {
            for button in doc.select_within(container, selector) {
                doc.remove_attribute(button, &self.config.copy_target_attribute);
                doc.set_attribute(button, &self.config.copy_attribute, payload);
            }
        }
        doc.set_attribute(container, &self.config.copy_attribute, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestCase {
        name: &'static str,
        line: &'static str,
        prompt: PromptMatch,
        expected: LineKind,
    }

    #[test]
    fn test_classify_line_table_driven() {
        let cases = vec![
            TestCase {
                name: "comment",
                line: "# setup",
                prompt: PromptMatch::Strict,
                expected: LineKind::Comment,
            },
            TestCase {
                name: "hash without space",
                line: "#setup",
                prompt: PromptMatch::Strict,
                expected: LineKind::Output,
            },
            TestCase {
                name: "command",
                line: "$ ls",
                prompt: PromptMatch::Strict,
                expected: LineKind::Command,
            },
            TestCase {
                name: "bare dollar strict",
                line: "$ls",
                prompt: PromptMatch::Strict,
                expected: LineKind::Output,
            },
            TestCase {
                name: "bare dollar loose",
                line: "$ls",
                prompt: PromptMatch::Loose,
                expected: LineKind::Command,
            },
            TestCase {
                name: "lone dollar loose",
                line: "$",
                prompt: PromptMatch::Loose,
                expected: LineKind::Command,
            },
            TestCase {
                name: "blank",
                line: "",
                prompt: PromptMatch::Strict,
                expected: LineKind::Blank,
            },
            TestCase {
                name: "whitespace only",
                line: "  ",
                prompt: PromptMatch::Strict,
                expected: LineKind::Output,
            },
            TestCase {
                name: "indented command",
                line: "  $ ls",
                prompt: PromptMatch::Strict,
                expected: LineKind::Output,
            },
            TestCase {
                name: "output",
                line: "Done",
                prompt: PromptMatch::Loose,
                expected: LineKind::Output,
            },
        ];

        for case in cases {
            assert_eq!(
                classify_line(case.line, case.prompt),
                case.expected,
                "case `{}`",
                case.name
            );
        }
    }

    #[test]
    fn test_style_console_text_example_block() {
        let styled = style_console_text(
            "# setup\n$ pip install foo\nDone",
            &ConsoleConfig::default(),
        );
        assert_eq!(
            styled.markup,
            concat!(
                r#"<span class="console-line comment-line"># setup</span>"#,
                r#"<span class="console-line command-line"><span class="prompt">$</span><span class="cmd-text"> pip install foo</span></span>"#,
                r#"<span class="console-line output-line">Done</span>"#,
            )
        );
        assert_eq!(styled.clipboard.as_deref(), Some("pip install foo"));
    }

    #[test]
    fn test_every_part_is_escaped() {
        let styled = style_console_text(
            "# <b> & co\n$ echo \"<x>\" && ls\nfoo > bar",
            &ConsoleConfig::default(),
        );
        assert!(styled.markup.contains(r#"comment-line"># &lt;b&gt; &amp; co</span>"#));
        assert!(styled
            .markup
            .contains(r#"<span class="cmd-text"> echo "&lt;x&gt;" &amp;&amp; ls</span>"#));
        assert!(styled.markup.contains(r#"output-line">foo &gt; bar</span>"#));
        // The payload is plain text, not markup.
        assert_eq!(styled.clipboard.as_deref(), Some(r#"echo "<x>" && ls"#));
    }

    #[test]
    fn test_blank_lines_have_no_content() {
        let styled = style_console_text("Done\n", &ConsoleConfig::default());
        assert_eq!(
            styled.markup,
            r#"<span class="console-line output-line">Done</span><span class="console-line empty-line"></span>"#
        );
        assert_eq!(styled.clipboard, None);
    }

    #[test]
    fn test_clipboard_never_contains_non_command_text() {
        let text = "# comment\n$ first --flag\noutput line\n\n$   second  \nmore output";
        let lines = parse_lines(text, PromptMatch::Strict);

        let all = clipboard_text(&lines, ClipboardPolicy::Accumulate).unwrap();
        assert_eq!(all, "first --flag\nsecond");
        for forbidden in ["comment", "output", "$", "#"] {
            assert!(!all.contains(forbidden), "payload leaked `{forbidden}`: {all}");
        }

        let first = clipboard_text(&lines, ClipboardPolicy::FirstOnly).unwrap();
        assert_eq!(first, "first --flag");
    }

    #[test]
    fn test_empty_commands_do_not_contribute() {
        let lines = parse_lines("$\n$ ls", PromptMatch::Loose);
        assert_eq!(lines[0].kind, LineKind::Command);
        assert_eq!(
            clipboard_text(&lines, ClipboardPolicy::FirstOnly).as_deref(),
            Some("ls")
        );
        assert_eq!(
            clipboard_text(
                &parse_lines("$ ", PromptMatch::Strict),
                ClipboardPolicy::Accumulate
            ),
            None
        );
    }

    #[test]
    fn test_loose_prompt_splits_single_character() {
        let line = ConsoleLine::parse("$make", PromptMatch::Loose);
        assert_eq!(line.split_prompt(), Some(("$", "make")));
        let mut out = String::new();
        line.render(&mut out);
        assert_eq!(
            out,
            r#"<span class="console-line command-line"><span class="prompt">$</span><span class="cmd-text">make</span></span>"#
        );
    }

    #[test]
    fn test_empty_text_is_a_single_blank_line() {
        let styled = style_console_text("", &ConsoleConfig::default());
        assert_eq!(styled.markup, r#"<span class="console-line empty-line"></span>"#);
    }

    #[test]
    fn test_styler_rewrites_block_and_attaches_payload() {
        let mut doc = PageDocument::parse_fragment(concat!(
            r#"<div class="language-console highlight"><pre>"#,
            r##"<button class="md-clipboard" data-clipboard-target="#__code_0 > code"></button>"##,
            r#"<code id="__code_0"><span class="gp">$</span> ls -la
total 0</code></pre></div>"#,
        ));
        let styler = ConsoleStyler::new(ConsoleConfig::default()).unwrap();

        let outcome = styler.apply(&mut doc);

        assert_eq!(outcome, ConsoleOutcome { blocks_styled: 1, payloads_attached: 1 });
        let pre = doc.select(&compile_selector("pre").unwrap())[0];
        let button = doc.select(&compile_selector("button").unwrap())[0];
        assert_eq!(doc.attribute(pre, "data-clipboard-text"), Some("ls -la"));
        assert_eq!(doc.attribute(button, "data-clipboard-text"), Some("ls -la"));
        assert_eq!(doc.attribute(button, "data-clipboard-target"), None);
        assert_eq!(doc.select(&compile_selector(".gp").unwrap()), vec![]);
        assert_eq!(doc.select(&compile_selector("span.command-line").unwrap()).len(), 1);
        assert_eq!(doc.select(&compile_selector("span.output-line").unwrap()).len(), 1);
    }

    #[test]
    fn test_styler_leaves_its_own_output_alone() {
        let mut doc = PageDocument::parse_fragment(
            "<div class=\"language-console highlight\"><pre><code># setup\n$ pip install foo\nDone</code></pre></div>",
        );
        let styler = ConsoleStyler::new(ConsoleConfig::default()).unwrap();
        styler.apply(&mut doc);
        let first = doc.to_html();

        let outcome = styler.apply(&mut doc);

        assert_eq!(outcome, ConsoleOutcome::default());
        assert_eq!(doc.to_html(), first);
        assert_eq!(doc.select(&compile_selector("span.console-line").unwrap()).len(), 3);
        let pre = doc.select(&compile_selector("pre").unwrap())[0];
        assert_eq!(doc.attribute(pre, "data-clipboard-text"), Some("pip install foo"));
    }

    #[test]
    fn test_styler_ignores_other_languages() {
        let source = r#"<div class="language-bash highlight"><pre><code>$ ls</code></pre></div>"#;
        let mut doc = PageDocument::parse_fragment(source);
        let styler = ConsoleStyler::new(ConsoleConfig::default()).unwrap();

        assert_eq!(styler.apply(&mut doc), ConsoleOutcome::default());
        assert_eq!(doc.to_html(), source);
    }
}
