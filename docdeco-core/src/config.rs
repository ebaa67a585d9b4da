use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::console::{ClipboardPolicy, PromptMatch};
use crate::termy::WidgetOptions;

/// Transform configuration for one run. Every field has a default, so an
/// empty YAML/JSON object is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorateConfig {
    pub console: ConsoleConfig,
    pub termy: TermyConfig,
}

impl DecorateConfig {
    pub fn trace_loaded(&self) {
        info!(
            console_enabled = self.console.enabled,
            clipboard_policy = ?self.console.clipboard_policy,
            termy_enabled = self.termy.enabled,
            "Loaded DecorateConfig"
        );
        debug!(?self, "DecorateConfig loaded (full debug)");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Selects the code element of each console block.
    pub block_selector: String,
    pub prompt_match: PromptMatch,
    pub clipboard_policy: ClipboardPolicy,
    /// Attribute carrying the clipboard payload.
    pub copy_attribute: String,
    /// Generic copy button inside the `pre` container, if the theme renders one.
    pub copy_button_selector: Option<String>,
    /// Attribute through which the copy button points at the text to copy.
    pub copy_target_attribute: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_selector: "div.language-console.highlight pre code".to_string(),
            prompt_match: PromptMatch::default(),
            clipboard_policy: ClipboardPolicy::default(),
            copy_attribute: "data-clipboard-text".to_string(),
            copy_button_selector: Some("button.md-clipboard".to_string()),
            copy_target_attribute: "data-clipboard-target".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermyConfig {
    pub enabled: bool,
    /// Selects shorthand containers; the marker guard is appended to it.
    pub container_selector: String,
    /// Selects the code element inside a container.
    pub code_selector: String,
    pub marker_attribute: String,
    pub wrapper_class: String,
    pub widget: WidgetOptions,
}

impl Default for TermyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            container_selector: ".termy".to_string(),
            code_selector: "pre code".to_string(),
            marker_attribute: "data-termynal".to_string(),
            wrapper_class: "termy-wrapper".to_string(),
            widget: WidgetOptions::default(),
        }
    }
}
