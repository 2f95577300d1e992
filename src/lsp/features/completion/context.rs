//! Cursor context analysis for dictionary completion
//!
//! Decides, from the text immediately before the cursor, whether completion
//! may fire and which word is being typed. Suppression rules are declarative
//! per-mode tables of regular expressions anchored at the cursor:
//!
//! - Markup: `[caption](target|` (inside a link target)
//! - Typesetting: `\command|`, `\begin{arg|`, `\usepackage[opt|` and friends
//! - HTML: `<tag attr|` (inside a tag)
//!
//! HTML additionally scans the whole document prefix for `<style>` and
//! `<script>` blocks that are still open at the cursor. Those are reported as
//! a rejected lookup rather than a plain suppression.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{trace, warn};

/// Document flavours that receive dictionary completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentMode {
    /// Markdown
    Markup,
    /// LaTeX
    Typesetting,
    Html,
}

impl DocumentMode {
    /// Maps an LSP `languageId` to a mode. Other languages get no completion.
    pub fn from_language_id(language_id: &str) -> Option<Self> {
        match language_id {
            "markdown" => Some(Self::Markup),
            "latex" | "tex" => Some(Self::Typesetting),
            "html" => Some(Self::Html),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markup => "markdown",
            Self::Typesetting => "latex",
            Self::Html => "html",
        }
    }
}

/// A completion request that cannot be answered in its context.
///
/// Distinct from an empty suggestion list: the host may treat "nothing to
/// suggest" and "lookup impossible here" differently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionRejected {
    #[error("cursor is inside an unclosed <{tag}> block")]
    UnclosedBlock { tag: &'static str },
}

/// A single cursor-anchored suppression rule.
struct ContextGuard {
    regex: Regex,
    description: &'static str,
}

impl ContextGuard {
    fn new(pattern: &str, description: &'static str) -> Option<Self> {
        match Regex::new(pattern) {
            Ok(regex) => Some(ContextGuard { regex, description }),
            Err(e) => {
                warn!("Dropping {} guard: {}", description, e);
                None
            }
        }
    }

    fn matches(&self, text_before: &str) -> bool {
        self.regex.is_match(text_before)
    }
}

static MARKUP_GUARDS: Lazy<Vec<ContextGuard>> = Lazy::new(|| {
    ContextGuard::new(r"\[[^\]]*\]\([^)]*$", "link target").into_iter().collect()
});

static TYPESETTING_GUARDS: Lazy<Vec<ContextGuard>> = Lazy::new(|| {
    [
        ContextGuard::new(r"\\[^ {\[]*$", "command name"),
        ContextGuard::new(
            r"\\(?:documentclass|usepackage|begin|end|cite|ref)(?:\{[^}]*\})?\[[^\]]*$",
            "optional argument",
        ),
        ContextGuard::new(
            r"\\(?:documentclass|usepackage|begin|end|cite|ref)(?:\[[^\]]*\])?\{[^}]*$",
            "mandatory argument",
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
});

static HTML_GUARDS: Lazy<Vec<ContextGuard>> = Lazy::new(|| {
    ContextGuard::new(r"<[^>]*$", "tag").into_iter().collect()
});

/// Blocks whose content is never prose.
const HTML_RAW_TEXT_TAGS: &[&str] = &["style", "script"];

fn guards_for(mode: DocumentMode) -> &'static [ContextGuard] {
    match mode {
        DocumentMode::Markup => MARKUP_GUARDS.as_slice(),
        DocumentMode::Typesetting => TYPESETTING_GUARDS.as_slice(),
        DocumentMode::Html => HTML_GUARDS.as_slice(),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Returns the word currently being typed: the text after the last non-word
/// character. Empty when the text ends with a separator.
pub fn extract_lookup_key(text_before: &str) -> &str {
    text_before
        .rsplit(|c: char| !is_word_char(c))
        .next()
        .unwrap_or("")
}

/// Description of the first line guard of `mode` matching `text_before`.
pub fn matching_guard(mode: DocumentMode, text_before: &str) -> Option<&'static str> {
    guards_for(mode)
        .iter()
        .find(|guard| guard.matches(text_before))
        .map(|guard| guard.description)
}

/// Name of the raw-text block left open at the end of `document_before`.
///
/// A block is open when its opening tags outnumber its closing tags.
pub fn unclosed_block(document_before: &str) -> Option<&'static str> {
    HTML_RAW_TEXT_TAGS.iter().copied().find(|tag| {
        let opened = document_before.matches(&format!("<{tag}>")).count();
        let closed = document_before.matches(&format!("</{tag}>")).count();
        opened > closed
    })
}

/// Whether completion is suppressed at the cursor.
///
/// `document_before` is only evaluated for HTML, where it must return the
/// whole document text from the start up to the cursor.
pub fn should_suppress<F>(
    mode: DocumentMode,
    text_before: &str,
    document_before: F,
) -> Result<bool, CompletionRejected>
where
    F: FnOnce() -> String,
{
    if let Some(description) = matching_guard(mode, text_before) {
        trace!("Suppressed {} completion inside {}", mode.as_str(), description);
        return Ok(true);
    }

    if mode == DocumentMode::Html {
        if let Some(tag) = unclosed_block(&document_before()) {
            return Err(CompletionRejected::UnclosedBlock { tag });
        }
    }

    Ok(false)
}
