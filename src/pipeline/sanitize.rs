//! Sanitization: turn engine Markdown into plain text.
//!
//! The engine output is structurally rich Markdown. Plain-text consumers
//! (search indexers, embedding jobs, text-to-speech) want the words without
//! the markup, and they want a predictable character set. This module is an
//! ordered list of textual rules; it never builds a syntax tree, so malformed
//! or deeply nested Markdown comes out over- or under-stripped rather than
//! failing.
//!
//! ## Rule Order
//!
//! Order is load-bearing. Bold runs before italic so `**x**` is not read as
//! two empty italics; links run before images, so `![alt](url)` loses its
//! brackets to the link rule first and keeps a literal `!`; inline code only
//! matches within a line, so the fence rule still sees the triple backticks it
//! has to remove; and the allowlist runs after every Markdown rule but before
//! whitespace collapsing, so any stray `*`, `_`, or `#` the earlier rules left
//! behind is silently dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which letters and digits survive the allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    /// `a-z`, `A-Z`, `0-9` only. (default)
    #[default]
    Ascii,
    /// Alphabetic and numeric characters of any script.
    Unicode,
}

/// Knobs for [`sanitize_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeOptions {
    pub charset: Charset,
}

/// Punctuation kept by the allowlist, in addition to letters, digits and whitespace.
pub const ALLOWED_PUNCTUATION: &[char] = &['.', ',', '!', '?', ':', ';', '-', '(', ')', '"', '\''];

/// Strip Markdown syntax and restrict the result to the default allowlist.
///
/// Total: every input, including the empty string, produces a string.
///
/// ```rust
/// use doc2text::sanitize;
///
/// assert_eq!(
///     sanitize("# Title\n\nSome **bold** and *italic* text."),
///     "Title\n\nSome bold and italic text."
/// );
/// ```
pub fn sanitize(text: &str) -> String {
    sanitize_with(text, &SanitizeOptions::default())
}

/// [`sanitize`] with an explicit character set.
///
/// Runs in a single pass, linear in the input length. The last step settles
/// list markers, rules and blank lines that only appear once earlier rules
/// have removed tags, symbols or indentation, so the result is already a
/// fixpoint: `sanitize_with(sanitize_with(x)) == sanitize_with(x)`.
pub fn sanitize_with(text: &str, opts: &SanitizeOptions) -> String {
    if text.is_empty() {
        return String::new();
    }

    let s = normalise_line_endings(text);
    let s = strip_headers(&s);
    let s = strip_bold(&s);
    let s = strip_italic(&s);
    let s = strip_bold_alt(&s);
    let s = strip_italic_alt(&s);
    let s = strip_links(&s);
    let s = strip_images(&s);
    let s = strip_inline_code(&s);
    let s = strip_code_blocks(&s);
    let s = strip_blockquotes(&s);
    let s = strip_list_markers(&s);
    let s = strip_horizontal_rules(&s);
    let s = strip_html_tags(&s);
    let s = filter_allowed_chars(&s, opts.charset);
    let s = collapse_spaces(&s);
    let s = collapse_blank_lines(&s);
    let s = trim_lines(&s);
    settle(&s).trim().to_string()
}

// ── Line endings ─────────────────────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 1: Headers ──────────────────────────────────────────────────────────

static RE_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());

fn strip_headers(input: &str) -> String {
    RE_HEADER.replace_all(input, "").into_owned()
}

// ── Rules 2–5: Emphasis ──────────────────────────────────────────────────────

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static RE_BOLD_ALT: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_\n]+)__").unwrap());
static RE_ITALIC_ALT: Lazy<Regex> = Lazy::new(|| Regex::new(r"_([^_\n]+)_").unwrap());

fn strip_bold(input: &str) -> String {
    RE_BOLD.replace_all(input, "$1").into_owned()
}

fn strip_italic(input: &str) -> String {
    RE_ITALIC.replace_all(input, "$1").into_owned()
}

fn strip_bold_alt(input: &str) -> String {
    RE_BOLD_ALT.replace_all(input, "$1").into_owned()
}

fn strip_italic_alt(input: &str) -> String {
    RE_ITALIC_ALT.replace_all(input, "$1").into_owned()
}

// ── Rules 6–7: Links and images ──────────────────────────────────────────────

static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]+\)").unwrap());

fn strip_links(input: &str) -> String {
    RE_LINK.replace_all(input, "$1").into_owned()
}

fn strip_images(input: &str) -> String {
    RE_IMAGE.replace_all(input, "$1").into_owned()
}

// ── Rules 8–9: Code ──────────────────────────────────────────────────────────

static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static RE_CODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());

fn strip_inline_code(input: &str) -> String {
    RE_INLINE_CODE.replace_all(input, "$1").into_owned()
}

fn strip_code_blocks(input: &str) -> String {
    RE_CODE_BLOCK.replace_all(input, "").into_owned()
}

// ── Rules 10–12: Block prefixes ──────────────────────────────────────────────

static RE_BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^>\s+").unwrap());
// A run of bullet and ordered markers, `- 1. * item`, goes in one match.
// The gap after a marker never crosses a line break.
static RE_LIST_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:(?:[-*+]|\d+\.)[^\S\n]+)+").unwrap());
static RE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[-*_]{3,}$").unwrap());

fn strip_blockquotes(input: &str) -> String {
    RE_BLOCKQUOTE.replace_all(input, "").into_owned()
}

fn strip_list_markers(input: &str) -> String {
    RE_LIST_MARKERS.replace_all(input, "").into_owned()
}

fn strip_horizontal_rules(input: &str) -> String {
    RE_RULE.replace_all(input, "").into_owned()
}

// ── Rule 13: HTML tags ───────────────────────────────────────────────────────

static RE_HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

fn strip_html_tags(input: &str) -> String {
    RE_HTML_TAG.replace_all(input, "").into_owned()
}

// ── Rule 14: Character allowlist ─────────────────────────────────────────────

fn is_allowed(c: char, charset: Charset) -> bool {
    let word_char = match charset {
        Charset::Ascii => c.is_ascii_alphanumeric(),
        Charset::Unicode => c.is_alphanumeric(),
    };
    word_char || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(&c)
}

fn filter_allowed_chars(input: &str, charset: Charset) -> String {
    input.chars().filter(|&c| is_allowed(c, charset)).collect()
}

// ── Rules 15–18: Whitespace ──────────────────────────────────────────────────

static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_spaces(input: &str) -> String {
    RE_SPACES.replace_all(input, " ").into_owned()
}

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

fn trim_lines(input: &str) -> String {
    input.split('\n').map(str::trim).collect::<Vec<_>>().join("\n")
}

// ── Settle ───────────────────────────────────────────────────────────────────

/// Re-apply the line-prefix rules to trimmed lines.
///
/// `<b>-</b> x`, `@ - x` and `  - nested` only start with a list marker after
/// tag removal, the allowlist or trimming. Removing a marker or a rule never
/// exposes another one, and blank lines are collapsed once more because
/// whitespace-only lines became empty during trimming.
fn settle(input: &str) -> String {
    let s = strip_list_markers(input);
    let s = strip_horizontal_rules(&s);
    collapse_blank_lines(&s)
}

// ── Tests ────────────────────────────────────────────────────────────────────
