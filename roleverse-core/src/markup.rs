//! Story text formatting.
//!
//! `format_text` turns raw story text into a small, safe markup language:
//! HTML-significant characters are escaped first, then a fixed markdown
//! subset is expanded, then newlines become `<br>`. `parse_markup` reads that
//! markup back into styled segments for front ends that do not speak HTML.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));
// The opening `*` must not follow another `*`, so a half-revealed `**bold*`
// stays literal until its closing marker arrives.
static ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^*])\*([^*\n]+?)\*").expect("valid italic regex"));
static UNDERLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__(.+?)__").expect("valid underline regex"));
static STRIKETHROUGH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"~~(.+?)~~").expect("valid strikethrough regex"));
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+?)`").expect("valid code regex"));
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:-|\d+\.)[ \t]+(.*)$").expect("valid list item regex")
});

/// Escape the three characters that could open a tag or an entity.
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Format raw story text as safe markup.
///
/// Order matters: escaping runs before any markup is produced, and line
/// breaks are converted last so list items still see their lines.
pub fn format_text(raw: &str) -> String {
    let text = escape(raw);
    let text = BOLD.replace_all(&text, "<strong>${1}</strong>");
    let text = ITALIC.replace_all(&text, "${1}<em>${2}</em>");
    let text = UNDERLINE.replace_all(&text, "<u>${1}</u>");
    let text = STRIKETHROUGH.replace_all(&text, "<del>${1}</del>");
    let text = CODE.replace_all(&text, "<code>${1}</code>");
    let text = LIST_ITEM.replace_all(&text, "<li>${1}</li>");
    text.replace('\n', "<br>")
}

/// Inline styling active for a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub code: bool,
}

/// A run of text with a single style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: TextStyle,
}

/// One visual line of parsed markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupLine {
    pub segments: Vec<Segment>,
    pub list_item: bool,
}

impl MarkupLine {
    /// The line's text with all styling dropped.
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Parse markup produced by [`format_text`] into styled lines.
///
/// Only the tags `format_text` emits are understood; anything else between
/// angle brackets is dropped.
pub fn parse_markup(markup: &str) -> Vec<MarkupLine> {
    let mut lines = vec![MarkupLine::default()];
    let mut style = TextStyle::default();
    let mut text = String::new();
    let mut rest = markup;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '<' => {
                if let Some(end) = rest.find('>') {
                    flush(&mut lines, &mut text, style);
                    apply_tag(&rest[1..end], &mut style, &mut lines);
                    rest = &rest[end + 1..];
                    continue;
                }
                text.push(ch);
            }
            '&' => {
                if let Some((decoded, len)) = decode_entity(rest) {
                    text.push(decoded);
                    rest = &rest[len..];
                    continue;
                }
                text.push(ch);
            }
            _ => text.push(ch),
        }
        rest = &rest[ch.len_utf8()..];
    }

    flush(&mut lines, &mut text, style);
    lines
}

fn flush(lines: &mut [MarkupLine], text: &mut String, style: TextStyle) {
    if text.is_empty() {
        return;
    }
    if let Some(line) = lines.last_mut() {
        line.segments.push(Segment {
            text: std::mem::take(text),
            style,
        });
    }
}

fn apply_tag(tag: &str, style: &mut TextStyle, lines: &mut Vec<MarkupLine>) {
    let (closing, name) = match tag.strip_prefix('/') {
        Some(name) => (true, name),
        None => (false, tag),
    };
    let on = !closing;

    match name {
        "strong" => style.bold = on,
        "em" => style.italic = on,
        "u" => style.underline = on,
        "del" => style.strikethrough = on,
        "code" => style.code = on,
        "li" if on => {
            if let Some(line) = lines.last_mut() {
                line.list_item = true;
            }
        }
        "br" => lines.push(MarkupLine::default()),
        _ => {}
    }
}

fn decode_entity(text: &str) -> Option<(char, usize)> {
    [("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>')]
        .into_iter()
        .find(|(entity, _)| text.starts_with(entity))
        .map(|(entity, ch)| (ch, entity.len()))
}
