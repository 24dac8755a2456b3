//! Paragraph segmentation for typewriter pacing.
//!
//! Segments only decide where the typewriter takes a longer breath. They are
//! contiguous byte ranges of the input, so joining them gives back the input
//! exactly.

use std::ops::Range;

/// A paragraph is closed once it reaches this many characters...
pub const PARAGRAPH_THRESHOLD: usize = 120;

/// ...and holds at least this many sentences.
pub const MIN_SENTENCES: usize = 2;

/// Split text into sentence units.
///
/// A unit ends at a run of newlines or at `.`, `!` or `?` followed by
/// whitespace. Trailing whitespace belongs to the unit it follows.
pub fn sentence_ranges(text: &str) -> Vec<Range<usize>> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let boundary = match ch {
            '\n' => true,
            '.' | '!' | '?' => matches!(chars.peek(), Some((_, next)) if next.is_whitespace()),
            _ => false,
        };
        if !boundary {
            continue;
        }

        let mut end = i + ch.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        units.push(start..end);
        start = end;
    }

    if start < text.len() {
        units.push(start..text.len());
    }
    units
}

/// Group sentence units into paragraphs.
pub fn paragraph_ranges(text: &str) -> Vec<Range<usize>> {
    let mut paragraphs = Vec::new();
    let mut current: Option<Range<usize>> = None;
    let mut sentences = 0;

    for unit in sentence_ranges(text) {
        if let Some(range) = current.clone() {
            let length = text[range.clone()].trim_end().chars().count();
            if length >= PARAGRAPH_THRESHOLD && sentences >= MIN_SENTENCES {
                paragraphs.push(range);
                current = None;
                sentences = 0;
            }
        }

        current = Some(match current {
            Some(range) => range.start..unit.end,
            None => unit,
        });
        sentences += 1;
    }

    if let Some(range) = current {
        paragraphs.push(range);
    }
    paragraphs
}

/// Paragraphs of `text` as string slices.
pub fn paragraphs(text: &str) -> Vec<&str> {
    paragraph_ranges(text)
        .into_iter()
        .map(|range| &text[range])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: &str = "The tavern door bursts open and a storm of rain follows the stranger inside. \
        Every conversation stops at once. She shakes the water from her cloak and scans the room \
        with pale, unblinking eyes! Somewhere behind the bar a glass shatters. Nobody moves to \
        clean it up? The fire crackles.";

    #[test]
    fn test_empty_text_has_no_paragraphs() {
        assert!(paragraphs("").is_empty());
        assert!(sentence_ranges("").is_empty());
    }

    #[test]
    fn test_sentence_boundaries() {
        let text = "Run! Now.\n\n\nWhy? Mr.Smith waits";
        let units: Vec<&str> = sentence_ranges(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(units, vec!["Run! ", "Now.\n\n\n", "Why? ", "Mr.Smith waits"]);
    }

    #[test]
    fn test_short_text_is_one_paragraph() {
        assert_eq!(paragraphs("A wolf howls. The moon rises."), vec!["A wolf howls. The moon rises."]);
    }

    #[test]
    fn test_paragraphs_reassemble_exactly() {
        for text in [LONG, "no punctuation at all", "Ends with space. ", "\n\nLeading newlines. Then text."] {
            assert_eq!(paragraphs(text).concat(), text);
        }
    }

    #[test]
    fn test_long_text_splits_on_threshold() {
        let paras = paragraphs(LONG);
        assert!(paras.len() >= 2, "expected several paragraphs, got {paras:?}");
        for paragraph in &paras[..paras.len() - 1] {
            assert!(paragraph.trim_end().chars().count() >= PARAGRAPH_THRESHOLD);
            assert!(sentence_ranges(paragraph).len() >= MIN_SENTENCES);
        }
    }

    #[test]
    fn test_single_long_sentence_waits_for_second() {
        let first = "a".repeat(200) + ". ";
        let text = format!("{first}Short. Tail.");
        let paras = paragraphs(&text);
        assert_eq!(paras[0], format!("{first}Short. "));
        assert_eq!(paras.concat(), text);
    }
}
