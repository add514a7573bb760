//! Removal of decorative glyphs and invisible spacing that rich-text editors
//! leak into report HTML.
//!
//! Typeset fonts without these glyphs render them as filled black boxes, so
//! they are stripped rather than substituted. All entry points are total
//! functions and idempotent: `sanitize(sanitize(s)) == sanitize(s)`.

use regex::Regex;
use std::sync::LazyLock;

/// Geometric Shapes (U+25A0–U+25FF) plus the neighboring block-element
/// (U+2580–U+259F) and miscellaneous-symbols (U+2B00–U+2BFF) ranges.
static DECORATIVE_GLYPHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[\u{25A0}-\u{25FF}\u{2580}-\u{259F}\u{2B00}-\u{2BFF}]")
        .expect("BUG: hardcoded glyph range is statically valid")
});

/// Zero-width spaces, joiners, word joiner, and no-break space.
static INVISIBLE_SPACING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[\u{200B}\u{200C}\u{200D}\u{2060}\u{00A0}]")
        .expect("BUG: hardcoded spacing range is statically valid")
});

static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+").expect("BUG: hardcoded whitespace pattern is statically valid")
});

/// Quill serializes list items with `data-list` attributes that confuse
/// downstream list detection; normalize them to plain `<li>`.
static LIST_ITEM_ATTRS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<li[^>]*data-list=["'](?:bullet|ordered)["'][^>]*>"#)
        .expect("BUG: hardcoded li pattern is statically valid")
});

static MARKUP_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^>]+>").expect("BUG: hardcoded tag pattern is statically valid")
});

/// Removes decorative glyphs and maps invisible spacing to plain spaces,
/// leaving all other whitespace (including newlines) intact. Used for code
/// blocks where line structure must survive.
pub fn strip_glyphs(text: &str) -> String {
    let text = DECORATIVE_GLYPHS.replace_all(text, "");
    INVISIBLE_SPACING.replace_all(&text, " ").into_owned()
}

/// `strip_glyphs` plus whitespace-run collapsing, without trimming. Used for
/// inline run fragments so the single space between adjacent runs survives.
pub fn collapse(text: &str) -> String {
    let text = strip_glyphs(text);
    WHITESPACE_RUNS.replace_all(&text, " ").into_owned()
}

/// Full sanitization: glyph strip, whitespace collapse, trim.
pub fn sanitize(text: &str) -> String {
    collapse(text).trim().to_string()
}

/// Pre-pass over a whole HTML fragment before parsing: strips decorative
/// glyphs at the source level and normalizes editor list-item attributes.
pub fn sanitize_html(html: &str) -> String {
    let html = strip_glyphs(html);
    LIST_ITEM_ATTRS.replace_all(&html, "<li>").into_owned()
}

/// Last-resort degradation for markup the parser cannot make sense of:
/// drop the tags, keep the text.
pub fn strip_tags(html: &str) -> String {
    sanitize(&MARKUP_TAGS.replace_all(html, " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn removes_squares_and_normalizes_spacing() {
        assert_eq!(sanitize("Plan\u{25A0} actions\u{25AA} done"), "Plan actions done");
    }

    #[test]
    fn maps_invisible_spacing_to_plain_space() {
        assert_eq!(sanitize("a\u{00A0}b\u{200B}c"), "a b c");
    }

    #[rstest]
    #[case("")]
    #[case("   already   messy \u{25CF} text  ")]
    #[case("plain")]
    #[case("\u{2B1B}\u{2588}")]
    fn sanitize_is_idempotent(#[case] input: &str) {
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn strip_glyphs_preserves_newlines() {
        assert_eq!(strip_glyphs("fn main() {\n    \u{25A0}ok\n}"), "fn main() {\n    ok\n}");
    }

    #[test]
    fn normalizes_quill_list_items() {
        let html = r#"<ul><li data-list="bullet" class="x">One</li></ul>"#;
        assert_eq!(sanitize_html(html), "<ul><li>One</li></ul>");
    }

    #[test]
    fn strip_tags_degrades_to_text() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
    }
}
