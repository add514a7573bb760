//! Best-effort recovery of pure Markdown from an LLM response.
//!
//! Providers are prompted to return bare Markdown but frequently wrap it in
//! code fences or prepend conversational filler. This is a deterministic
//! cleanup, not a Markdown parser.

use regex::Regex;
use std::sync::LazyLock;

static TAGGED_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```markdown\s*\n(.*?)\n```")
        .expect("BUG: hardcoded fence pattern is statically valid")
});

static ANY_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[a-zA-Z0-9]*\s*\n(.*?)\n```")
        .expect("BUG: hardcoded fence pattern is statically valid")
});

static FIRST_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?sm)^(##\s+.*)").expect("BUG: hardcoded section pattern is statically valid")
});

/// Extracts the Markdown payload from a raw LLM response.
///
/// Priority: a fence tagged `markdown`, then the first fence of any kind,
/// then (when the response does not already start with a heading) everything
/// from the first `##` line onward. Falls through unchanged otherwise.
pub fn extract_markdown(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(caps) = TAGGED_FENCE.captures(trimmed) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = ANY_FENCE.captures(trimmed) {
        return caps[1].trim().to_string();
    }
    if !trimmed.starts_with('#') {
        if let Some(caps) = FIRST_SECTION.captures(trimmed) {
            return caps[1].trim().to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_tagged_fence() {
        let raw = "Here you go:\n```markdown\n## Report\ncontent\n```";
        assert_eq!(extract_markdown(raw), "## Report\ncontent");
    }

    #[test]
    fn extracts_first_untagged_fence() {
        let raw = "Sure!\n```\n## A\nbody\n```\ntrailing";
        assert_eq!(extract_markdown(raw), "## A\nbody");
    }

    #[test]
    fn recovers_from_conversational_preamble() {
        let raw = "Here is your report.\n\n## Summary\n- point";
        assert_eq!(extract_markdown(raw), "## Summary\n- point");
    }

    #[test]
    fn passes_through_clean_markdown() {
        let raw = "## Summary\n- point";
        assert_eq!(extract_markdown(raw), raw);
    }

    #[test]
    fn heading_start_is_left_alone_even_with_later_sections() {
        let raw = "# Title\nintro\n## Later";
        assert_eq!(extract_markdown(raw), raw);
    }
}
