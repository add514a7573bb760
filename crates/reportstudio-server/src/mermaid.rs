//! Mermaid-syntax validity predicate and fence stripping.
//!
//! A pattern-matching check, not a parser: the goal is to reject responses
//! that are obviously prose before they reach the client.

use regex::Regex;
use std::sync::LazyLock;

static DIAGRAM_HEADERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)flowchart\s+(?:TD|LR|TB|RL|BT)",
        r"(?i)graph\s+(?:TD|LR|TB|RL|BT)",
        r"(?i)sequenceDiagram",
        r"(?i)classDiagram",
        r"(?i)stateDiagram",
        r"(?i)erDiagram",
        r"(?im)^\s*gantt\s*$",
        r"(?i)pie\s+(?:title|showData)",
        r"(?im)^\s*journey\s*$",
        r"(?i)gitGraph",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("BUG: hardcoded mermaid pattern is statically valid"))
    .collect()
});

/// Removes a ```` ```mermaid ```` (or bare ```` ``` ````) wrapper, keeping
/// the fenced body.
pub fn strip_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() > 2 {
            return lines[1..lines.len() - 1].join("\n").trim().to_string();
        }
    }
    trimmed.to_string()
}

/// True when the text contains a recognizable Mermaid diagram header.
pub fn is_valid_mermaid(text: &str) -> bool {
    let text = strip_fence(text);
    if text.is_empty() {
        return false;
    }
    DIAGRAM_HEADERS.iter().any(|pattern| pattern.is_match(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_common_diagram_kinds() {
        assert!(is_valid_mermaid("flowchart TD\n  A --> B"));
        assert!(is_valid_mermaid("sequenceDiagram\n  A->>B: hi"));
        assert!(is_valid_mermaid("gantt\n  title Plan"));
    }

    #[test]
    fn rejects_prose_and_empty_input() {
        assert!(!is_valid_mermaid("Here is a description of your system."));
        assert!(!is_valid_mermaid(""));
        // "elegant" must not match the gantt header.
        assert!(!is_valid_mermaid("an elegant diagram"));
    }

    #[test]
    fn strips_mermaid_fences() {
        assert_eq!(
            strip_fence("```mermaid\nflowchart TD\n  A --> B\n```"),
            "flowchart TD\n  A --> B"
        );
        assert_eq!(strip_fence("flowchart LR"), "flowchart LR");
    }

    #[test]
    fn fenced_diagram_validates() {
        assert!(is_valid_mermaid("```mermaid\ngraph LR\n  A --> B\n```"));
    }
}
