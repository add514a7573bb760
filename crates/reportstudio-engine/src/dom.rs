//! Typed view of the report HTML fragment.
//!
//! Tag classification happens once, at parse time; the walker dispatches on
//! the closed [`Tag`] enum instead of re-matching tag-name strings at every
//! recursion step. Anything unrecognized becomes [`Tag::Other`] and is
//! treated as a transparent container.

use scraper::node::Node as HtmlNode;
use scraper::Html;

/// Nesting deeper than this degrades to flat text instead of recursing.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Heading(u8),
    Paragraph,
    Div,
    UnorderedList,
    OrderedList,
    ListItem,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableHeaderCell,
    TableCell,
    Preformatted,
    Blockquote,
    LineBreak,
    Bold,
    Italic,
    Underline,
    Code,
    Anchor,
    Other,
}

impl Tag {
    fn classify(name: &str) -> Tag {
        match name {
            "h1" => Tag::Heading(1),
            "h2" => Tag::Heading(2),
            "h3" => Tag::Heading(3),
            "h4" => Tag::Heading(4),
            "h5" => Tag::Heading(5),
            "h6" => Tag::Heading(6),
            "p" => Tag::Paragraph,
            "div" => Tag::Div,
            "ul" => Tag::UnorderedList,
            "ol" => Tag::OrderedList,
            "li" => Tag::ListItem,
            "table" => Tag::Table,
            "thead" => Tag::TableHead,
            "tbody" | "tfoot" => Tag::TableBody,
            "tr" => Tag::TableRow,
            "th" => Tag::TableHeaderCell,
            "td" => Tag::TableCell,
            "pre" => Tag::Preformatted,
            "blockquote" => Tag::Blockquote,
            "br" => Tag::LineBreak,
            "strong" | "b" => Tag::Bold,
            "em" | "i" => Tag::Italic,
            "u" => Tag::Underline,
            "code" => Tag::Code,
            "a" => Tag::Anchor,
            _ => Tag::Other,
        }
    }

    /// Block-level tags establish line boundaries in flattened text and make
    /// a `div` behave as a container rather than a paragraph.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Tag::Heading(_)
                | Tag::Paragraph
                | Tag::Div
                | Tag::UnorderedList
                | Tag::OrderedList
                | Tag::ListItem
                | Tag::Table
                | Tag::TableHead
                | Tag::TableBody
                | Tag::TableRow
                | Tag::Preformatted
                | Tag::Blockquote
        )
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: Tag,
    pub href: Option<String>,
    pub children: Vec<DomNode>,
}

#[derive(Debug, Clone)]
pub enum DomNode {
    Element(Element),
    Text(String),
}

impl Element {
    /// All descendant text joined with single spaces, in document order.
    pub fn flat_text(&self) -> String {
        let mut parts = Vec::new();
        collect_text_parts(&self.children, &mut parts);
        parts.join(" ")
    }

    /// Descendant text with newlines at block and `<br>` boundaries. Used by
    /// the pipe-table-in-a-div detection, which needs one line per source
    /// paragraph.
    pub fn multiline_text(&self) -> String {
        let mut lines = vec![String::new()];
        collect_lines(&self.children, &mut lines);
        let lines: Vec<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        lines.join("\n")
    }

    /// Raw descendant text with source whitespace preserved. Used for code
    /// blocks where line structure matters.
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        collect_raw(&self.children, &mut out);
        out
    }
}

fn collect_text_parts(children: &[DomNode], parts: &mut Vec<String>) {
    for child in children {
        match child {
            DomNode::Text(t) => {
                let t = t.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            DomNode::Element(e) => collect_text_parts(&e.children, parts),
        }
    }
}

fn collect_lines(children: &[DomNode], lines: &mut Vec<String>) {
    for child in children {
        match child {
            DomNode::Text(t) => {
                if let Some(last) = lines.last_mut() {
                    if !last.is_empty() && !last.ends_with(' ') {
                        last.push(' ');
                    }
                    last.push_str(t.trim());
                }
            }
            DomNode::Element(e) if e.tag == Tag::LineBreak => lines.push(String::new()),
            DomNode::Element(e) if e.tag.is_block() => {
                lines.push(String::new());
                collect_lines(&e.children, lines);
                lines.push(String::new());
            }
            DomNode::Element(e) => collect_lines(&e.children, lines),
        }
    }
}

fn collect_raw(children: &[DomNode], out: &mut String) {
    for child in children {
        match child {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(e) if e.tag == Tag::LineBreak => out.push('\n'),
            DomNode::Element(e) => collect_raw(&e.children, out),
        }
    }
}

/// Parses an HTML fragment into the typed tree. Never fails: html5ever
/// recovers from arbitrary markup, and anything beyond the recursion ceiling
/// is flattened to text.
pub fn parse_fragment(html: &str) -> Vec<DomNode> {
    let doc = Html::parse_fragment(html);
    let root = doc.tree.root();
    let mut out = Vec::new();
    for child in root.children() {
        // parse_fragment wraps content in a synthetic <html> element.
        if let HtmlNode::Element(el) = child.value() {
            if el.name() == "html" {
                for grandchild in child.children() {
                    convert(grandchild, 0, &mut out);
                }
                continue;
            }
        }
        convert(child, 0, &mut out);
    }
    out
}

fn convert(node: ego_tree::NodeRef<'_, HtmlNode>, depth: usize, out: &mut Vec<DomNode>) {
    match node.value() {
        HtmlNode::Text(text) => {
            if !text.is_empty() {
                out.push(DomNode::Text(text.to_string()));
            }
        }
        HtmlNode::Element(el) => {
            if depth >= MAX_DEPTH {
                let text = subtree_text(node);
                if !text.trim().is_empty() {
                    out.push(DomNode::Text(text));
                }
                return;
            }
            let tag = Tag::classify(el.name());
            let href = match tag {
                Tag::Anchor => el.attr("href").map(str::to_string),
                _ => None,
            };
            let mut children = Vec::new();
            for child in node.children() {
                convert(child, depth + 1, &mut children);
            }
            out.push(DomNode::Element(Element { tag, href, children }));
        }
        // Comments, doctypes, processing instructions carry no content.
        _ => {}
    }
}

fn subtree_text(node: ego_tree::NodeRef<'_, HtmlNode>) -> String {
    let mut parts = Vec::new();
    for descendant in node.descendants() {
        if let HtmlNode::Text(text) = descendant.value() {
            let t = text.trim();
            if !t.is_empty() {
                parts.push(t.to_string());
            }
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn first_element(nodes: &[DomNode]) -> &Element {
        nodes
            .iter()
            .find_map(|n| match n {
                DomNode::Element(e) => Some(e),
                DomNode::Text(_) => None,
            })
            .expect("fragment should contain an element")
    }

    #[test]
    fn classifies_tags_once_at_parse_time() {
        let nodes = parse_fragment("<h2>Title</h2>");
        assert_eq!(first_element(&nodes).tag, Tag::Heading(2));
    }

    #[test]
    fn anchor_keeps_href() {
        let nodes = parse_fragment(r#"<a href="https://example.com">x</a>"#);
        let el = first_element(&nodes);
        assert_eq!(el.tag, Tag::Anchor);
        assert_eq!(el.href.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn unknown_tags_become_other() {
        let nodes = parse_fragment("<section><p>x</p></section>");
        assert_eq!(first_element(&nodes).tag, Tag::Other);
    }

    #[test]
    fn multiline_text_splits_on_block_children() {
        let nodes = parse_fragment("<div><p>| A | B |</p><p>| 1 | 2 |</p></div>");
        let el = first_element(&nodes);
        assert_eq!(el.multiline_text(), "| A | B |\n| 1 | 2 |");
    }

    #[test]
    fn pathological_nesting_degrades_to_text() {
        let mut html = String::new();
        for _ in 0..200 {
            html.push_str("<div>");
        }
        html.push_str("deep");
        for _ in 0..200 {
            html.push_str("</div>");
        }
        // Must not overflow the stack, and the text must survive.
        let nodes = parse_fragment(&html);
        let mut flat = String::new();
        fn gather(nodes: &[DomNode], out: &mut String) {
            for n in nodes {
                match n {
                    DomNode::Text(t) => out.push_str(t),
                    DomNode::Element(e) => gather(&e.children, out),
                }
            }
        }
        gather(&nodes, &mut flat);
        assert!(flat.contains("deep"));
    }
}
