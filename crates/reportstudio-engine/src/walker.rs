//! Depth-first HTML tree walker.
//!
//! Walks the typed DOM and streams format-agnostic elements into a
//! [`RenderBackend`]. The same traversal feeds both the PDF and the DOCX
//! renderer; nothing in here knows about pages or OOXML.
//!
//! Degradation rules: unparseable markup becomes one plain paragraph of
//! tag-stripped text; an element below the table quality floor is dropped;
//! unknown containers are transparent.

use tracing::debug;

use crate::dom::{parse_fragment, DomNode, Element, Tag};
use crate::element::{ListEntry, RenderBackend, TextRun};
use crate::sanitize::{collapse, sanitize, strip_glyphs, strip_tags};
use crate::table;

/// Renders an HTML fragment into the backend.
pub fn render(html: &str, backend: &mut dyn RenderBackend) {
    let nodes = parse_fragment(html);
    if !has_content(&nodes) {
        let fallback = strip_tags(html);
        if !fallback.is_empty() {
            backend.paragraph(&[TextRun::plain(fallback)]);
        }
        return;
    }
    walk_siblings(&nodes, backend);
}

fn has_content(nodes: &[DomNode]) -> bool {
    nodes.iter().any(|n| match n {
        DomNode::Element(_) => true,
        DomNode::Text(t) => !t.trim().is_empty(),
    })
}

fn walk_siblings(nodes: &[DomNode], backend: &mut dyn RenderBackend) {
    let mut skip = vec![false; nodes.len()];
    for i in 0..nodes.len() {
        if skip[i] {
            continue;
        }
        match &nodes[i] {
            DomNode::Text(t) => {
                let text = sanitize(t);
                if !text.is_empty() {
                    backend.paragraph(&[TextRun::plain(text)]);
                }
            }
            DomNode::Element(el) => {
                let eaten = dispatch_block(el, &nodes[i + 1..], backend);
                for flag in skip.iter_mut().skip(i + 1).take(eaten) {
                    *flag = true;
                }
            }
        }
    }
}

/// Per-tag dispatch. Returns how many following siblings were consumed
/// (pipe-row recovery only).
fn dispatch_block(el: &Element, following: &[DomNode], backend: &mut dyn RenderBackend) -> usize {
    match el.tag {
        Tag::Heading(level) => {
            let text = sanitize(&el.flat_text());
            if !text.is_empty() {
                backend.heading(level, &text);
            }
            0
        }
        Tag::Paragraph => {
            emit_paragraph(el, backend);
            0
        }
        Tag::Div => {
            dispatch_div(el, backend);
            0
        }
        Tag::UnorderedList => {
            emit_list(el, false, backend);
            0
        }
        Tag::OrderedList => {
            emit_list(el, true, backend);
            0
        }
        Tag::Table => {
            let (grid, eaten) = table::extract_table(el, following);
            match grid {
                Some(grid) => backend.table(&grid),
                None => debug!("dropping table below quality floor"),
            }
            eaten
        }
        Tag::Preformatted => {
            let text = strip_glyphs(&el.raw_text());
            if !text.trim().is_empty() {
                backend.code_block(text.trim_end());
            }
            0
        }
        Tag::Blockquote => {
            let text = sanitize(&el.flat_text());
            if !text.is_empty() {
                backend.blockquote(&text);
            }
            0
        }
        Tag::LineBreak => {
            backend.spacer();
            0
        }
        // Structural tags stranded outside their parent (a stray <li> or
        // <tr>) and unknown containers are transparent.
        _ => {
            walk_siblings(&el.children, backend);
            0
        }
    }
}

/// A `<div>` is first tested for the pipe-table pattern; a div holding
/// block children is a transparent container; otherwise it renders as a
/// paragraph like `<p>`.
fn dispatch_div(el: &Element, backend: &mut dyn RenderBackend) {
    if let Some(grid) = table::pipe_grid_from_text(&el.multiline_text()) {
        backend.table(&grid);
        return;
    }
    let has_block_children = el
        .children
        .iter()
        .any(|c| matches!(c, DomNode::Element(e) if e.tag.is_block()));
    if has_block_children {
        walk_siblings(&el.children, backend);
    } else {
        emit_paragraph(el, backend);
    }
}

/// Paragraph emission: empty effective content (or a lone `<br>`) becomes a
/// spacer instead of an empty paragraph.
fn emit_paragraph(el: &Element, backend: &mut dyn RenderBackend) {
    let runs = trim_runs(collect_runs(&el.children));
    let effective: String = runs.iter().map(|r| r.text.as_str()).collect();
    if effective.trim().is_empty() {
        backend.spacer();
    } else {
        backend.paragraph(&runs);
    }
}

#[derive(Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
    underline: bool,
    code: bool,
}

fn collect_runs(children: &[DomNode]) -> Vec<TextRun> {
    let mut runs = Vec::new();
    collect_runs_into(children, RunStyle::default(), None, &mut runs);
    runs
}

fn collect_runs_into(
    children: &[DomNode],
    style: RunStyle,
    href: Option<&str>,
    runs: &mut Vec<TextRun>,
) {
    for child in children {
        match child {
            DomNode::Text(t) => {
                let text = collapse(t);
                if !text.is_empty() {
                    runs.push(TextRun {
                        text,
                        bold: style.bold,
                        italic: style.italic,
                        underline: style.underline,
                        code: style.code,
                        href: href.map(str::to_string),
                    });
                }
            }
            DomNode::Element(e) => match e.tag {
                Tag::Bold => {
                    collect_runs_into(&e.children, RunStyle { bold: true, ..style }, href, runs)
                }
                Tag::Italic => {
                    collect_runs_into(&e.children, RunStyle { italic: true, ..style }, href, runs)
                }
                Tag::Underline => collect_runs_into(
                    &e.children,
                    RunStyle {
                        underline: true,
                        ..style
                    },
                    href,
                    runs,
                ),
                Tag::Code => {
                    collect_runs_into(&e.children, RunStyle { code: true, ..style }, href, runs)
                }
                Tag::Anchor => {
                    collect_runs_into(&e.children, style, e.href.as_deref().or(href), runs)
                }
                Tag::LineBreak => runs.push(TextRun::line_break()),
                // A nested <p> in inline context flushes a paragraph break.
                Tag::Paragraph => {
                    collect_runs_into(&e.children, style, href, runs);
                    runs.push(TextRun::line_break());
                    runs.push(TextRun::line_break());
                }
                _ => collect_runs_into(&e.children, style, href, runs),
            },
        }
    }
}

/// Trims leading/trailing whitespace at the paragraph edges without touching
/// the single spaces that separate adjacent runs.
fn trim_runs(mut runs: Vec<TextRun>) -> Vec<TextRun> {
    if let Some(first) = runs.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(last) = runs.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
    runs.retain(|r| !r.text.is_empty());
    runs
}

fn emit_list(el: &Element, ordered: bool, backend: &mut dyn RenderBackend) {
    let mut entries = Vec::new();
    collect_list_entries(el, ordered, 0, &mut entries);
    if !entries.is_empty() {
        backend.list(&entries);
    }
}

fn collect_list_entries(
    list_el: &Element,
    ordered: bool,
    level: usize,
    out: &mut Vec<ListEntry>,
) {
    let mut number = 1;
    for child in &list_el.children {
        let DomNode::Element(item) = child else {
            continue;
        };
        match item.tag {
            Tag::ListItem => {
                let text = sanitize(&item_text_without_sublists(item));
                if !text.is_empty() {
                    out.push(ListEntry {
                        text,
                        level,
                        ordered,
                        number,
                    });
                    if ordered {
                        number += 1;
                    }
                }
                for sub in &item.children {
                    if let DomNode::Element(e) = sub {
                        match e.tag {
                            Tag::UnorderedList => collect_list_entries(e, false, level + 1, out),
                            Tag::OrderedList => collect_list_entries(e, true, level + 1, out),
                            _ => {}
                        }
                    }
                }
            }
            // Editors occasionally nest a list directly inside a list.
            Tag::UnorderedList => collect_list_entries(item, false, level + 1, out),
            Tag::OrderedList => collect_list_entries(item, true, level + 1, out),
            _ => {}
        }
    }
}

/// Direct text of a list item, excluding its nested `ul`/`ol` subtrees.
fn item_text_without_sublists(item: &Element) -> String {
    let mut parts = Vec::new();
    gather(&item.children, &mut parts);
    fn gather(children: &[DomNode], parts: &mut Vec<String>) {
        for child in children {
            match child {
                DomNode::Text(t) => {
                    let t = t.trim();
                    if !t.is_empty() {
                        parts.push(t.to_string());
                    }
                }
                DomNode::Element(e)
                    if matches!(e.tag, Tag::UnorderedList | Tag::OrderedList) => {}
                DomNode::Element(e) => gather(&e.children, parts),
            }
        }
    }
    parts.join(" ")
}
