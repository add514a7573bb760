//! Table extraction with malformed-table recovery.
//!
//! The editor sometimes serializes a Markdown table as a `<table>` with a
//! collapsed single-column structure, or as a plain run of paragraphs whose
//! text still carries the `| a | b |` framing. Recovery scans the table's
//! following siblings for such pipe rows and rebuilds the grid, consuming
//! the siblings so they are not re-emitted as paragraphs.

use tracing::debug;

use crate::dom::{DomNode, Element, Tag};
use crate::element::TableGrid;
use crate::sanitize::sanitize;

/// Quality floor: grids smaller than this are treated as parsing noise and
/// discarded. Policy constants, not laws; see DESIGN.md.
pub const MIN_TABLE_ROWS: usize = 2;
pub const MIN_TABLE_COLS: usize = 2;

/// Extracts a normalized grid from a `<table>` element.
///
/// Returns the grid (or `None` when the table is discarded) plus the number
/// of following siblings consumed by pipe-row recovery. Siblings are only
/// consumed when the recovered grid is actually emitted.
pub fn extract_table(el: &Element, following: &[DomNode]) -> (Option<TableGrid>, usize) {
    let mut header_rows: Vec<Vec<String>> = Vec::new();
    let mut body_rows: Vec<Vec<String>> = Vec::new();

    for child in &el.children {
        let DomNode::Element(section) = child else {
            continue;
        };
        match section.tag {
            Tag::TableHead => collect_rows(section, &mut header_rows),
            Tag::TableBody => collect_rows(section, &mut body_rows),
            Tag::TableRow => push_row(section, &mut body_rows),
            _ => collect_rows(section, &mut body_rows),
        }
    }

    let mut rows = header_rows;
    rows.append(&mut body_rows);
    let max_cols = rows.iter().map(Vec::len).max().unwrap_or(0);

    if rows.len() < MIN_TABLE_ROWS || max_cols < MIN_TABLE_COLS {
        debug!(
            rows = rows.len(),
            cols = max_cols,
            "table below quality floor, trying pipe-row recovery"
        );
        let (recovered, eaten) = recover_pipe_rows(following);
        let cols = recovered.iter().map(Vec::len).max().unwrap_or(0);
        if recovered.len() >= MIN_TABLE_ROWS && cols >= MIN_TABLE_COLS {
            return (Some(normalize(recovered)), eaten);
        }
        debug!("no usable pipe rows after table, discarding");
        return (None, 0);
    }

    (Some(normalize(rows)), 0)
}

/// Builds a grid from the multi-line text of a `<div>` whose paragraphs are
/// pipe rows. Returns `None` unless at least two pipe lines form a grid
/// meeting the quality floor.
pub fn pipe_grid_from_text(text: &str) -> Option<TableGrid> {
    let rows: Vec<Vec<String>> = text
        .lines()
        .filter(|line| is_pipe_row(line))
        .map(split_pipe_row)
        .collect();
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.len() >= MIN_TABLE_ROWS && cols >= MIN_TABLE_COLS {
        Some(normalize(rows))
    } else {
        None
    }
}

fn collect_rows(el: &Element, out: &mut Vec<Vec<String>>) {
    for child in &el.children {
        if let DomNode::Element(e) = child {
            match e.tag {
                Tag::TableRow => push_row(e, out),
                _ => collect_rows(e, out),
            }
        }
    }
}

fn push_row(tr: &Element, out: &mut Vec<Vec<String>>) {
    let row: Vec<String> = tr
        .children
        .iter()
        .filter_map(|child| match child {
            DomNode::Element(cell)
                if matches!(cell.tag, Tag::TableHeaderCell | Tag::TableCell) =>
            {
                Some(sanitize(&cell.flat_text()))
            }
            _ => None,
        })
        .collect();
    if !row.is_empty() {
        out.push(row);
    }
}

/// Scans forward through siblings while each is a paragraph/div whose
/// flattened text is pipe-shaped. Whitespace-only text nodes between rows
/// are skipped; anything else ends the scan.
fn recover_pipe_rows(following: &[DomNode]) -> (Vec<Vec<String>>, usize) {
    let mut rows = Vec::new();
    let mut eaten = 0;
    for (idx, node) in following.iter().enumerate() {
        match node {
            DomNode::Text(t) if t.trim().is_empty() => continue,
            DomNode::Element(e) if matches!(e.tag, Tag::Paragraph | Tag::Div) => {
                let raw = e.flat_text();
                if !is_pipe_row(&raw) {
                    break;
                }
                rows.push(split_pipe_row(&raw));
                eaten = idx + 1;
            }
            _ => break,
        }
    }
    (rows, eaten)
}

fn is_pipe_row(text: &str) -> bool {
    text.matches('|').count() >= 2
}

/// Splits on `|` and drops the empty leading/trailing cells produced by the
/// `| a | b |` framing. Interior empty cells are real and kept.
fn split_pipe_row(text: &str) -> Vec<String> {
    let mut cells: Vec<String> = text.split('|').map(sanitize).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

/// Pads every row to the widest row. The first row is always treated as the
/// header: explicit `<thead>` rows are collected first, and pipe recovery
/// defines its first row as the header.
fn normalize(mut rows: Vec<Vec<String>>) -> TableGrid {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(cols, String::new());
    }
    TableGrid {
        rows,
        has_header_row: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_fragment, DomNode};
    use pretty_assertions::assert_eq;

    fn table_and_siblings(html: &str) -> (Element, Vec<DomNode>) {
        let nodes = parse_fragment(html);
        let pos = nodes
            .iter()
            .position(|n| matches!(n, DomNode::Element(e) if e.tag == Tag::Table))
            .expect("fragment should contain a table");
        let DomNode::Element(el) = nodes[pos].clone() else {
            unreachable!()
        };
        (el, nodes[pos + 1..].to_vec())
    }

    #[test]
    fn healthy_table_is_padded_to_max_columns() {
        let (el, rest) = table_and_siblings(
            "<table><thead><tr><th>A</th><th>B</th><th>C</th></tr></thead>\
             <tbody><tr><td>1</td></tr><tr><td>2</td><td>3</td></tr></tbody></table>",
        );
        let (grid, eaten) = extract_table(&el, &rest);
        let grid = grid.expect("table should be emitted");
        assert_eq!(eaten, 0);
        assert!(grid.has_header_row);
        assert_eq!(grid.column_count(), 3);
        for row in &grid.rows {
            assert_eq!(row.len(), 3);
        }
        assert_eq!(grid.rows[1], vec!["1", "", ""]);
    }

    #[test]
    fn one_by_one_table_without_pipe_siblings_is_discarded() {
        let (el, rest) =
            table_and_siblings("<table><tr><td>only</td></tr></table><p>afterwards</p>");
        let (grid, eaten) = extract_table(&el, &rest);
        assert_eq!(grid, None);
        assert_eq!(eaten, 0);
    }

    #[test]
    fn collapsed_table_recovers_pipe_rows_from_siblings() {
        let (el, rest) = table_and_siblings(
            "<table><tr><td>broken</td></tr></table>\
             <p>| Action | Owner |</p><p>| Ship | Ana |</p><p>done</p>",
        );
        let (grid, eaten) = extract_table(&el, &rest);
        let grid = grid.expect("recovered grid should be emitted");
        assert_eq!(eaten, 2);
        assert_eq!(
            grid.rows,
            vec![vec!["Action", "Owner"], vec!["Ship", "Ana"]]
        );
    }

    #[test]
    fn single_recovered_pipe_row_is_below_the_floor() {
        let (el, rest) = table_and_siblings(
            "<table><tr><td>broken</td></tr></table><p>| lonely | row |</p>",
        );
        let (grid, eaten) = extract_table(&el, &rest);
        assert_eq!(grid, None);
        // The paragraph is not consumed, so it still renders as text.
        assert_eq!(eaten, 0);
    }

    #[test]
    fn pipe_grid_from_div_text() {
        let grid = pipe_grid_from_text("| A | B |\n| 1 | 2 |\n| 3 | 4 |")
            .expect("grid should be recovered");
        assert_eq!(
            grid.rows,
            vec![vec!["A", "B"], vec!["1", "2"], vec!["3", "4"]]
        );
    }

    #[test]
    fn framing_cells_are_dropped_but_interior_empties_kept() {
        assert_eq!(split_pipe_row("| a |  | c |"), vec!["a", "", "c"]);
        assert_eq!(split_pipe_row("a | b"), vec!["a", "b"]);
    }
}
