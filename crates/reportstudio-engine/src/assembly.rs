//! Document assembly: the page shell shared by both renderer backends.
//!
//! Sequencing contract: front matter (logo, title, client, subtitle, date,
//! TOC, page break), then the configured block order, then the watermark.
//! Every per-element failure degrades to a placeholder or omission; only
//! the backend's own serialization can fail the document.

use chrono::Local;
use tracing::{debug, warn};

use crate::dom::{parse_fragment, DomNode, Tag};
use crate::element::{PlacedImage, RenderBackend, TocEntry};
use crate::image;
use crate::sanitize::{sanitize, sanitize_html};
use crate::types::{BlockKind, RenderRequest};
use crate::walker;

/// Renders a full document into the backend. Serialization happens in the
/// backend's own `finish`.
pub fn render_document(request: &RenderRequest, backend: &mut dyn RenderBackend) {
    let html = sanitize_html(&request.report.generated);
    let toc = extract_toc(&html);

    front_matter(request, &toc, backend);

    for block in &request.config.order {
        match block {
            BlockKind::Diagram => {
                // Disabled feature kept for compatibility: diagram exports
                // are supplied through the images block instead.
                debug!("diagram block is a no-op");
            }
            BlockKind::Report => {
                if !html.trim().is_empty() {
                    walker::render(&html, backend);
                }
            }
            BlockKind::Images => images_block(request, backend),
        }
    }

    if request.config.watermark {
        backend.watermark();
    }
}

/// Extracts front-matter TOC entries from `<h1>`/`<h2>` nodes in document
/// order. Deeper headings stay invisible to the TOC but render in-body.
pub fn extract_toc(html: &str) -> Vec<TocEntry> {
    let nodes = parse_fragment(html);
    let mut entries = Vec::new();
    collect_toc(&nodes, &mut entries);
    entries
}

fn collect_toc(nodes: &[DomNode], entries: &mut Vec<TocEntry>) {
    for node in nodes {
        if let DomNode::Element(el) = node {
            if let Tag::Heading(level @ (1 | 2)) = el.tag {
                let text = sanitize(&el.flat_text());
                if !text.is_empty() {
                    entries.push(TocEntry { level, text });
                }
                continue;
            }
            collect_toc(&el.children, entries);
        }
    }
}

fn front_matter(request: &RenderRequest, toc: &[TocEntry], backend: &mut dyn RenderBackend) {
    let config = &request.config;

    if let Some(logo) = config.logo.as_deref().filter(|l| !l.trim().is_empty()) {
        match image::decode_data_url(logo) {
            Ok(decoded) => {
                let (width_mm, height_mm) = image::place_logo(decoded.dimensions);
                backend.logo(&PlacedImage {
                    bytes: decoded.bytes,
                    dimensions: decoded.dimensions,
                    width_mm,
                    height_mm,
                });
            }
            Err(err) => warn!(error = %err, "skipping undecodable logo"),
        }
    }

    backend.title_line(&config.title);
    if let Some(client) = config.client.as_deref().filter(|c| !c.trim().is_empty()) {
        backend.meta_line(&format!("Client: {client}"));
    }
    if let Some(subtitle) = config.subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
        backend.meta_line(subtitle);
    }
    backend.meta_line(&format!(
        "Document created on {}",
        Local::now().format("%d/%m/%Y")
    ));

    if !toc.is_empty() {
        backend.toc(toc);
    }

    backend.page_break();
}

fn images_block(request: &RenderRequest, backend: &mut dyn RenderBackend) {
    let margins = request.config.theme.margins;
    let content_width = margins.content_width();

    for asset in &request.images {
        let title = asset.display_title();
        match image::decode_data_url(&asset.data) {
            Ok(decoded) => {
                let (width_mm, height_mm) =
                    image::place(decoded.dimensions, content_width, &margins);
                backend.image_block(
                    title,
                    Some(&PlacedImage {
                        bytes: decoded.bytes,
                        dimensions: decoded.dimensions,
                        width_mm,
                        height_mm,
                    }),
                );
            }
            Err(err) => {
                warn!(title, error = %err, "image unavailable, emitting placeholder");
                backend.image_block(title, None);
            }
        }
    }
}

/// Output filename derived from the configured title: spaces become
/// underscores, plus the format extension.
pub fn output_filename(title: &str, extension: &str) -> String {
    let base = title.trim();
    let base = if base.is_empty() { "document" } else { base };
    format!("{}.{extension}", base.replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn toc_only_sees_h1_and_h2() {
        let toc = extract_toc("<h1>Intro</h1><p>x</p><h2>Details</h2><h3>Ignored</h3>");
        assert_eq!(
            toc,
            vec![
                TocEntry {
                    level: 1,
                    text: "Intro".to_string()
                },
                TocEntry {
                    level: 2,
                    text: "Details".to_string()
                },
            ]
        );
    }

    #[test]
    fn toc_finds_headings_inside_containers() {
        let toc = extract_toc("<div><section><h2>Nested</h2></section></div>");
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].text, "Nested");
    }

    #[test]
    fn filenames_replace_spaces() {
        assert_eq!(output_filename("Weekly Review 12", "pdf"), "Weekly_Review_12.pdf");
        assert_eq!(output_filename("  ", "docx"), "document.docx");
    }
}
