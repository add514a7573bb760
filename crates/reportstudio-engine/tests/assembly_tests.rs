mod common;

use common::{Event, RecordingBackend};
use pretty_assertions::assert_eq;
use reportstudio_engine::{assembly, RenderRequest};

// 1x1 transparent PNG.
const TINY_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn request(json: serde_json::Value) -> RenderRequest {
    serde_json::from_value(json).expect("valid request payload")
}

fn render(request: &RenderRequest) -> RecordingBackend {
    let mut backend = RecordingBackend::default();
    assembly::render_document(request, &mut backend);
    backend
}

#[test]
fn end_to_end_block_ordering() {
    let req = request(serde_json::json!({
        "report": { "generated": "<h1>Title</h1><ul><li>One</li><li>Two</li></ul>" },
        "images": [ { "dataUrl": TINY_PNG, "title": "Diagram" } ],
        "pdfConfig": { "title": "Quarterly", "order": ["report", "images"] }
    }));
    let backend = render(&req);
    let events = &backend.events;

    // Front matter: title, generated-date line, TOC, page break.
    assert_eq!(events[0], Event::TitleLine("Quarterly".to_string()));
    let Event::MetaLine(date_line) = &events[1] else {
        panic!("expected the generated-date line, got {:?}", events[1]);
    };
    assert!(date_line.starts_with("Document created on "));
    let Event::Toc(toc) = &events[2] else {
        panic!("expected TOC, got {:?}", events[2]);
    };
    assert_eq!(toc.len(), 1);
    assert_eq!(toc[0].text, "Title");
    assert_eq!(events[3], Event::PageBreak);

    // Report block, then images block, in the configured order.
    assert_eq!(events[4], Event::Heading(1, "Title".to_string()));
    let Event::List(entries) = &events[5] else {
        panic!("expected the list, got {:?}", events[5]);
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "One");
    assert_eq!(entries[1].text, "Two");
    assert!(!entries[0].ordered);
    assert_eq!(
        events[6],
        Event::ImageBlock {
            title: "Diagram".to_string(),
            has_image: true
        }
    );
    assert_eq!(events.len(), 7);
}

#[test]
fn failed_image_still_emits_heading_with_placeholder() {
    let req = request(serde_json::json!({
        "images": [ { "data": "not-a-data-url", "title": "Architecture" } ],
        "pdfConfig": { "order": ["images"] }
    }));
    let backend = render(&req);
    assert!(backend.events.contains(&Event::ImageBlock {
        title: "Architecture".to_string(),
        has_image: false
    }));
}

#[test]
fn image_title_resolution_priority() {
    let req = request(serde_json::json!({
        "images": [
            { "dataUrl": TINY_PNG, "caption": "From Caption" },
            { "dataUrl": TINY_PNG, "name": "file.png" },
            { "dataUrl": TINY_PNG }
        ],
        "pdfConfig": { "order": ["images"] }
    }));
    let backend = render(&req);
    let titles: Vec<&str> = backend
        .events
        .iter()
        .filter_map(|e| match e {
            Event::ImageBlock { title, .. } => Some(title.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(titles, vec!["From Caption", "file.png", "Image"]);
}

#[test]
fn diagram_block_is_a_no_op() {
    let req = request(serde_json::json!({
        "report": { "generated": "<p>body</p>" },
        "pdfConfig": { "title": "T", "order": ["diagram"] }
    }));
    let backend = render(&req);
    // Front matter only: title, date line, page break. No report content.
    assert_eq!(
        backend.events.last(),
        Some(&Event::PageBreak),
        "diagram block must contribute nothing after front matter"
    );
    assert!(backend.paragraph_texts().is_empty());
}

#[test]
fn watermark_is_appended_last_when_enabled() {
    let req = request(serde_json::json!({
        "report": { "generated": "<p>body</p>" },
        "pdfConfig": { "watermark": true, "order": ["report"] }
    }));
    let backend = render(&req);
    assert_eq!(backend.events.last(), Some(&Event::Watermark));
}

#[test]
fn client_and_subtitle_lines_render_in_order() {
    let req = request(serde_json::json!({
        "pdfConfig": { "title": "T", "client": "ACME", "subtitle": "Q3", "order": [] }
    }));
    let backend = render(&req);
    assert_eq!(backend.events[0], Event::TitleLine("T".to_string()));
    assert_eq!(backend.events[1], Event::MetaLine("Client: ACME".to_string()));
    assert_eq!(backend.events[2], Event::MetaLine("Q3".to_string()));
}

#[test]
fn logo_failure_is_not_fatal() {
    let req = request(serde_json::json!({
        "pdfConfig": { "logo": "data:image/png;base64,@@@broken@@@", "order": [] }
    }));
    let backend = render(&req);
    assert!(!backend.events.contains(&Event::Logo));
    assert_eq!(backend.events[0], Event::TitleLine("Document".to_string()));
}

#[test]
fn valid_logo_is_emitted_before_the_title() {
    let req = request(serde_json::json!({
        "pdfConfig": { "logo": TINY_PNG, "order": [] }
    }));
    let backend = render(&req);
    assert_eq!(backend.events[0], Event::Logo);
    assert_eq!(backend.events[1], Event::TitleLine("Document".to_string()));
}
