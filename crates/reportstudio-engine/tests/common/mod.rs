//! Element-stream capture used by the walker and assembly tests.

use reportstudio_engine::{ListEntry, PlacedImage, RenderBackend, TableGrid, TextRun, TocEntry};

#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Event {
    Heading(u8, String),
    Paragraph(Vec<TextRun>),
    List(Vec<ListEntry>),
    Table(TableGrid),
    CodeBlock(String),
    Blockquote(String),
    Spacer,
    ImageBlock { title: String, has_image: bool },
    Logo,
    TitleLine(String),
    MetaLine(String),
    Toc(Vec<TocEntry>),
    PageBreak,
    Watermark,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub events: Vec<Event>,
}

impl RecordingBackend {
    #[allow(dead_code)]
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Paragraph(runs) => {
                    Some(runs.iter().map(|r| r.text.as_str()).collect::<String>())
                }
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn heading(&mut self, level: u8, text: &str) {
        self.events.push(Event::Heading(level, text.to_string()));
    }

    fn paragraph(&mut self, runs: &[TextRun]) {
        self.events.push(Event::Paragraph(runs.to_vec()));
    }

    fn list(&mut self, entries: &[ListEntry]) {
        self.events.push(Event::List(entries.to_vec()));
    }

    fn table(&mut self, grid: &TableGrid) {
        self.events.push(Event::Table(grid.clone()));
    }

    fn code_block(&mut self, text: &str) {
        self.events.push(Event::CodeBlock(text.to_string()));
    }

    fn blockquote(&mut self, text: &str) {
        self.events.push(Event::Blockquote(text.to_string()));
    }

    fn spacer(&mut self) {
        self.events.push(Event::Spacer);
    }

    fn image_block(&mut self, title: &str, image: Option<&PlacedImage>) {
        self.events.push(Event::ImageBlock {
            title: title.to_string(),
            has_image: image.is_some(),
        });
    }

    fn logo(&mut self, _image: &PlacedImage) {
        self.events.push(Event::Logo);
    }

    fn title_line(&mut self, text: &str) {
        self.events.push(Event::TitleLine(text.to_string()));
    }

    fn meta_line(&mut self, text: &str) {
        self.events.push(Event::MetaLine(text.to_string()));
    }

    fn toc(&mut self, entries: &[TocEntry]) {
        self.events.push(Event::Toc(entries.to_vec()));
    }

    fn page_break(&mut self) {
        self.events.push(Event::PageBreak);
    }

    fn watermark(&mut self) {
        self.events.push(Event::Watermark);
    }
}
