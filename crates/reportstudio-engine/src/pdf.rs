//! PDF renderer backend on top of genpdf's paginating document builder.
//!
//! The walker's element stream maps onto genpdf flow elements (paragraphs,
//! breaks, table layouts, images). Pagination, the per-page footer, and the
//! heading+image keep-together unit are handled here; everything else is
//! format-neutral and lives upstream.

use std::io::Cursor;
use std::path::Path;

use genpdf::elements::{
    Break, FrameCellDecorator, Image as PdfImage, LinearLayout, PageBreak, Paragraph, TableLayout,
};
use genpdf::fonts::{self, FontData, FontFamily};
use genpdf::style::{Color, Style};
use genpdf::{
    Alignment, Context, Document, Element as _, Margins as PdfMargins, Mm, PaperSize, Position,
    RenderResult, Size,
};
use tracing::warn;

use crate::element::{
    split_at_breaks, ListEntry, PlacedImage, RenderBackend, TableGrid, TextRun, TocEntry,
};
use crate::error::{EngineError, Result};
use crate::types::{DocumentConfig, Margins};

const BODY_SIZE: u8 = 11;
const CODE_SIZE: u8 = 9;
const TABLE_SIZE: u8 = 9;
const FOOTER_SIZE: u8 = 8;

const GREY_600: Color = Color::Rgb(0x4B, 0x55, 0x63);
const GREY_500: Color = Color::Rgb(0x6B, 0x72, 0x80);
const GREY_DARK: Color = Color::Rgb(0x37, 0x41, 0x51);
const CODE_TEXT: Color = Color::Rgb(0x1F, 0x29, 0x37);
const LINK_BLUE: Color = Color::Rgb(0x25, 0x63, 0xEB);
const WATERMARK_RED: Color = Color::Rgb(0xDC, 0x26, 0x26);
const FOOTER_GREY: Color = Color::Rgb(0x66, 0x66, 0x66);
const PAGE_NUM_GREY: Color = Color::Rgb(0x99, 0x99, 0x99);

/// Heading footprint assumed when deciding whether a heading+image block
/// still fits on the current page.
const KEEP_TOGETHER_HEADING_MM: f64 = 20.0;

/// Loads a `<name>-Regular.ttf` (+Bold/Italic/BoldItalic) family from a
/// directory. Failure is a document-level error: without fonts there is no
/// PDF output.
pub fn load_fonts(dir: &Path, name: &str) -> Result<FontFamily<FontData>> {
    fonts::from_files(dir, name, None).map_err(|err| EngineError::Font(err.to_string()))
}

pub struct PdfBackend {
    doc: Document,
    primary: Color,
    code_family: Option<FontFamily<genpdf::fonts::Font>>,
}

impl PdfBackend {
    /// Builds the paginating document: A4, caller-supplied margins, themed
    /// footer drawn on every page by the decorator.
    pub fn new(
        config: &DocumentConfig,
        body_fonts: FontFamily<FontData>,
        mono_fonts: Option<FontFamily<FontData>>,
    ) -> Self {
        let mut doc = Document::new(body_fonts);
        doc.set_title(config.title.clone());
        doc.set_paper_size(PaperSize::A4);
        doc.set_font_size(BODY_SIZE);
        doc.set_line_spacing(1.25);

        let code_family = mono_fonts.map(|family| doc.add_font_family(family));

        doc.set_page_decorator(FooterDecorator {
            margins: config.theme.margins,
            legal: config.legal.clone(),
            page_numbers: config.page_numbers,
            page: 0,
        });

        let (r, g, b) = config.theme.primary_rgb();
        PdfBackend {
            doc,
            primary: Color::Rgb(r, g, b),
            code_family,
        }
    }

    /// Serializes the accumulated story to PDF bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.doc
            .render(&mut buffer)
            .map_err(|err| EngineError::Pdf(err.to_string()))?;
        Ok(buffer)
    }

    fn heading_style(&self, level: u8) -> (Style, f64, f64) {
        let (size, color, before, after) = match level {
            1 => (18, self.primary, 0.8, 0.5),
            2 => (14, self.primary, 0.7, 0.4),
            3 => (12, self.primary, 0.6, 0.35),
            4 => (11, GREY_DARK, 0.5, 0.3),
            5 => (10, GREY_600, 0.4, 0.25),
            _ => (9, GREY_500, 0.35, 0.2),
        };
        (
            Style::new().with_font_size(size).bold().with_color(color),
            before,
            after,
        )
    }

    fn run_style(&self, run: &TextRun) -> Style {
        let mut style = Style::new().with_font_size(BODY_SIZE);
        if run.code {
            style = style.with_font_size(CODE_SIZE).with_color(CODE_TEXT);
            if let Some(mono) = self.code_family {
                style = style.with_font_family(mono);
            }
        }
        if run.bold {
            style = style.bold();
        }
        // genpdf has no underline primitive; underlined runs degrade to
        // italics so the emphasis is not silently lost.
        if run.italic || run.underline {
            style = style.italic();
        }
        if run.href.is_some() {
            style = style.with_color(LINK_BLUE);
        }
        style
    }

    fn code_style(&self) -> Style {
        let mut style = Style::new().with_font_size(CODE_SIZE).with_color(CODE_TEXT);
        if let Some(mono) = self.code_family {
            style = style.with_font_family(mono);
        }
        style
    }

    fn decoded_image(&self, image: &PlacedImage) -> Option<PdfImage> {
        match PdfImage::from_reader(Cursor::new(image.bytes.clone())) {
            Ok(img) => {
                // genpdf sizes raster images through their DPI; fitting the
                // target width in millimeters is a pure DPI computation.
                let img = match image.dimensions {
                    Some((px_w, _)) if image.width_mm > 0.0 => {
                        img.with_dpi(px_w as f64 * 25.4 / image.width_mm)
                    }
                    _ => img,
                };
                Some(img)
            }
            Err(err) => {
                warn!(error = %err, "embedding image in PDF failed");
                None
            }
        }
    }
}

impl RenderBackend for PdfBackend {
    fn heading(&mut self, level: u8, text: &str) {
        let (style, before, after) = self.heading_style(level);
        self.doc.push(Break::new(before));
        let mut para = Paragraph::default();
        para.push_styled(text.to_string(), style);
        self.doc.push(para);
        self.doc.push(Break::new(after));
    }

    fn paragraph(&mut self, runs: &[TextRun]) {
        for segment in split_at_breaks(runs) {
            if segment.is_empty() {
                self.doc.push(Break::new(0.5));
                continue;
            }
            let mut para = Paragraph::default();
            for run in segment {
                let style = self.run_style(run);
                match &run.href {
                    Some(href) => para.push_link(run.text.clone(), href.clone(), style),
                    None => para.push_styled(run.text.clone(), style),
                }
            }
            self.doc.push(para);
            self.doc.push(Break::new(0.25));
        }
    }

    fn list(&mut self, entries: &[ListEntry]) {
        for entry in entries {
            let indent = "    ".repeat(entry.level);
            let marker = if entry.ordered {
                format!("{indent}{}. ", entry.number)
            } else {
                format!("{indent}- ")
            };
            let mut para = Paragraph::default();
            let style = Style::new().with_font_size(BODY_SIZE);
            para.push_styled(marker, style);
            para.push_styled(entry.text.clone(), style);
            self.doc.push(para);
            self.doc.push(Break::new(0.1));
        }
        self.doc.push(Break::new(0.4));
    }

    fn table(&mut self, grid: &TableGrid) {
        let columns = grid.column_count();
        if columns == 0 || grid.rows.is_empty() {
            return;
        }
        let mut table = TableLayout::new(vec![1; columns]);
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

        for (row_index, row) in grid.rows.iter().enumerate() {
            let header = row_index == 0 && grid.has_header_row;
            let mut table_row = table.row();
            for cell in row {
                let style = if header {
                    Style::new()
                        .with_font_size(TABLE_SIZE)
                        .bold()
                        .with_color(self.primary)
                } else {
                    Style::new().with_font_size(TABLE_SIZE)
                };
                let mut para = Paragraph::default();
                para.push_styled(cell.clone(), style);
                table_row.push_element(para.padded(PdfMargins::trbl(1.0, 1.5, 1.0, 1.5)));
            }
            if let Err(err) = table_row.push() {
                warn!(error = %err, row = row_index, "failed to push table row");
                return;
            }
        }

        self.doc.push(Break::new(0.3));
        self.doc.push(table);
        self.doc.push(Break::new(0.5));
    }

    fn code_block(&mut self, text: &str) {
        self.doc.push(Break::new(0.3));
        let style = self.code_style();
        for line in text.lines() {
            let mut para = Paragraph::default();
            para.push_styled(format!("    {line}"), style);
            self.doc.push(para);
        }
        self.doc.push(Break::new(0.3));
    }

    fn blockquote(&mut self, text: &str) {
        let mut para = Paragraph::default();
        para.push_styled(
            text.to_string(),
            Style::new().with_font_size(BODY_SIZE).italic().with_color(GREY_500),
        );
        self.doc.push(para.padded(PdfMargins::trbl(1.0, 4.0, 1.0, 8.0)));
        self.doc.push(Break::new(0.3));
    }

    fn spacer(&mut self) {
        self.doc.push(Break::new(1.0));
    }

    fn image_block(&mut self, title: &str, image: Option<&PlacedImage>) {
        let mut block = LinearLayout::vertical();

        let mut heading = Paragraph::default();
        heading.push_styled(
            title.to_string(),
            Style::new().with_font_size(16).bold().with_color(self.primary),
        );
        block.push(heading);
        block.push(Break::new(0.5));

        let mut min_height_mm = KEEP_TOGETHER_HEADING_MM;
        match image.and_then(|img| self.decoded_image(img).map(|decoded| (img, decoded))) {
            Some((img, decoded)) => {
                min_height_mm += img.height_mm;
                block.push(decoded);
            }
            None => {
                let mut placeholder = Paragraph::default();
                placeholder.push_styled(
                    format!("[Image unavailable: {title}]"),
                    Style::new().with_font_size(BODY_SIZE).italic().with_color(GREY_500),
                );
                block.push(placeholder);
            }
        }
        block.push(Break::new(1.0));

        self.doc.push(KeepTogether::new(block, min_height_mm));
    }

    fn logo(&mut self, image: &PlacedImage) {
        if let Some(decoded) = self.decoded_image(image) {
            self.doc.push(decoded.with_alignment(Alignment::Center));
            self.doc.push(Break::new(1.0));
        }
    }

    fn title_line(&mut self, text: &str) {
        let mut para = Paragraph::default();
        para.set_alignment(Alignment::Center);
        para.push_styled(
            text.to_string(),
            Style::new().with_font_size(18).bold().with_color(self.primary),
        );
        self.doc.push(para);
        self.doc.push(Break::new(0.6));
    }

    fn meta_line(&mut self, text: &str) {
        let mut para = Paragraph::default();
        para.push_styled(text.to_string(), Style::new().with_font_size(BODY_SIZE));
        self.doc.push(para);
        self.doc.push(Break::new(0.25));
    }

    fn toc(&mut self, entries: &[TocEntry]) {
        self.doc.push(Break::new(1.0));
        let mut heading = Paragraph::default();
        heading.push_styled(
            "Table of Contents".to_string(),
            Style::new().with_font_size(14).bold().with_color(self.primary),
        );
        self.doc.push(heading);
        self.doc.push(Break::new(0.4));

        for entry in entries {
            let indent = if entry.level == 2 { "    " } else { "" };
            let mut para = Paragraph::default();
            para.push_styled(
                format!("{indent}- {}", entry.text),
                Style::new().with_font_size(BODY_SIZE),
            );
            self.doc.push(para);
            self.doc.push(Break::new(0.1));
        }
    }

    fn page_break(&mut self) {
        self.doc.push(PageBreak::new());
    }

    fn watermark(&mut self) {
        self.doc.push(Break::new(1.0));
        let mut para = Paragraph::default();
        para.set_alignment(Alignment::Center);
        para.push_styled(
            "CONFIDENTIAL".to_string(),
            Style::new().with_font_size(10).bold().with_color(WATERMARK_RED),
        );
        self.doc.push(para);
    }
}

/// Per-page decorator: applies the configured margins and draws the footer
/// band (centered legal text, right-aligned page number) on every page.
struct FooterDecorator {
    margins: Margins,
    legal: String,
    page_numbers: bool,
    page: usize,
}

impl genpdf::PageDecorator for FooterDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: genpdf::render::Area<'a>,
        _style: Style,
    ) -> std::result::Result<genpdf::render::Area<'a>, genpdf::error::Error> {
        self.page += 1;

        let size = area.size();
        let page_width: f64 = size.width.into();
        let page_height: f64 = size.height.into();
        let baseline = Mm::from(page_height - 12.0);

        let legal_style = Style::new().with_font_size(FOOTER_SIZE).with_color(FOOTER_GREY);
        let legal_width: f64 = legal_style.str_width(&context.font_cache, &self.legal).into();
        area.print_str(
            &context.font_cache,
            Position::new(Mm::from((page_width - legal_width) / 2.0), baseline),
            legal_style,
            &self.legal,
        )?;

        if self.page_numbers {
            let label = format!("Page {}", self.page);
            let style = Style::new().with_font_size(FOOTER_SIZE).with_color(PAGE_NUM_GREY);
            let label_width: f64 = style.str_width(&context.font_cache, &label).into();
            area.print_str(
                &context.font_cache,
                Position::new(
                    Mm::from(page_width - self.margins.right - label_width),
                    baseline,
                ),
                style,
                &label,
            )?;
        }

        area.add_margins(PdfMargins::trbl(
            self.margins.top,
            self.margins.right,
            self.margins.bottom,
            self.margins.left,
        ));
        Ok(area)
    }
}

/// Atomic heading+image unit: when the remaining page area is shorter than
/// the block, defer the whole block to the next page once instead of letting
/// the page break separate the heading from its image.
struct KeepTogether {
    content: LinearLayout,
    min_height_mm: f64,
    deferred: bool,
}

impl KeepTogether {
    fn new(content: LinearLayout, min_height_mm: f64) -> Self {
        KeepTogether {
            content,
            min_height_mm,
            deferred: false,
        }
    }
}

impl genpdf::Element for KeepTogether {
    fn render(
        &mut self,
        context: &Context,
        area: genpdf::render::Area<'_>,
        style: Style,
    ) -> std::result::Result<RenderResult, genpdf::error::Error> {
        let available: f64 = area.size().height.into();
        if !self.deferred && available < self.min_height_mm {
            self.deferred = true;
            return Ok(RenderResult {
                size: Size::new(0.0, 0.0),
                has_more: true,
            });
        }
        self.content.render(context, area, style)
    }
}
