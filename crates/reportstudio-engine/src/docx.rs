//! DOCX renderer backend on docx-rs.
//!
//! The walker's element stream is appended to a mutable `Docx` builder; the
//! page shell contributes the section margins, the borderless footer table
//! with a dynamic PAGE field, and the front matter. Sizes are half-points,
//! page metrics are twips, picture extents are EMUs.

use std::io::Cursor;

use docx_rs::*;
use tracing::warn;

use crate::element::{
    split_at_breaks, ListEntry, PlacedImage, RenderBackend, TableGrid, TextRun, TocEntry,
};
use crate::error::{EngineError, Result};
use crate::types::{DocumentConfig, A4_HEIGHT_MM, A4_WIDTH_MM};

const ORDERED_ABSTRACT_ID: usize = 10;
const ORDERED_NUM_ID: usize = 11;
const UNORDERED_ABSTRACT_ID: usize = 20;
const UNORDERED_NUM_ID: usize = 21;
const MAX_LIST_DEPTH: usize = 4;

const BODY_HALF_POINTS: usize = 22;
const CODE_HALF_POINTS: usize = 18;
const FOOTER_HALF_POINTS: usize = 16;

fn mm_to_twip(mm: f64) -> i32 {
    (mm * 1440.0 / 25.4).round() as i32
}

fn mm_to_emu(mm: f64) -> u32 {
    (mm * 914_400.0 / 25.4).round() as u32
}

pub struct DocxBackend {
    docx: Docx,
    primary_hex: String,
    legal: String,
    page_numbers: bool,
}

impl DocxBackend {
    pub fn new(config: &DocumentConfig) -> Self {
        let margins = &config.theme.margins;
        let docx = Docx::new()
            .page_size(
                mm_to_twip(A4_WIDTH_MM) as u32,
                mm_to_twip(A4_HEIGHT_MM) as u32,
            )
            .page_margin(
                PageMargin::new()
                    .top(mm_to_twip(margins.top))
                    .bottom(mm_to_twip(margins.bottom))
                    .left(mm_to_twip(margins.left))
                    .right(mm_to_twip(margins.right)),
            )
            .add_abstract_numbering(ordered_numbering())
            .add_numbering(Numbering::new(ORDERED_NUM_ID, ORDERED_ABSTRACT_ID))
            .add_abstract_numbering(unordered_numbering())
            .add_numbering(Numbering::new(UNORDERED_NUM_ID, UNORDERED_ABSTRACT_ID));

        DocxBackend {
            docx,
            primary_hex: config.theme.primary_hex(),
            legal: config.legal.clone(),
            page_numbers: config.page_numbers,
        }
    }

    /// Attaches the footer and serializes the package to bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let footer = themed_footer(&self.legal, self.page_numbers);
        let docx = self.docx.footer(footer);

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|err| EngineError::Docx(err.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn push_paragraph(&mut self, para: Paragraph) {
        let docx = std::mem::take(&mut self.docx);
        self.docx = docx.add_paragraph(para);
    }

    fn push_table(&mut self, table: Table) {
        let docx = std::mem::take(&mut self.docx);
        self.docx = docx.add_table(table);
    }

    fn heading_run(&self, level: u8, text: &str) -> Run {
        let (size, color) = match level {
            1 => (36, self.primary_hex.as_str()),
            2 => (28, self.primary_hex.as_str()),
            3 => (24, "374151"),
            4 => (22, "4B5563"),
            5 => (20, "6B7280"),
            _ => (18, "6B7280"),
        };
        Run::new().add_text(text).size(size).bold().color(color)
    }
}

impl RenderBackend for DocxBackend {
    fn heading(&mut self, level: u8, text: &str) {
        let style_id = format!("Heading{}", level.clamp(1, 6));
        let run = self.heading_run(level, text);
        self.push_paragraph(Paragraph::new().add_run(run).style(&style_id));
    }

    fn paragraph(&mut self, runs: &[TextRun]) {
        for segment in split_at_breaks(runs) {
            if segment.is_empty() {
                self.push_paragraph(Paragraph::new());
                continue;
            }
            let mut para = Paragraph::new();
            for run in segment {
                if let Some(href) = &run.href {
                    let link = Hyperlink::new(href.as_str(), HyperlinkType::External).add_run(
                        Run::new()
                            .add_text(run.text.as_str())
                            .size(BODY_HALF_POINTS)
                            .color("2563EB")
                            .underline("single"),
                    );
                    para = para.add_hyperlink(link);
                } else {
                    let mut r = Run::new().add_text(run.text.as_str()).size(BODY_HALF_POINTS);
                    if run.bold {
                        r = r.bold();
                    }
                    if run.italic {
                        r = r.italic();
                    }
                    if run.underline {
                        r = r.underline("single");
                    }
                    if run.code {
                        r = r
                            .fonts(RunFonts::new().ascii("Courier New"))
                            .size(CODE_HALF_POINTS)
                            .color("1F2937");
                    }
                    para = para.add_run(r);
                }
            }
            self.push_paragraph(para);
        }
    }

    fn list(&mut self, entries: &[ListEntry]) {
        for entry in entries {
            let numbering_id = if entry.ordered {
                ORDERED_NUM_ID
            } else {
                UNORDERED_NUM_ID
            };
            let para = Paragraph::new()
                .add_run(Run::new().add_text(entry.text.as_str()).size(BODY_HALF_POINTS))
                .numbering(
                    NumberingId::new(numbering_id),
                    IndentLevel::new(entry.level.min(MAX_LIST_DEPTH - 1)),
                );
            self.push_paragraph(para);
        }
    }

    fn table(&mut self, grid: &TableGrid) {
        if grid.rows.is_empty() || grid.column_count() == 0 {
            return;
        }
        let mut table = Table::new(vec![]);
        for (row_index, row) in grid.rows.iter().enumerate() {
            let header = row_index == 0 && grid.has_header_row;
            let mut cells = Vec::new();
            for text in row {
                let mut run = Run::new()
                    .add_text(text.as_str())
                    .size(if header { BODY_HALF_POINTS } else { 20 });
                if header {
                    run = run.bold().color("FFFFFF");
                }
                let mut para = Paragraph::new().add_run(run);
                if header {
                    para = para.align(AlignmentType::Center);
                }
                let mut cell = TableCell::new().add_paragraph(para);
                if header {
                    cell = cell.shading(
                        Shading::new()
                            .shd_type(ShdType::Clear)
                            .fill(self.primary_hex.as_str()),
                    );
                }
                cells.push(cell);
            }
            table = table.add_row(TableRow::new(cells));
        }
        self.push_table(table);
        // Breathing room after the grid, as Word glues tables to text.
        self.push_paragraph(Paragraph::new());
    }

    fn code_block(&mut self, text: &str) {
        let mut run = Run::new()
            .fonts(RunFonts::new().ascii("Courier New"))
            .size(CODE_HALF_POINTS)
            .color("1F2937");
        for (index, line) in text.lines().enumerate() {
            if index > 0 {
                run = run.add_break(BreakType::TextWrapping);
            }
            run = run.add_text(line);
        }
        self.push_paragraph(Paragraph::new().add_run(run));
    }

    fn blockquote(&mut self, text: &str) {
        let run = Run::new()
            .add_text(text)
            .size(BODY_HALF_POINTS)
            .italic()
            .color("6B7280");
        self.push_paragraph(Paragraph::new().add_run(run).style("IntenseQuote"));
    }

    fn spacer(&mut self) {
        self.push_paragraph(Paragraph::new());
    }

    fn image_block(&mut self, title: &str, image: Option<&PlacedImage>) {
        let heading = Run::new()
            .add_text(title)
            .size(32)
            .bold()
            .color(self.primary_hex.as_str());
        self.push_paragraph(Paragraph::new().add_run(heading).style("Heading2"));

        match image {
            Some(img) => {
                let pic = Pic::new_with_dimensions(
                    img.bytes.clone(),
                    mm_to_emu(img.width_mm),
                    mm_to_emu(img.height_mm),
                );
                self.push_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)));
            }
            None => {
                warn!(title, "emitting image placeholder");
                let run = Run::new()
                    .add_text(format!("[Image unavailable: {title}]"))
                    .size(BODY_HALF_POINTS)
                    .italic()
                    .color("6B7280");
                self.push_paragraph(Paragraph::new().add_run(run));
            }
        }
        self.push_paragraph(Paragraph::new());
    }

    fn logo(&mut self, image: &PlacedImage) {
        let pic = Pic::new_with_dimensions(
            image.bytes.clone(),
            mm_to_emu(image.width_mm),
            mm_to_emu(image.height_mm),
        );
        let para = Paragraph::new()
            .add_run(Run::new().add_image(pic))
            .align(AlignmentType::Center);
        self.push_paragraph(para);
    }

    fn title_line(&mut self, text: &str) {
        let run = Run::new()
            .add_text(text)
            .size(36)
            .bold()
            .color(self.primary_hex.as_str());
        let para = Paragraph::new()
            .add_run(run)
            .style("Heading1")
            .align(AlignmentType::Center);
        self.push_paragraph(para);
    }

    fn meta_line(&mut self, text: &str) {
        let para =
            Paragraph::new().add_run(Run::new().add_text(text).size(BODY_HALF_POINTS));
        self.push_paragraph(para);
    }

    fn toc(&mut self, entries: &[TocEntry]) {
        let heading = Run::new()
            .add_text("Table of Contents")
            .size(28)
            .bold()
            .color(self.primary_hex.as_str());
        self.push_paragraph(Paragraph::new().add_run(heading).style("Heading2"));

        for entry in entries {
            let para = Paragraph::new()
                .add_run(Run::new().add_text(entry.text.as_str()).size(BODY_HALF_POINTS))
                .numbering(
                    NumberingId::new(UNORDERED_NUM_ID),
                    IndentLevel::new(usize::from(entry.level.saturating_sub(1))),
                );
            self.push_paragraph(para);
        }
    }

    fn page_break(&mut self) {
        self.push_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
    }

    fn watermark(&mut self) {
        let run = Run::new()
            .add_text("CONFIDENTIAL")
            .size(20)
            .bold()
            .color("DC2626");
        self.push_paragraph(Paragraph::new().add_run(run).align(AlignmentType::Center));
    }
}

fn ordered_numbering() -> AbstractNumbering {
    let mut numbering = AbstractNumbering::new(ORDERED_ABSTRACT_ID);
    for level in 0..MAX_LIST_DEPTH {
        numbering = numbering.add_level(
            Level::new(
                level,
                Start::new(1),
                NumberFormat::new("decimal"),
                LevelText::new(format!("%{}.", level + 1)),
                LevelJc::new("left"),
            )
            .indent(
                Some(720 * (level as i32 + 1)),
                Some(SpecialIndentType::Hanging(320)),
                None,
                None,
            ),
        );
    }
    numbering
}

fn unordered_numbering() -> AbstractNumbering {
    let mut numbering = AbstractNumbering::new(UNORDERED_ABSTRACT_ID);
    for level in 0..MAX_LIST_DEPTH {
        // One flat marker at every depth; indentation alone shows nesting.
        numbering = numbering.add_level(
            Level::new(
                level,
                Start::new(1),
                NumberFormat::new("bullet"),
                LevelText::new("-"),
                LevelJc::new("left"),
            )
            .indent(
                Some(720 * (level as i32 + 1)),
                Some(SpecialIndentType::Hanging(320)),
                None,
                None,
            ),
        );
    }
    numbering
}

/// Centered legal text plus a right-aligned dynamic PAGE field, laid out in
/// a borderless two-cell table.
fn themed_footer(legal: &str, page_numbers: bool) -> Footer {
    let legal_para = Paragraph::new()
        .add_run(Run::new().add_text(legal).size(FOOTER_HALF_POINTS).color("666666"))
        .align(AlignmentType::Center);

    if !page_numbers {
        return Footer::new().add_paragraph(legal_para);
    }

    let page_field = Paragraph::new()
        .add_run(
            Run::new()
                .size(FOOTER_HALF_POINTS)
                .color("999999")
                .add_field_char(FieldCharType::Begin, false),
        )
        .add_run(
            Run::new()
                .size(FOOTER_HALF_POINTS)
                .color("999999")
                .add_instr_text(InstrText::Unsupported("PAGE".to_string())),
        )
        .add_run(
            Run::new()
                .size(FOOTER_HALF_POINTS)
                .color("999999")
                .add_field_char(FieldCharType::End, false),
        )
        .align(AlignmentType::Right);

    let table = Table::new(vec![TableRow::new(vec![
        TableCell::new().add_paragraph(legal_para),
        TableCell::new().add_paragraph(page_field),
    ])])
    .set_borders(TableBorders::new().clear_all());

    Footer::new().add_table(table)
}
