//! Wire-facing request model for document rendering.
//!
//! Field names and aliases follow the editor client's JSON exactly
//! (`pdfConfig`, `dataUrl`/`data`, snake_case toggles); everything is
//! defaulted so a sparse request still renders.

use serde::{Deserialize, Serialize};

/// A4 page metrics, millimeters.
pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

/// One render request: report HTML, embedded images, themed configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub report: ReportPayload,
    #[serde(default)]
    pub images: Vec<ImageAsset>,
    #[serde(default, rename = "pdfConfig")]
    pub config: DocumentConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReportPayload {
    /// HTML fragment produced by the client-side editor. Untrusted
    /// structure: may contain malformed tables and stray Unicode.
    #[serde(default)]
    pub generated: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImageAsset {
    /// Base64 data URL (`data:image/...`). Absence is a per-image failure,
    /// not fatal to the document.
    #[serde(default, alias = "dataUrl")]
    pub data: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ImageAsset {
    /// Display title priority: explicit title, caption, filename, "Image".
    pub fn display_title(&self) -> &str {
        [&self.title, &self.caption, &self.name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
            .unwrap_or("Image")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default = "default_legal")]
    pub legal: String,
    /// Base64 data URL for the front-matter logo.
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub watermark: bool,
    #[serde(default = "default_true")]
    pub page_numbers: bool,
    #[serde(default = "default_order")]
    pub order: Vec<BlockKind>,
    #[serde(default)]
    pub theme: Theme,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            title: default_title(),
            subtitle: None,
            client: None,
            legal: default_legal(),
            logo: None,
            watermark: false,
            page_numbers: true,
            order: default_order(),
            theme: Theme::default(),
        }
    }
}

/// Section order entries. `Diagram` is a retained no-op: the feature was
/// removed upstream and diagram exports are supplied through the images
/// block instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Diagram,
    Report,
    Images,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Theme {
    /// Primary color as `#RRGGBB`.
    #[serde(default = "default_primary")]
    pub primary: String,
    #[serde(default)]
    pub margins: Margins,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            primary: default_primary(),
            margins: Margins::default(),
        }
    }
}

impl Theme {
    /// Parses the primary color, falling back to the default teal on any
    /// malformed value.
    pub fn primary_rgb(&self) -> (u8, u8, u8) {
        parse_hex_color(&self.primary).unwrap_or((0x0C, 0x4A, 0x45))
    }

    /// Primary color as uppercase hex without the `#`, the form OOXML wants.
    pub fn primary_hex(&self) -> String {
        let (r, g, b) = self.primary_rgb();
        format!("{r:02X}{g:02X}{b:02X}")
    }
}

fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Page margins in millimeters.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Margins {
    #[serde(default = "default_top")]
    pub top: f64,
    #[serde(default = "default_bottom")]
    pub bottom: f64,
    #[serde(default = "default_side")]
    pub left: f64,
    #[serde(default = "default_side")]
    pub right: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            top: default_top(),
            bottom: default_bottom(),
            left: default_side(),
            right: default_side(),
        }
    }
}

impl Margins {
    /// Usable content width on an A4 page.
    pub fn content_width(&self) -> f64 {
        (A4_WIDTH_MM - self.left - self.right).max(10.0)
    }
}

fn default_title() -> String {
    "Document".to_string()
}

fn default_legal() -> String {
    "All rights reserved".to_string()
}

fn default_primary() -> String {
    "#0C4A45".to_string()
}

fn default_true() -> bool {
    true
}

fn default_order() -> Vec<BlockKind> {
    vec![BlockKind::Diagram, BlockKind::Report, BlockKind::Images]
}

fn default_top() -> f64 {
    24.0
}

fn default_bottom() -> f64 {
    28.0
}

fn default_side() -> f64 {
    18.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_editor_payload() {
        let json = r##"{
            "report": { "generated": "<h1>T</h1>" },
            "images": [ { "dataUrl": "data:image/png;base64,xxx", "caption": "Cap" } ],
            "pdfConfig": {
                "title": "Weekly Review",
                "order": ["report", "images"],
                "theme": { "primary": "#123456", "margins": { "top": 20, "bottom": 20, "left": 15, "right": 15 } }
            }
        }"##;
        let req: RenderRequest = serde_json::from_str(json).expect("valid payload");
        assert_eq!(req.config.title, "Weekly Review");
        assert_eq!(req.config.order, vec![BlockKind::Report, BlockKind::Images]);
        assert_eq!(req.images[0].display_title(), "Cap");
        assert_eq!(req.config.theme.primary_rgb(), (0x12, 0x34, 0x56));
        assert_eq!(req.config.theme.margins.content_width(), 180.0);
    }

    #[test]
    fn empty_payload_uses_defaults() {
        let req: RenderRequest = serde_json::from_str("{}").expect("empty payload");
        assert_eq!(req.config.title, "Document");
        assert!(req.config.page_numbers);
        assert_eq!(
            req.config.order,
            vec![BlockKind::Diagram, BlockKind::Report, BlockKind::Images]
        );
        assert_eq!(req.config.theme.margins.content_width(), 174.0);
    }

    #[test]
    fn display_title_falls_back_in_priority_order() {
        let asset = ImageAsset {
            name: Some("diagram.png".to_string()),
            ..ImageAsset::default()
        };
        assert_eq!(asset.display_title(), "diagram.png");
        assert_eq!(ImageAsset::default().display_title(), "Image");
    }

    #[test]
    fn malformed_primary_color_falls_back() {
        let theme = Theme {
            primary: "teal".to_string(),
            margins: Margins::default(),
        };
        assert_eq!(theme.primary_rgb(), (0x0C, 0x4A, 0x45));
        assert_eq!(theme.primary_hex(), "0C4A45");
    }
}
