//! Embedded-image decoding and the placement heuristic.
//!
//! Sizing rules: fit the content width exactly, preserve the aspect ratio,
//! and clamp the height so a tall image neither forces an awkward page
//! break (page-budget clamp, derived from the configured margins) nor
//! dominates multiple pages (absolute cap). Scaling is always uniform.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::types::{Margins, A4_HEIGHT_MM};

/// Vertical room reserved for the heading emitted above a placed image.
const HEADING_FOOTPRINT_MM: f64 = 30.0;

/// No single image may exceed this height regardless of available space.
const MAX_IMAGE_HEIGHT_MM: f64 = 120.0;

/// Bounding square for the front-matter logo.
pub const LOGO_SIDE_MM: f64 = 50.0;

/// Raw image bytes plus natural pixel dimensions when they could be probed.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub dimensions: Option<(u32, u32)>,
}

/// Decodes a `data:image/...` URL. Base64 or prefix problems are hard
/// per-image errors (the caller emits a placeholder); an undecodable pixel
/// format only loses the dimensions and degrades to width-only sizing.
pub fn decode_data_url(data_url: &str) -> Result<DecodedImage> {
    if !data_url.starts_with("data:image/") {
        return Err(EngineError::InvalidImage(
            "missing data:image/ prefix".to_string(),
        ));
    }
    let payload = data_url
        .split_once(',')
        .map(|(_, p)| p)
        .ok_or_else(|| EngineError::InvalidImage("missing base64 payload".to_string()))?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|err| EngineError::InvalidImage(err.to_string()))?;

    let dimensions = match image::load_from_memory(&bytes) {
        Ok(img) => Some((img.width(), img.height())),
        Err(err) => {
            warn!(error = %err, "could not probe image dimensions, using width-only sizing");
            None
        }
    };

    Ok(DecodedImage { bytes, dimensions })
}

/// Computes the rendered size in millimeters for an image placed below a
/// heading. Unknown dimensions fall back to a square at content width.
pub fn place(
    dimensions: Option<(u32, u32)>,
    content_width_mm: f64,
    margins: &Margins,
) -> (f64, f64) {
    let Some((px_w, px_h)) = dimensions.filter(|&(w, h)| w > 0 && h > 0) else {
        return (content_width_mm, content_width_mm);
    };

    let ratio = px_h as f64 / px_w as f64;
    let mut width = content_width_mm;
    let mut height = width * ratio;

    // Page budget: what remains of an A4 body after margins and the heading.
    let budget = (A4_HEIGHT_MM - margins.top - margins.bottom - HEADING_FOOTPRINT_MM).max(40.0);
    if height > budget {
        height = budget;
        width = height / ratio;
    }
    if height > MAX_IMAGE_HEIGHT_MM {
        height = MAX_IMAGE_HEIGHT_MM;
        width = height / ratio;
    }
    (width, height)
}

/// Fits the logo inside its fixed square footprint, preserving ratio.
pub fn place_logo(dimensions: Option<(u32, u32)>) -> (f64, f64) {
    let Some((px_w, px_h)) = dimensions.filter(|&(w, h)| w > 0 && h > 0) else {
        return (LOGO_SIDE_MM, LOGO_SIDE_MM);
    };
    let ratio = px_h as f64 / px_w as f64;
    if ratio <= 1.0 {
        (LOGO_SIDE_MM, LOGO_SIDE_MM * ratio)
    } else {
        (LOGO_SIDE_MM / ratio, LOGO_SIDE_MM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // 1x1 transparent PNG.
    const TINY_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn decodes_png_data_url_with_dimensions() {
        let img = decode_data_url(TINY_PNG).expect("valid data URL");
        assert_eq!(img.dimensions, Some((1, 1)));
        assert!(!img.bytes.is_empty());
    }

    #[test]
    fn rejects_non_image_payload() {
        assert!(decode_data_url("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(decode_data_url("plain string").is_err());
    }

    #[test]
    fn garbage_base64_is_an_error() {
        assert!(decode_data_url("data:image/png;base64,!!notbase64!!").is_err());
    }

    #[test]
    fn wide_image_fits_content_width() {
        let margins = Margins::default();
        let (w, h) = place(Some((2000, 500)), 174.0, &margins);
        assert_eq!(w, 174.0);
        assert!((h - 43.5).abs() < 1e-9);
    }

    #[test]
    fn tall_image_is_clamped_uniformly() {
        let margins = Margins::default();
        let (w, h) = place(Some((500, 4000)), 174.0, &margins);
        assert_eq!(h, 120.0);
        assert!((w - 15.0).abs() < 1e-9);
        // Uniform scale: aspect ratio preserved.
        assert!((h / w - 8.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_dimensions_fall_back_to_square() {
        let margins = Margins::default();
        assert_eq!(place(None, 100.0, &margins), (100.0, 100.0));
        assert_eq!(place(Some((0, 10)), 100.0, &margins), (100.0, 100.0));
    }

    #[test]
    fn logo_is_bounded_to_its_square() {
        assert_eq!(place_logo(Some((400, 100))), (LOGO_SIDE_MM, 12.5));
        assert_eq!(place_logo(Some((100, 400))), (12.5, LOGO_SIDE_MM));
        assert_eq!(place_logo(None), (LOGO_SIDE_MM, LOGO_SIDE_MM));
    }
}
