use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::error::{CardError, CardResult};

/// Regular and bold sans faces used for the two text lines. Resolved once
/// at startup; rasterization itself never goes back to the font database.
pub struct FontCatalog {
    regular: FontVec,
    bold: FontVec,
}

impl FontCatalog {
    /// Discover system sans-serif faces through `fontdb`. Falls back to the
    /// regular face when no bold face is installed.
    pub fn discover() -> CardResult<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let regular = query_face_bytes(&db, fontdb::Weight::NORMAL)?;
        let bold =
            query_face_bytes(&db, fontdb::Weight::BOLD).unwrap_or_else(|_| regular.clone());
        Self::from_bytes(regular, bold)
    }

    pub fn from_bytes(regular: (Vec<u8>, u32), bold: (Vec<u8>, u32)) -> CardResult<Self> {
        let load = |(bytes, index): (Vec<u8>, u32)| {
            FontVec::try_from_vec_and_index(bytes, index)
                .map_err(|_| CardError::decode("font bytes did not parse"))
        };
        Ok(Self {
            regular: load(regular)?,
            bold: load(bold)?,
        })
    }

    pub fn regular(&self) -> &FontVec {
        &self.regular
    }

    pub fn bold(&self) -> &FontVec {
        &self.bold
    }
}

fn query_face_bytes(db: &fontdb::Database, weight: fontdb::Weight) -> CardResult<(Vec<u8>, u32)> {
    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif],
        weight,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    let id = db
        .query(&query)
        .ok_or_else(|| CardError::validation("no system sans-serif face found"))?;
    db.with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| CardError::validation("font face data unavailable"))
}

/// Advance width of one line at the given pixel size, kerning included.
pub fn measure_line(font: &impl Font, px: f32, text: &str) -> f32 {
    let scaled = font.as_scaled(PxScale::from(px));
    let mut width = 0.0f32;
    let mut prev = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(p) = prev {
            width += scaled.kern(p, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Draw one line of text centered on `(center_x, center_y)`, blending glyph
/// coverage onto the (opaque) canvas.
pub fn draw_line(
    img: &mut RgbaImage,
    font: &impl Font,
    px: f32,
    text: &str,
    color: [u8; 3],
    center_x: f32,
    center_y: f32,
) {
    let scale = PxScale::from(px);
    let scaled = font.as_scaled(scale);

    let width = measure_line(font, px, text);
    let mut cursor_x = center_x - width / 2.0;
    // Middle baseline: the ink box midpoint sits on center_y.
    let baseline_y = center_y + (scaled.ascent() + scaled.descent()) / 2.0;

    let (img_w, img_h) = img.dimensions();
    let mut prev = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(p) = prev {
            cursor_x += scaled.kern(p, id);
        }

        let glyph = id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = gx as i64 + bounds.min.x as i64;
                let y = gy as i64 + bounds.min.y as i64;
                if x < 0 || y < 0 || x >= i64::from(img_w) || y >= i64::from(img_h) {
                    return;
                }
                let px = img.get_pixel_mut(x as u32, y as u32);
                *px = blend_coverage(*px, color, coverage);
            });
        }

        cursor_x += scaled.h_advance(id);
        prev = Some(id);
    }
}

fn blend_coverage(dst: Rgba<u8>, color: [u8; 3], coverage: f32) -> Rgba<u8> {
    let a = coverage.clamp(0.0, 1.0);
    let mix = |c: u8, d: u8| (c as f32 * a + d as f32 * (1.0 - a)).round() as u8;
    Rgba([
        mix(color[0], dst[0]),
        mix(color[1], dst[1]),
        mix(color[2], dst[2]),
        dst[3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Option<FontCatalog> {
        FontCatalog::discover().ok()
    }

    #[test]
    fn measure_scales_with_size() {
        let Some(fonts) = catalog() else {
            // Host without system fonts; discovery degradation is covered
            // by the rasterizer tests.
            return;
        };
        let w1 = measure_line(fonts.regular(), 12.0, "Hello");
        let w2 = measure_line(fonts.regular(), 24.0, "Hello");
        assert!(w2 > w1);
        assert!(measure_line(fonts.regular(), 24.0, "") == 0.0);
    }

    #[test]
    fn draw_line_marks_pixels_near_center() {
        let Some(fonts) = catalog() else {
            return;
        };
        let mut img = RgbaImage::from_pixel(200, 80, Rgba([255, 255, 255, 255]));
        draw_line(&mut img, fonts.bold(), 32.0, "Hi", [0, 0, 0], 100.0, 40.0);
        let touched = img.pixels().any(|p| p.0 != [255, 255, 255, 255]);
        assert!(touched);
        // Alpha of the opaque canvas is preserved.
        assert!(img.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn blend_full_coverage_replaces_color() {
        let out = blend_coverage(Rgba([255, 255, 255, 255]), [10, 20, 30], 1.0);
        assert_eq!(out.0, [10, 20, 30, 255]);
        let out = blend_coverage(Rgba([255, 255, 255, 255]), [10, 20, 30], 0.0);
        assert_eq!(out.0, [255, 255, 255, 255]);
    }
}
