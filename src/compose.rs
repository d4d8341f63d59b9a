//! Card rasterization.
//!
//! [`CardRasterizer::render`] turns one word entry plus the session's photo
//! and overlay transform into a print-resolution pixel buffer. The function
//! is total: artwork that fails to resolve or decode paints the fallback
//! gradient, a missing photo simply skips the overlay, and missing fonts
//! skip the text lines. Nothing in the render path can abort a batch.

use image::{imageops, Rgba, RgbaImage};
use kurbo::{Affine, Point};
use tracing::debug;

use crate::{
    assets::{fallback_gradient, load_artwork, AssetSource},
    fonts::{draw_line, measure_line, FontCatalog},
    layout::{layout_profile, mm_to_px, CardSizeProfile, MmSize, Orientation},
    model::WordEntry,
    transform::OverlayTransform,
};

/// Border stroke width at 300 DPI (2 px equivalent at screen scale).
const BORDER_PX: u32 = 6;
/// Border inset from the canvas edge.
const BORDER_INSET_PX: u32 = 3;

const HEADWORD_COLOR: [u8; 3] = [0x1F, 0x29, 0x37];
const LOCALIZED_COLOR: [u8; 3] = [0x4B, 0x56, 0x63];

/// One rasterized card: print-resolution pixels plus the physical bleed
/// size they represent. Created per export operation and discarded after
/// being written to its destination.
pub struct RenderedCard {
    pub pixels: RgbaImage,
    pub bleed: MmSize,
}

/// Renders cards against an asset source and an optional font catalog.
pub struct CardRasterizer<'a> {
    source: &'a dyn AssetSource,
    fonts: Option<&'a FontCatalog>,
}

impl<'a> CardRasterizer<'a> {
    pub fn new(source: &'a dyn AssetSource, fonts: Option<&'a FontCatalog>) -> Self {
        Self { source, fonts }
    }

    /// Rasterize one card at 300 DPI for the given size profile.
    pub fn render(
        &self,
        word: &WordEntry,
        photo: Option<&RgbaImage>,
        transform: &OverlayTransform,
        template: &str,
        size: &CardSizeProfile,
    ) -> RenderedCard {
        let width_px = mm_to_px(size.bleed.width_mm);
        let height_px = mm_to_px(size.bleed.height_mm);
        let mut canvas = RgbaImage::from_pixel(width_px, height_px, Rgba([255, 255, 255, 255]));

        let layout = layout_profile(size.id);
        let (w, h) = (width_px as f64, height_px as f64);
        let padding = layout.padding_ratio * w.min(h);
        // Ratios apply to the height for horizontal cards, width for
        // vertical ones.
        let basis = match layout.orientation {
            Orientation::Horizontal => h,
            Orientation::Vertical => w,
        };
        let image_size = basis * layout.image_ratio;
        let image_gap = basis * layout.image_gap_ratio;
        let (image_x, image_y) = match layout.orientation {
            Orientation::Horizontal => (padding, (h - image_size) / 2.0),
            Orientation::Vertical => ((w - image_size) / 2.0, padding),
        };

        debug!(word = %word.id, size = size.id, width_px, height_px, "rasterizing card");

        self.draw_artwork(&mut canvas, word, template, image_x, image_y, image_size);

        if let Some(photo) = photo {
            draw_overlay(&mut canvas, photo, transform, image_x, image_y, image_size);
        }

        match layout.orientation {
            Orientation::Horizontal => {
                let text_left = image_x + image_size + image_gap;
                let region_w = w - text_left - padding;
                self.draw_text(
                    &mut canvas,
                    word,
                    text_left + region_w / 2.0,
                    h / 2.0,
                    region_w,
                    basis * layout.english_size_ratio,
                    basis * layout.localized_size_ratio,
                    basis * layout.text_gap_ratio,
                );
            }
            Orientation::Vertical => {
                self.draw_text(
                    &mut canvas,
                    word,
                    w / 2.0,
                    image_y + image_size + image_gap,
                    w - padding * 2.0,
                    basis * layout.english_size_ratio,
                    basis * layout.localized_size_ratio,
                    basis * layout.text_gap_ratio,
                );
            }
        }

        draw_border(&mut canvas);

        RenderedCard {
            pixels: canvas,
            bleed: size.bleed,
        }
    }

    fn draw_artwork(
        &self,
        canvas: &mut RgbaImage,
        word: &WordEntry,
        template: &str,
        x: f64,
        y: f64,
        side: f64,
    ) {
        let side_px = side.round().max(1.0) as u32;
        let artwork = match load_artwork(self.source, word, template) {
            Some(img) => imageops::resize(&img, side_px, side_px, imageops::FilterType::Triangle),
            None => fallback_gradient(side_px, side_px),
        };
        blit_over(canvas, &artwork, x.round() as i64, y.round() as i64);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        word: &WordEntry,
        center_x: f64,
        top_y: f64,
        max_width: f64,
        english_px: f64,
        localized_px: f64,
        gap: f64,
    ) {
        let Some(fonts) = self.fonts else {
            return;
        };

        let english_px = fit_px(fonts, true, &word.english, english_px, max_width);
        draw_line(
            canvas,
            fonts.bold(),
            english_px as f32,
            &word.english,
            HEADWORD_COLOR,
            center_x as f32,
            top_y as f32,
        );

        if !word.localized.is_empty() {
            let localized_px = fit_px(fonts, false, &word.localized, localized_px, max_width);
            draw_line(
                canvas,
                fonts.regular(),
                localized_px as f32,
                &word.localized,
                LOCALIZED_COLOR,
                center_x as f32,
                (top_y + gap + english_px / 2.0) as f32,
            );
        }
    }
}

/// Shrink the font size until the line fits the text region.
fn fit_px(fonts: &FontCatalog, bold: bool, text: &str, px: f64, max_width: f64) -> f64 {
    let font = if bold { fonts.bold() } else { fonts.regular() };
    let width = f64::from(measure_line(font, px as f32, text));
    if width > max_width && width > 0.0 {
        px * max_width / width
    } else {
        px
    }
}

/// Draw the user photo clipped to its (possibly rotated) overlay square.
/// Coordinates come from the transform in artwork-local percent space;
/// rotation is about the square's own center. Destination pixels are
/// inverse-mapped and the photo sampled bilinearly.
fn draw_overlay(
    canvas: &mut RgbaImage,
    photo: &RgbaImage,
    transform: &OverlayTransform,
    image_x: f64,
    image_y: f64,
    image_size: f64,
) {
    let side = image_size * transform.width / 100.0;
    if side < 1.0 || photo.width() == 0 || photo.height() == 0 {
        return;
    }
    let origin_x = image_x + image_size * transform.x / 100.0;
    let origin_y = image_y + image_size * transform.y / 100.0;
    let center = Point::new(origin_x + side / 2.0, origin_y + side / 2.0);

    let theta = transform.rotation.to_radians();
    let inverse = Affine::rotate_about(-theta, center);

    // Bounding box of the rotated square, clamped to the canvas.
    let forward = Affine::rotate_about(theta, center);
    let corners = [
        Point::new(origin_x, origin_y),
        Point::new(origin_x + side, origin_y),
        Point::new(origin_x, origin_y + side),
        Point::new(origin_x + side, origin_y + side),
    ];
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for c in corners {
        let p = forward * c;
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.ceil().min(f64::from(canvas.width())) as u32).max(x0);
    let y1 = (max_y.ceil().min(f64::from(canvas.height())) as u32).max(y0);

    let (pw, ph) = (f64::from(photo.width()), f64::from(photo.height()));
    for y in y0..y1 {
        for x in x0..x1 {
            let dst = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let src = inverse * dst;
            if src.x < origin_x || src.x >= origin_x + side {
                continue;
            }
            if src.y < origin_y || src.y >= origin_y + side {
                continue;
            }
            let u = (src.x - origin_x) / side * pw - 0.5;
            let v = (src.y - origin_y) / side * ph - 0.5;
            let sample = sample_bilinear(photo, u, v);
            let px = canvas.get_pixel_mut(x, y);
            *px = over_opaque(*px, sample);
        }
    }
}

/// Bilinear sample with edge clamping.
fn sample_bilinear(img: &RgbaImage, u: f64, v: f64) -> Rgba<u8> {
    let max_x = img.width() as i64 - 1;
    let max_y = img.height() as i64 - 1;
    let x0 = (u.floor() as i64).clamp(0, max_x);
    let y0 = (v.floor() as i64).clamp(0, max_y);
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);
    let fx = (u - u.floor()).clamp(0.0, 1.0);
    let fy = (v - v.floor()).clamp(0.0, 1.0);

    let p00 = img.get_pixel(x0 as u32, y0 as u32);
    let p10 = img.get_pixel(x1 as u32, y0 as u32);
    let p01 = img.get_pixel(x0 as u32, y1 as u32);
    let p11 = img.get_pixel(x1 as u32, y1 as u32);

    let mut out = [0u8; 4];
    for (i, o) in out.iter_mut().enumerate() {
        let top = f64::from(p00[i]) * (1.0 - fx) + f64::from(p10[i]) * fx;
        let bottom = f64::from(p01[i]) * (1.0 - fx) + f64::from(p11[i]) * fx;
        *o = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Source-over for a straight-alpha source onto the opaque card canvas.
fn over_opaque(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let mix = |s: u8, d: u8| (f64::from(s) * a + f64::from(d) * (1.0 - a)).round() as u8;
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        dst[3],
    ])
}

/// Alpha-blend `src` onto `canvas` with its top-left at `(x, y)`, clipped
/// to the canvas.
fn blit_over(canvas: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let (cw, ch) = canvas.dimensions();
    for (sx, sy, px) in src.enumerate_pixels() {
        let dx = x + i64::from(sx);
        let dy = y + i64::from(sy);
        if dx < 0 || dy < 0 || dx >= i64::from(cw) || dy >= i64::from(ch) {
            continue;
        }
        let dst = canvas.get_pixel_mut(dx as u32, dy as u32);
        *dst = over_opaque(*dst, *px);
    }
}

/// 6 px black frame whose stroke is centered 3 px inside the canvas edge.
fn draw_border(canvas: &mut RgbaImage) {
    let (w, h) = canvas.dimensions();
    // A 6 px stroke centered 3 px inside the edge covers the outermost
    // 6 px band on every side.
    let band = BORDER_INSET_PX + BORDER_PX / 2;
    let black = Rgba([0, 0, 0, 255]);
    for y in 0..h {
        for x in 0..w {
            if x < band || y < band || x >= w - band || y >= h - band {
                canvas.put_pixel(x, y, black);
            }
        }
    }
}
