//! Export orchestration.
//!
//! An [`ExportJob`] is an owned snapshot of everything an export needs:
//! the selected words, the session photo, any per-word overlay transforms
//! the user committed, the artwork template and the card size. Cards render
//! strictly one at a time, in selection order, so memory stays bounded by a
//! single card plus the growing output buffer.

use std::collections::BTreeMap;
use std::io::{BufWriter, Cursor, Write};

use anyhow::Context;
use image::RgbaImage;
use printpdf::{Image, ImageTransform, Mm, PdfDocument};
use tracing::info;
use zip::{write::FileOptions, ZipWriter};

use crate::{
    compose::{CardRasterizer, RenderedCard},
    error::{CardError, CardResult},
    layout::{CardSizeProfile, PRINT_DPI},
    model::{WordEntry, DEFAULT_TEMPLATE},
    sheet::{paginate, A4_HEIGHT_MM, A4_WIDTH_MM},
    transform::OverlayTransform,
};

/// JPEG quality used for card images embedded in the PDF.
const PDF_JPEG_QUALITY: u8 = 95;

/// Snapshot of one export request.
pub struct ExportJob {
    pub words: Vec<WordEntry>,
    pub photo: Option<RgbaImage>,
    /// Committed overlay transforms by word id. Words without an entry use
    /// the transform derived from their library anchor.
    pub transforms: BTreeMap<String, OverlayTransform>,
    pub template: String,
    pub size: CardSizeProfile,
}

impl ExportJob {
    pub fn new(words: Vec<WordEntry>, size: CardSizeProfile) -> Self {
        Self {
            words,
            photo: None,
            transforms: BTreeMap::new(),
            template: DEFAULT_TEMPLATE.to_string(),
            size,
        }
    }

    fn transform_for(&self, word: &WordEntry) -> OverlayTransform {
        self.transforms
            .get(&word.id)
            .copied()
            .unwrap_or_else(|| OverlayTransform::from_anchor(&word.anchor))
    }

    fn render_next(&self, raster: &CardRasterizer<'_>, index: usize) -> RenderedCard {
        let word = &self.words[index];
        info!(
            card = index + 1,
            total = self.words.len(),
            word = %word.english,
            "rendering card"
        );
        raster.render(
            word,
            self.photo.as_ref(),
            &self.transform_for(word),
            &self.template,
            &self.size,
        )
    }

    fn ensure_words_selected(&self) -> CardResult<()> {
        if self.words.is_empty() {
            return Err(CardError::validation("no words selected for export"));
        }
        Ok(())
    }

    /// Produce a multi-page A4 PDF with cards packed into the size
    /// profile's grid, one JPEG per card at print resolution.
    pub fn export_pdf(&self, raster: &CardRasterizer<'_>) -> CardResult<Vec<u8>> {
        self.ensure_words_selected()?;

        let pages = paginate(self.words.len(), &self.size);
        let (doc, first_page, first_layer) = PdfDocument::new(
            "Word Cards",
            Mm(A4_WIDTH_MM as f32),
            Mm(A4_HEIGHT_MM as f32),
            "cards",
        );

        for (page_index, page) in pages.iter().enumerate() {
            let layer = if page_index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_ref, layer_ref) =
                    doc.add_page(Mm(A4_WIDTH_MM as f32), Mm(A4_HEIGHT_MM as f32), "cards");
                doc.get_page(page_ref).get_layer(layer_ref)
            };

            for cell in &page.cells {
                let card = self.render_next(raster, cell.card_index);
                let jpeg = encode_jpeg(&card.pixels)?;
                let decoded = printpdf::image_crate::load_from_memory(&jpeg)
                    .map_err(|err| CardError::export(format!("re-read card jpeg: {err}")))?;
                let image = Image::from_dynamic_image(&decoded);

                // PDF origin is bottom-left; cells are measured from the
                // sheet's top-left.
                let y_from_bottom = A4_HEIGHT_MM - cell.y_mm - card.bleed.height_mm;
                image.add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(cell.x_mm as f32)),
                        translate_y: Some(Mm(y_from_bottom as f32)),
                        dpi: Some(PRINT_DPI as f32),
                        ..Default::default()
                    },
                );
            }
        }

        let mut out = Vec::new();
        doc.save(&mut BufWriter::new(&mut out))
            .context("write pdf")?;
        Ok(out)
    }

    /// Produce a ZIP archive holding one full-resolution PNG per card.
    pub fn export_archive(&self, raster: &CardRasterizer<'_>) -> CardResult<Vec<u8>> {
        self.ensure_words_selected()?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for index in 0..self.words.len() {
            let card = self.render_next(raster, index);
            let name = archive_entry_name(index, &self.words[index].english);
            zip.start_file(name, options)
                .context("start archive entry")?;
            let png = encode_png(&card.pixels)?;
            zip.write_all(&png).context("write archive entry")?;
        }

        let cursor = zip.finish().context("finalize archive")?;
        Ok(cursor.into_inner())
    }
}

/// `001_Blue-Car.png`: 1-based zero-padded index, whitespace runs in the
/// headword collapsed to single dashes.
fn archive_entry_name(index: usize, english: &str) -> String {
    let slug = english.split_whitespace().collect::<Vec<_>>().join("-");
    format!("{:03}_{}.png", index + 1, slug)
}

fn encode_jpeg(pixels: &RgbaImage) -> CardResult<Vec<u8>> {
    let rgb = image::DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, PDF_JPEG_QUALITY);
    rgb.write_with_encoder(encoder).context("encode jpeg")?;
    Ok(buf)
}

fn encode_png(pixels: &RgbaImage) -> CardResult<Vec<u8>> {
    let mut buf = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}
