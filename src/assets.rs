use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use image::{Rgba, RgbaImage};
use tracing::warn;

use crate::{
    error::CardResult,
    model::WordEntry,
};

/// Artwork source tried when a word's artwork reference does not resolve or
/// its image fails to load.
pub const PLACEHOLDER_SOURCE: &str = "cards/placeholder-cartoon.png";

/// Diagonal fallback gradient stops (pale yellow, pale pink, pale purple).
const GRADIENT_STOPS: [[u8; 3]; 3] = [
    [0xFE, 0xF3, 0xC7],
    [0xFB, 0xCF, 0xE8],
    [0xDD, 0xD6, 0xFE],
];

/// Byte-level access to artwork and photo sources. Implementations decide
/// what a source string means (path under a root, key into a fixture map).
pub trait AssetSource {
    fn load(&self, source: &str) -> CardResult<Vec<u8>>;
}

/// Loads sources as paths below a root directory.
#[derive(Clone, Debug)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FsAssetSource {
    fn load(&self, source: &str) -> CardResult<Vec<u8>> {
        let path = self.root.join(source);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read asset '{}'", path.display()))?;
        Ok(bytes)
    }
}

/// In-memory source keyed by source string. Used by tests and embedders
/// that already hold the bytes.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetSource {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(source.into(), bytes);
    }
}

impl AssetSource for MemoryAssetSource {
    fn load(&self, source: &str) -> CardResult<Vec<u8>> {
        self.entries
            .get(source)
            .cloned()
            .ok_or_else(|| crate::error::CardError::decode(format!("unknown source '{source}'")))
    }
}

/// Decode an encoded raster image into straight-alpha RGBA8.
pub fn decode_rgba(bytes: &[u8]) -> CardResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.to_rgba8())
}

/// Resolve and decode a word's artwork for a template.
///
/// Tries the entry's own reference first, then the placeholder asset.
/// `None` means both failed and the caller paints the fallback gradient;
/// this function never errors.
pub fn load_artwork(
    source: &dyn AssetSource,
    word: &WordEntry,
    template: &str,
) -> Option<RgbaImage> {
    if let Some(url) = word.artwork.resolve(template) {
        match source.load(url).and_then(|bytes| decode_rgba(&bytes)) {
            Ok(img) => return Some(img),
            Err(err) => {
                warn!(word = %word.id, source = url, %err, "artwork failed to load, trying placeholder");
            }
        }
    }

    match source
        .load(PLACEHOLDER_SOURCE)
        .and_then(|bytes| decode_rgba(&bytes))
    {
        Ok(img) => Some(img),
        Err(err) => {
            warn!(word = %word.id, %err, "placeholder failed to load, using gradient");
            None
        }
    }
}

/// Three-stop diagonal gradient used when no artwork can be loaded. Pure
/// function of the dimensions, so renders stay deterministic.
pub fn fallback_gradient(width: u32, height: u32) -> RgbaImage {
    let span = (width.saturating_sub(1) + height.saturating_sub(1)).max(1) as f64;
    RgbaImage::from_fn(width, height, |x, y| {
        let t = (x + y) as f64 / span;
        let (from, to, local) = if t < 0.5 {
            (GRADIENT_STOPS[0], GRADIENT_STOPS[1], t * 2.0)
        } else {
            (GRADIENT_STOPS[1], GRADIENT_STOPS[2], (t - 0.5) * 2.0)
        };
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * local).round() as u8;
        Rgba([
            lerp(from[0], to[0]),
            lerp(from[1], to[1]),
            lerp(from[2], to[2]),
            255,
        ])
    })
}

#[cfg(test)]
pub(crate) fn encode_png(img: &RgbaImage) -> Vec<u8> {
    use std::io::Cursor;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArtworkRef, OverlayAnchor};

    fn word_with(artwork: ArtworkRef) -> WordEntry {
        WordEntry {
            id: "w".to_string(),
            english: "Word".to_string(),
            localized: "wort".to_string(),
            artwork,
            anchor: OverlayAnchor {
                x: 0.0,
                y: 0.0,
                width: 20.0,
                rotation: 0.0,
            },
        }
    }

    fn solid_png(r: u8, g: u8, b: u8) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(2, 2, Rgba([r, g, b, 255])))
    }

    #[test]
    fn decode_rgba_roundtrips_png() {
        let img = decode_rgba(&solid_png(9, 8, 7)).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0, [9, 8, 7, 255]);
    }

    #[test]
    fn decode_rgba_rejects_garbage() {
        assert!(decode_rgba(b"not an image").is_err());
    }

    #[test]
    fn load_artwork_uses_resolved_source() {
        let mut src = MemoryAssetSource::new();
        src.insert("a.png", solid_png(1, 2, 3));
        let word = word_with(ArtworkRef::Single("a.png".to_string()));
        let img = load_artwork(&src, &word, "cartoon").unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn load_artwork_falls_back_to_placeholder_then_none() {
        let mut src = MemoryAssetSource::new();
        src.insert(PLACEHOLDER_SOURCE, solid_png(4, 5, 6));
        let word = word_with(ArtworkRef::Single("missing.png".to_string()));
        let img = load_artwork(&src, &word, "cartoon").unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [4, 5, 6, 255]);

        let empty = MemoryAssetSource::new();
        assert!(load_artwork(&empty, &word, "cartoon").is_none());
    }

    #[test]
    fn gradient_is_deterministic_and_hits_all_stops() {
        let a = fallback_gradient(64, 64);
        let b = fallback_gradient(64, 64);
        assert_eq!(a.as_raw(), b.as_raw());

        assert_eq!(a.get_pixel(0, 0).0, [0xFE, 0xF3, 0xC7, 255]);
        assert_eq!(a.get_pixel(63, 63).0, [0xDD, 0xD6, 0xFE, 255]);
        // Midpoint of the diagonal sits on the middle stop.
        let mid = a.get_pixel(31, 32).0;
        assert_eq!(mid, [0xFB, 0xCF, 0xE8, 255]);
    }
}
