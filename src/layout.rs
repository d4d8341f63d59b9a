//! Physical card catalog and per-size layout rules.
//!
//! A [`CardSizeProfile`] describes the print geometry (grid on an A4 sheet,
//! cut and bleed sizes in millimeters); a [`LayoutProfile`] derives from the
//! profile id the proportional rules the rasterizer uses to place artwork
//! and text. Larger physical cards get a bigger image ratio and smaller
//! padding; small cards switch to a horizontal image-left/text-right split
//! to keep the text legible.

pub const PRINT_DPI: f64 = 300.0;
pub const MM_PER_INCH: f64 = 25.4;

/// Convert a physical length to pixels at print resolution.
pub fn mm_to_px(mm: f64) -> u32 {
    (mm / MM_PER_INCH * PRINT_DPI).round() as u32
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MmSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl MmSize {
    pub const fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }
}

/// Physical print descriptor for one card size. Fixed catalog, read-only.
#[derive(Clone, Copy, Debug)]
pub struct CardSizeProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub cards_per_sheet: usize,
    pub cols: usize,
    pub rows: usize,
    /// Final trimmed size.
    pub cut: MmSize,
    /// Size including the printer trim margin; cards are rasterized and
    /// placed at this size.
    pub bleed: MmSize,
}

pub const CARD_SIZES: [CardSizeProfile; 6] = [
    CardSizeProfile {
        id: "extra-large",
        name: "Extra large",
        cards_per_sheet: 2,
        cols: 1,
        rows: 2,
        cut: MmSize::new(148.0, 105.0),
        bleed: MmSize::new(154.0, 111.0),
    },
    CardSizeProfile {
        id: "large",
        name: "Large",
        cards_per_sheet: 4,
        cols: 2,
        rows: 2,
        cut: MmSize::new(100.0, 138.0),
        bleed: MmSize::new(106.0, 144.0),
    },
    CardSizeProfile {
        id: "standard",
        name: "Standard",
        cards_per_sheet: 6,
        cols: 2,
        rows: 3,
        cut: MmSize::new(95.0, 68.0),
        bleed: MmSize::new(101.0, 74.0),
    },
    CardSizeProfile {
        id: "small",
        name: "Small",
        cards_per_sheet: 8,
        cols: 2,
        rows: 4,
        cut: MmSize::new(95.0, 68.0),
        bleed: MmSize::new(101.0, 74.0),
    },
    CardSizeProfile {
        id: "square",
        name: "Square",
        cards_per_sheet: 9,
        cols: 3,
        rows: 3,
        cut: MmSize::new(64.0, 64.0),
        bleed: MmSize::new(70.0, 70.0),
    },
    CardSizeProfile {
        id: "mini",
        name: "Mini",
        cards_per_sheet: 10,
        cols: 2,
        rows: 5,
        cut: MmSize::new(95.0, 55.0),
        bleed: MmSize::new(101.0, 61.0),
    },
];

/// Catalog lookup. `None` for ids the catalog does not know.
pub fn find_size_profile(id: &str) -> Option<&'static CardSizeProfile> {
    CARD_SIZES.iter().find(|p| p.id == id)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Image on the left, text stacked to its right.
    Horizontal,
    /// Image on top, text stacked below.
    Vertical,
}

/// Proportional layout rules for one card size. Ratios apply to the canvas
/// height for horizontal layouts and the canvas width for vertical ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutProfile {
    pub orientation: Orientation,
    pub image_ratio: f64,
    pub padding_ratio: f64,
    pub image_gap_ratio: f64,
    pub text_gap_ratio: f64,
    pub english_size_ratio: f64,
    pub localized_size_ratio: f64,
}

/// Derive the layout rules for a card-size id. Unknown ids fall back to the
/// `standard` rules so a newer size catalog never hard-fails here.
pub fn layout_profile(size_id: &str) -> LayoutProfile {
    match size_id {
        "extra-large" => LayoutProfile {
            orientation: Orientation::Vertical,
            image_ratio: 0.6,
            padding_ratio: 0.08,
            image_gap_ratio: 0.06,
            text_gap_ratio: 0.02,
            english_size_ratio: 0.08,
            localized_size_ratio: 0.06,
        },
        "large" => LayoutProfile {
            orientation: Orientation::Vertical,
            image_ratio: 0.55,
            padding_ratio: 0.1,
            image_gap_ratio: 0.05,
            text_gap_ratio: 0.02,
            english_size_ratio: 0.07,
            localized_size_ratio: 0.05,
        },
        "square" => LayoutProfile {
            orientation: Orientation::Vertical,
            image_ratio: 0.6,
            padding_ratio: 0.05,
            image_gap_ratio: 0.04,
            text_gap_ratio: 0.015,
            english_size_ratio: 0.055,
            localized_size_ratio: 0.04,
        },
        "mini" => LayoutProfile {
            orientation: Orientation::Horizontal,
            image_ratio: 0.5,
            padding_ratio: 0.06,
            image_gap_ratio: 0.04,
            text_gap_ratio: 0.015,
            english_size_ratio: 0.05,
            localized_size_ratio: 0.035,
        },
        // "standard", "small", and anything the catalog grows later.
        _ => LayoutProfile {
            orientation: Orientation::Horizontal,
            image_ratio: 0.5,
            padding_ratio: 0.08,
            image_gap_ratio: 0.05,
            text_gap_ratio: 0.02,
            english_size_ratio: 0.06,
            localized_size_ratio: 0.045,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mm_to_px_rounds_at_300_dpi() {
        // 25.4 mm is exactly one inch.
        assert_eq!(mm_to_px(25.4), 300);
        // Standard bleed 101x74 mm.
        assert_eq!(mm_to_px(101.0), 1193);
        assert_eq!(mm_to_px(74.0), 874);
    }

    #[test]
    fn catalog_has_six_profiles_with_consistent_grids() {
        assert_eq!(CARD_SIZES.len(), 6);
        for p in &CARD_SIZES {
            assert_eq!(p.cols * p.rows, p.cards_per_sheet, "{}", p.id);
            assert!(p.bleed.width_mm > p.cut.width_mm, "{}", p.id);
            assert!(p.bleed.height_mm > p.cut.height_mm, "{}", p.id);
        }
    }

    #[test]
    fn find_size_profile_is_exact() {
        assert_eq!(find_size_profile("square").map(|p| p.cards_per_sheet), Some(9));
        assert!(find_size_profile("poster").is_none());
    }

    #[test]
    fn unknown_layout_id_matches_standard() {
        assert_eq!(layout_profile("does-not-exist"), layout_profile("standard"));
    }

    #[test]
    fn standard_and_small_share_horizontal_rules() {
        assert_eq!(layout_profile("standard"), layout_profile("small"));
        assert_eq!(
            layout_profile("standard").orientation,
            Orientation::Horizontal
        );
        assert_eq!(
            layout_profile("extra-large").orientation,
            Orientation::Vertical
        );
    }
}
