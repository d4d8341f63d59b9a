//! A4 sheet packing.
//!
//! Cards fill each sheet left-to-right, top-to-bottom in the size profile's
//! grid. Placement is pure arithmetic over the card index; the packer never
//! looks at pixels.

use crate::layout::CardSizeProfile;

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Where one card lands on its sheet. `x_mm`/`y_mm` are the top-left corner
/// measured from the sheet's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellPlacement {
    pub card_index: usize,
    pub col: usize,
    pub row: usize,
    pub x_mm: f64,
    pub y_mm: f64,
}

/// One A4 sheet's worth of placements, in fill order.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub cells: Vec<CellPlacement>,
}

/// Lay out `count` cards onto as many sheets as the profile's grid needs.
/// The last page may be partially filled; zero cards yields zero pages.
pub fn paginate(count: usize, size: &CardSizeProfile) -> Vec<Page> {
    let per_sheet = size.cards_per_sheet.max(1);
    let mut pages: Vec<Page> = Vec::with_capacity(count.div_ceil(per_sheet));

    for index in 0..count {
        if index % per_sheet == 0 {
            pages.push(Page::default());
        }
        let slot = index % per_sheet;
        let col = slot % size.cols;
        let row = slot / size.cols;
        let cell = CellPlacement {
            card_index: index,
            col,
            row,
            x_mm: col as f64 * size.bleed.width_mm,
            y_mm: row as f64 * size.bleed.height_mm,
        };
        if let Some(page) = pages.last_mut() {
            page.cells.push(cell);
        }
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::find_size_profile;

    #[test]
    fn fourteen_standard_cards_fill_three_pages() {
        let size = find_size_profile("standard").unwrap();
        let pages = paginate(14, size);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].cells.len(), 6);
        assert_eq!(pages[1].cells.len(), 6);
        assert_eq!(pages[2].cells.len(), 2);

        // Page boundaries reset the grid.
        let first_on_second = pages[1].cells[0];
        assert_eq!(first_on_second.card_index, 6);
        assert_eq!((first_on_second.col, first_on_second.row), (0, 0));
        assert_eq!((first_on_second.x_mm, first_on_second.y_mm), (0.0, 0.0));
    }

    #[test]
    fn placement_steps_by_bleed_size() {
        let size = find_size_profile("standard").unwrap();
        let pages = paginate(4, size);
        let cells = &pages[0].cells;
        assert_eq!((cells[1].col, cells[1].row), (1, 0));
        assert_eq!(cells[1].x_mm, size.bleed.width_mm);
        assert_eq!(cells[1].y_mm, 0.0);
        assert_eq!((cells[2].col, cells[2].row), (0, 1));
        assert_eq!(cells[2].y_mm, size.bleed.height_mm);
    }

    #[test]
    fn zero_cards_zero_pages() {
        let size = find_size_profile("mini").unwrap();
        assert!(paginate(0, size).is_empty());
    }

    #[test]
    fn exact_multiple_has_no_partial_page() {
        let size = find_size_profile("square").unwrap();
        let pages = paginate(18, size);
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.cells.len() == 9));
    }
}
