//! # Page Planning
//!
//! Turns an ordered card list into pages. Planning is pure: it works on card
//! indices and produces rectangles, so the geometry can be checked without
//! touching an image or a PDF stream.
//!
//! Cards fill pages in chunks of `cards_per_page`, each chunk taking slots
//! 0, 1, 2, ... in order. The final chunk may be short; its unused slots
//! are simply left blank.
//!
//! Two print modes decide how face and back pages interleave:
//!
//! - **Simplex**: every face page, then every back page. Backs use the same
//!   slot order as their faces, so the printed stack must be turned a half
//!   turn (not flipped on the long edge) before printing the backs.
//! - **Duplex**: face page 1, back page 1, face page 2, back page 2, ...

pub mod grid;

use crate::config::SheetConfig;
use grid::{guide_rect, slot_rect, PageSlot, Rect};

/// How face and back pages are ordered in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    #[default]
    Simplex,
    Duplex,
}

/// Which artwork a page carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Face,
    Back,
}

/// One card on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Index into the card list.
    pub card_index: usize,
    pub slot: PageSlot,
    /// Where the composited image (bleed included) is painted.
    pub image_rect: Rect,
    /// The dashed trim line.
    pub guide_rect: Rect,
}

/// A page ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPage {
    pub side: Side,
    /// Index of this page's card chunk; face and back pages of the same
    /// chunk share it.
    pub sheet_index: usize,
    pub placements: Vec<Placement>,
}

/// Number of pages needed for one side of `card_count` cards.
pub fn page_count(card_count: usize, config: &SheetConfig) -> usize {
    card_count.div_ceil(config.cards_per_page())
}

/// Placements for chunk `sheet_index` of a `card_count`-card list.
pub fn placements_for_page(sheet_index: usize, card_count: usize, config: &SheetConfig) -> Vec<Placement> {
    let per_page = config.cards_per_page();
    let start = sheet_index * per_page;
    let end = (start + per_page).min(card_count);

    (start..end)
        .enumerate()
        .map(|(slot_index, card_index)| {
            let slot = PageSlot::from_index(slot_index, config.columns);
            Placement {
                card_index,
                slot,
                image_rect: slot_rect(slot, config),
                guide_rect: guide_rect(slot, config),
            }
        })
        .collect()
}

/// Plan every page of the document.
pub fn plan_pages(card_count: usize, mode: PrintMode, config: &SheetConfig) -> Vec<PlannedPage> {
    let sheets = page_count(card_count, config);
    let page = |side: Side, sheet_index: usize| PlannedPage {
        side,
        sheet_index,
        placements: placements_for_page(sheet_index, card_count, config),
    };

    match mode {
        PrintMode::Simplex => (0..sheets)
            .map(|i| page(Side::Face, i))
            .chain((0..sheets).map(|i| page(Side::Back, i)))
            .collect(),
        PrintMode::Duplex => (0..sheets)
            .flat_map(|i| [page(Side::Face, i), page(Side::Back, i)])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sides(pages: &[PlannedPage]) -> Vec<(Side, usize, usize)> {
        pages
            .iter()
            .map(|p| (p.side, p.sheet_index, p.placements.len()))
            .collect()
    }

    #[test]
    fn test_page_count_is_ceiling() {
        let config = SheetConfig::default();
        assert_eq!(page_count(0, &config), 0);
        assert_eq!(page_count(1, &config), 1);
        assert_eq!(page_count(9, &config), 1);
        assert_eq!(page_count(10, &config), 2);
        assert_eq!(page_count(18, &config), 2);
        assert_eq!(page_count(19, &config), 3);
    }

    #[test]
    fn test_last_page_partially_filled() {
        let config = SheetConfig::default();
        for n in 1..40 {
            let pages = plan_pages(n, PrintMode::Simplex, &config);
            let faces: Vec<&PlannedPage> = pages.iter().filter(|p| p.side == Side::Face).collect();
            let expected_last = if n % 9 == 0 { 9 } else { n % 9 };
            assert_eq!(faces.last().unwrap().placements.len(), expected_last, "n = {}", n);
            for page in &faces[..faces.len() - 1] {
                assert_eq!(page.placements.len(), 9);
            }
        }
    }

    #[test]
    fn test_simplex_faces_then_backs() {
        let config = SheetConfig::default();
        let pages = plan_pages(10, PrintMode::Simplex, &config);
        assert_eq!(
            sides(&pages),
            vec![
                (Side::Face, 0, 9),
                (Side::Face, 1, 1),
                (Side::Back, 0, 9),
                (Side::Back, 1, 1),
            ]
        );
    }

    #[test]
    fn test_duplex_alternates() {
        let config = SheetConfig::default();
        let pages = plan_pages(10, PrintMode::Duplex, &config);
        assert_eq!(
            sides(&pages),
            vec![
                (Side::Face, 0, 9),
                (Side::Back, 0, 9),
                (Side::Face, 1, 1),
                (Side::Back, 1, 1),
            ]
        );
        assert_eq!(pages.len(), 2 * page_count(10, &config));
    }

    #[test]
    fn test_back_uses_same_slots_as_face() {
        let config = SheetConfig::default();
        let pages = plan_pages(14, PrintMode::Duplex, &config);
        for pair in pages.chunks(2) {
            assert_eq!(pair[0].placements, pair[1].placements);
        }
    }

    #[test]
    fn test_card_indices_are_consecutive() {
        let config = SheetConfig::default();
        let pages = plan_pages(20, PrintMode::Simplex, &config);
        let face_indices: Vec<usize> = pages
            .iter()
            .filter(|p| p.side == Side::Face)
            .flat_map(|p| p.placements.iter().map(|pl| pl.card_index))
            .collect();
        assert_eq!(face_indices, (0..20).collect::<Vec<_>>());
        assert_eq!(pages[2].placements[0].slot, PageSlot { column: 0, row: 0 });
        assert_eq!(pages[2].placements[0].card_index, 18);
    }

    #[test]
    fn test_nine_cards_fill_one_sheet() {
        let config = SheetConfig::default();
        let simplex = plan_pages(9, PrintMode::Simplex, &config);
        assert_eq!(sides(&simplex), vec![(Side::Face, 0, 9), (Side::Back, 0, 9)]);
        let duplex = plan_pages(9, PrintMode::Duplex, &config);
        assert_eq!(duplex.len(), 2);
    }

    #[test]
    fn test_no_cards_no_pages() {
        let config = SheetConfig::default();
        assert!(plan_pages(0, PrintMode::Simplex, &config).is_empty());
        assert!(plan_pages(0, PrintMode::Duplex, &config).is_empty());
    }
}
