//! # Sheet Grid
//!
//! Slot geometry for the fixed card grid. Slots are numbered row-major,
//! left to right then top to bottom. Coordinates use a top-left origin
//! with y growing downward; the PDF writer flips them.

use crate::config::SheetConfig;

/// A grid position on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlot {
    pub column: usize,
    pub row: usize,
}

impl PageSlot {
    /// The slot at row-major index `index`.
    pub fn from_index(index: usize, columns: usize) -> Self {
        Self {
            column: index % columns,
            row: index / columns,
        }
    }
}

/// An axis-aligned rectangle in points, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Shrink by `d` on every side.
    pub fn inset(&self, d: f64) -> Rect {
        Rect {
            x: self.x + d,
            y: self.y + d,
            width: self.width - 2.0 * d,
            height: self.height - 2.0 * d,
        }
    }
}

/// Where the composited card (bleed included) goes for `slot`.
pub fn slot_rect(slot: PageSlot, config: &SheetConfig) -> Rect {
    let (fw, fh) = config.footprint_pt();
    let margin = config.margin_pt();
    Rect {
        x: margin + slot.column as f64 * fw,
        y: margin + slot.row as f64 * fh,
        width: fw,
        height: fh,
    }
}

/// The trim line for a card placed at `slot`.
pub fn guide_rect(slot: PageSlot, config: &SheetConfig) -> Rect {
    slot_rect(slot, config).inset(config.bleed_pt())
}
