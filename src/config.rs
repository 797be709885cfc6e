//! # Sheet Geometry
//!
//! Every physical dimension the pipeline needs lives in one immutable
//! [`SheetConfig`], built once and passed by reference to the compositor,
//! the layout engine and the PDF writer. Physical sizes are stored in
//! millimetres and converted on demand: to points for the page, to pixels
//! for the raster work.

/// Points per millimetre (72 pt per inch, 25.4 mm per inch).
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// Convert millimetres to PDF points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}

/// Convert millimetres to whole pixels at `dpi`, truncating.
pub fn mm_to_px(mm: f64, dpi: u32) -> u32 {
    (mm / 25.4 * dpi as f64) as u32
}

/// Fixed geometry for a print-and-play sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetConfig {
    /// Page size in points (width, height).
    pub page_size: (f64, f64),
    /// Distance from the page's top-left corner to the first card, in mm.
    pub page_margin_mm: f64,
    /// Trimmed card width in mm.
    pub card_width_mm: f64,
    /// Trimmed card height in mm.
    pub card_height_mm: f64,
    /// Bleed added on every side of the card, in mm.
    pub bleed_mm: f64,
    /// Raster density used when compositing.
    pub dpi: u32,
    pub columns: usize,
    pub rows: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            // A4
            page_size: (595.28, 841.89),
            page_margin_mm: 5.0,
            card_width_mm: 63.0,
            card_height_mm: 88.0,
            bleed_mm: 3.0,
            dpi: 300,
            columns: 3,
            rows: 3,
        }
    }
}

impl SheetConfig {
    pub fn cards_per_page(&self) -> usize {
        self.columns * self.rows
    }

    /// Card size in pixels, without bleed.
    pub fn card_px(&self) -> (u32, u32) {
        (
            mm_to_px(self.card_width_mm, self.dpi),
            mm_to_px(self.card_height_mm, self.dpi),
        )
    }

    pub fn bleed_px(&self) -> u32 {
        mm_to_px(self.bleed_mm, self.dpi)
    }

    /// Size of a composited card (card plus bleed on all sides), in pixels.
    pub fn composited_px(&self) -> (u32, u32) {
        let (w, h) = self.card_px();
        let b = self.bleed_px();
        (w + 2 * b, h + 2 * b)
    }

    /// Printed size of one card including bleed, in points.
    pub fn footprint_pt(&self) -> (f64, f64) {
        (
            mm_to_pt(self.card_width_mm + 2.0 * self.bleed_mm),
            mm_to_pt(self.card_height_mm + 2.0 * self.bleed_mm),
        )
    }

    pub fn bleed_pt(&self) -> f64 {
        mm_to_pt(self.bleed_mm)
    }

    pub fn margin_pt(&self) -> f64 {
        mm_to_pt(self.page_margin_mm)
    }
}
