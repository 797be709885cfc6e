//! # Bleed Compositing
//!
//! Printers never cut exactly on the trim line. To keep a slightly-off cut
//! from exposing white paper, each card is printed larger than its trimmed
//! size, and the extra margin is filled by mirroring the artwork outward:
//!
//! ```text
//!   +----+----------------+----+
//!   | TL |   top, flipped | TR |   corners: rotated 180 degrees
//!   +----+----------------+----+
//!   |left|                |rght|   sides: mirrored horizontally
//!   |mirr|    artwork     |mirr|
//!   |    |                |    |
//!   +----+----------------+----+
//!   | BL | bottom, flipped| BR |
//!   +----+----------------+----+
//! ```
//!
//! Mirroring (rather than stretching or repeating the edge pixel) keeps
//! borders and frame lines continuous across the cut.

use std::collections::HashMap;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::config::SheetConfig;
use crate::error::ProxyError;
use crate::image_loader::{distinct_refs, ImageCache};
use crate::layout::Side;
use crate::model::CardEntry;

/// Composited artwork for a card list, one image per distinct reference.
#[derive(Debug, Default)]
pub struct CompositedCards {
    pub images: Vec<RgbImage>,
    /// Per card, index into `images` of its face.
    pub faces: Vec<usize>,
    /// Per card, index into `images` of its back.
    pub backs: Vec<usize>,
}

impl CompositedCards {
    /// Index into `images` for one side of one card.
    pub fn image_index(&self, side: Side, card_index: usize) -> Option<usize> {
        match side {
            Side::Face => self.faces.get(card_index).copied(),
            Side::Back => self.backs.get(card_index).copied(),
        }
    }
}

/// Composite every distinct image the cards reference.
///
/// Compositing is a pure function of the source, so cards that share
/// artwork share one composited image.
pub fn composite_cards(
    cards: &[CardEntry],
    cache: &ImageCache,
    config: &SheetConfig,
) -> Result<CompositedCards, ProxyError> {
    let mut images = Vec::new();
    let mut index_of: HashMap<&str, usize> = HashMap::new();

    for url in distinct_refs(cards) {
        let source = cache
            .get(url)
            .ok_or_else(|| ProxyError::Render(format!("image '{}' was never fetched", url)))?;
        index_of.insert(url, images.len());
        images.push(composite_with_bleed(source, config)?);
    }
    log::debug!("Composited {} distinct images for {} cards", images.len(), cards.len());

    let faces = cards.iter().map(|c| index_of[c.face_ref.as_str()]).collect();
    let backs = cards.iter().map(|c| index_of[c.back_ref.as_str()]).collect();
    Ok(CompositedCards { images, faces, backs })
}

/// Resample `source` to the card size and surround it with mirrored bleed.
///
/// The result is always `composited_px()` in size, whatever the input
/// resolution.
pub fn composite_with_bleed(source: &RgbImage, config: &SheetConfig) -> Result<RgbImage, ProxyError> {
    let (w, h) = config.card_px();
    let b = config.bleed_px();

    if w == 0 || h == 0 {
        return Err(ProxyError::Render(format!("card size {}x{} px is empty", w, h)));
    }
    if b > w || b > h {
        return Err(ProxyError::Render(format!(
            "bleed of {} px is larger than the {}x{} px card",
            b, w, h
        )));
    }
    if source.width() == 0 || source.height() == 0 {
        return Err(ProxyError::Render("source image is empty".to_string()));
    }

    let card = imageops::resize(source, w, h, FilterType::Lanczos3);
    Ok(extend_mirrored(&card, b))
}

/// Surround an already-sized card with a mirrored margin of `b` pixels.
///
/// `b` must not exceed either card dimension.
pub fn extend_mirrored(card: &RgbImage, b: u32) -> RgbImage {
    let (w, h) = card.dimensions();
    let mut canvas = RgbImage::new(w + 2 * b, h + 2 * b);
    let (b64, w64, h64) = (b as i64, w as i64, h as i64);

    imageops::replace(&mut canvas, card, b64, b64);
    if b == 0 {
        return canvas;
    }

    // Edges
    let top = imageops::flip_vertical(&imageops::crop_imm(card, 0, 0, w, b).to_image());
    imageops::replace(&mut canvas, &top, b64, 0);

    let bottom = imageops::flip_vertical(&imageops::crop_imm(card, 0, h - b, w, b).to_image());
    imageops::replace(&mut canvas, &bottom, b64, b64 + h64);

    let left = imageops::flip_horizontal(&imageops::crop_imm(card, 0, 0, b, h).to_image());
    imageops::replace(&mut canvas, &left, 0, b64);

    let right = imageops::flip_horizontal(&imageops::crop_imm(card, w - b, 0, b, h).to_image());
    imageops::replace(&mut canvas, &right, b64 + w64, b64);

    // Corners
    let corners = [
        ((0, 0), (0, 0)),
        ((w - b, 0), (b64 + w64, 0)),
        ((0, h - b), (0, b64 + h64)),
        ((w - b, h - b), (b64 + w64, b64 + h64)),
    ];
    for ((sx, sy), (dx, dy)) in corners {
        let block = imageops::rotate180(&imageops::crop_imm(card, sx, sy, b, b).to_image());
        imageops::replace(&mut canvas, &block, dx, dy);
    }

    canvas
}
