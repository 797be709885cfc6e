//! # proxysheet
//!
//! Print-and-play sheets from a Tabletop Simulator deck export.
//!
//! A saved-object export lists the cards of a custom deck and the URLs of
//! their face and back artwork. proxysheet downloads that artwork, adds a
//! mirrored bleed around every card, and lays the cards out nine to an A4
//! page with a dashed cut guide on each trim line.
//!
//! ## Architecture
//!
//! ```text
//! Export JSON
//!       ↓
//!   [model]         — Parse decks and contained cards into CardEntry list
//!       ↓
//!   [image_loader]  — Fetch and decode each distinct artwork URL once
//!       ↓
//!   [bleed]         — Resample to card size, mirror-extend the edges
//!       ↓
//!   [layout]        — Plan pages: slots, rectangles, face/back order
//!       ↓
//!   [pdf]           — Serialize to PDF bytes
//! ```
//!
//! Geometry lives in one [`config::SheetConfig`] passed through every stage.

pub mod bleed;
pub mod config;
pub mod error;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod style;

use std::path::PathBuf;

use config::SheetConfig;
use error::ProxyError;
use image_loader::ImageSource;
use layout::PrintMode;
use pdf::{Metadata, PdfWriter};
use style::GuideColor;

/// Per-run choices.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub mode: PrintMode,
    pub guide_color: GuideColor,
    /// Parallel fetch workers; 1 fetches sequentially.
    pub jobs: usize,
    pub title: Option<String>,
    pub sheet: SheetConfig,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: PrintMode::Simplex,
            guide_color: GuideColor::Black,
            jobs: 1,
            title: None,
            sheet: SheetConfig::default(),
        }
    }
}

/// A finished document.
#[derive(Debug)]
pub struct RenderOutput {
    pub pdf: Vec<u8>,
    pub card_count: usize,
    pub page_count: usize,
}

/// Render an export described as JSON to PDF bytes.
pub fn render(json: &str, options: &RenderOptions, source: &dyn ImageSource) -> Result<RenderOutput, ProxyError> {
    let cards = model::parse_catalog(json)?;
    log::info!("Found {} cards", cards.len());
    if cards.is_empty() {
        log::warn!("No printable cards in the export; the document will be empty");
    }

    let cache = image_loader::fetch_all(&cards, source, options.jobs)?;
    log::debug!("Fetched {} distinct images", cache.len());

    let composited = bleed::composite_cards(&cards, &cache, &options.sheet)?;
    let pages = layout::plan_pages(cards.len(), options.mode, &options.sheet);
    if options.mode == PrintMode::Simplex && !pages.is_empty() {
        log::info!(
            "Simplex: back pages follow all face pages in the same slot order; \
             turn the printed stack a half turn before printing the backs"
        );
    }

    let metadata = Metadata {
        title: options.title.clone(),
    };
    let pdf = PdfWriter::new().write(&pages, &composited, options.guide_color, &options.sheet, &metadata)?;

    Ok(RenderOutput {
        pdf,
        card_count: cards.len(),
        page_count: pages.len(),
    })
}

/// Read the export at `input`, render it, and write the PDF to `output`.
///
/// Nothing is written unless rendering succeeds.
pub fn run(
    input: &std::path::Path,
    output: &std::path::Path,
    options: &RenderOptions,
    source: &dyn ImageSource,
) -> Result<RenderOutput, ProxyError> {
    let json = std::fs::read_to_string(input).map_err(|e| ProxyError::Io {
        path: PathBuf::from(input),
        source: e,
    })?;
    let rendered = render(&json, options, source)?;
    std::fs::write(output, &rendered.pdf).map_err(|e| ProxyError::Io {
        path: PathBuf::from(output),
        source: e,
    })?;
    log::info!(
        "Wrote {} pages ({} bytes) to {}",
        rendered.page_count,
        rendered.pdf.len(),
        output.display()
    );
    Ok(rendered)
}
