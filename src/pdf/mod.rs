//! # PDF Serializer
//!
//! Takes planned pages and composited card images and writes a PDF file.
//!
//! This is a small from-scratch PDF 1.7 writer. A card sheet needs only
//! three things from the format: RGB image XObjects, image placement, and
//! stroked dashed rectangles. Writing the bytes ourselves keeps the output
//! exact and the dependency list short.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- Catalog
//! 2 0 obj ... endobj  <- Pages tree
//! 3 0 obj ... endobj  <- image XObjects, one per distinct composited card
//! ...                 <- per page: content stream, then Page dictionary
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Each composited image is embedded once and referenced from every page
//! that shows it, so a deck with one shared back costs one back image.

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use image::RgbImage;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::bleed::CompositedCards;
use crate::config::SheetConfig;
use crate::error::ProxyError;
use crate::layout::{PlannedPage, Side};
use crate::style::GuideColor;

/// Cut-guide stroke width in points.
const GUIDE_LINE_WIDTH: f64 = 0.5;
/// Dash pattern for cut guides: 2 pt on, 2 pt off.
const GUIDE_DASH: (f64, f64) = (2.0, 2.0);

/// Document information embedded in the PDF.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
}

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Object ID of each composited image, indexed as /Im0, /Im1, ...
    image_objects: Vec<usize>,
}

struct PdfObject {
    id: usize,
    data: Vec<u8>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write planned pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[PlannedPage],
        cards: &CompositedCards,
        guide: GuideColor,
        config: &SheetConfig,
        metadata: &Metadata,
    ) -> Result<Vec<u8>, ProxyError> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            image_objects: Vec::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = images, then content streams and page objects
        builder.objects.push(PdfObject { id: 0, data: vec![] });
        builder.objects.push(PdfObject { id: 1, data: vec![] });
        builder.objects.push(PdfObject { id: 2, data: vec![] });

        for image in &cards.images {
            let obj_id = Self::write_image_xobject(&mut builder, image);
            builder.image_objects.push(obj_id);
        }

        let (page_width, page_height) = config.page_size;
        let mut page_obj_ids: Vec<usize> = Vec::new();

        for page in pages {
            let used = Self::images_on_page(page, cards)?;
            let content = self.build_content_stream_for_page(page, cards, guide, page_height)?;
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_obj_id = builder.objects.len();
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            builder.objects.push(PdfObject {
                id: content_obj_id,
                data: content_data,
            });

            let page_obj_id = builder.objects.len();
            let xobject_resources = Self::build_xobject_resource_dict(&used, &builder);
            let resources = if xobject_resources.is_empty() {
                String::new()
            } else {
                format!("/XObject << {} >>", xobject_resources)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page_width, page_height, content_obj_id, resources
            );
            builder.objects.push(PdfObject {
                id: page_obj_id,
                data: page_dict.into_bytes(),
            });
            page_obj_ids.push(page_obj_id);
        }

        // Write Catalog (object 1)
        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        // Write Pages tree (object 2)
        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        // Info dictionary
        let info_obj_id = builder.objects.len();
        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::escape_pdf_string(title));
        }
        let _ = write!(
            info,
            "/Producer (proxysheet {}) /Creator (proxysheet) >>",
            env!("CARGO_PKG_VERSION")
        );
        builder.objects.push(PdfObject {
            id: info_obj_id,
            data: info.into_bytes(),
        });

        Ok(self.serialize(&builder, info_obj_id))
    }

    /// Distinct image indices a page draws, in ascending order.
    fn images_on_page(page: &PlannedPage, cards: &CompositedCards) -> Result<BTreeSet<usize>, ProxyError> {
        page.placements
            .iter()
            .map(|p| Self::image_for(page.side, p.card_index, cards))
            .collect()
    }

    fn image_for(side: Side, card_index: usize, cards: &CompositedCards) -> Result<usize, ProxyError> {
        cards
            .image_index(side, card_index)
            .filter(|&idx| idx < cards.images.len())
            .ok_or_else(|| {
                ProxyError::Render(format!("no {:?} image for card #{}", side, card_index))
            })
    }

    /// Build the PDF content stream for a single page.
    ///
    /// Rectangles arrive with a top-left origin; PDF's origin is bottom-left.
    fn build_content_stream_for_page(
        &self,
        page: &PlannedPage,
        cards: &CompositedCards,
        guide: GuideColor,
        page_height: f64,
    ) -> Result<String, ProxyError> {
        let mut stream = String::new();
        let color = guide.color();

        for placement in &page.placements {
            let img_idx = Self::image_for(page.side, placement.card_index, cards)?;

            let r = placement.image_rect;
            let y = page_height - r.y - r.height;
            let _ = write!(
                stream,
                "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                r.width, r.height, r.x, y, img_idx
            );

            let g = placement.guide_rect;
            let gy = page_height - g.y - g.height;
            let _ = write!(
                stream,
                "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n[{} {}] 0 d\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                color.r, color.g, color.b,
                GUIDE_LINE_WIDTH,
                GUIDE_DASH.0, GUIDE_DASH.1,
                g.x, gy, g.width, g.height
            );
        }

        Ok(stream)
    }

    /// Write a composited card as an RGB image XObject. Returns its object ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &RgbImage) -> usize {
        let compressed_rgb = compress_to_vec_zlib(image.as_raw(), 6);
        let obj_id = builder.objects.len();
        let mut obj_data: Vec<u8> = Vec::new();
        let _ = write!(
            obj_data,
            "<< /Type /XObject /Subtype /Image \
             /Width {} /Height {} \
             /ColorSpace /DeviceRGB \
             /BitsPerComponent 8 \
             /Filter /FlateDecode \
             /Length {} >>\nstream\n",
            image.width(),
            image.height(),
            compressed_rgb.len()
        );
        obj_data.extend_from_slice(&compressed_rgb);
        obj_data.extend_from_slice(b"\nendstream");
        builder.objects.push(PdfObject {
            id: obj_id,
            data: obj_data,
        });
        obj_id
    }

    /// Build the /XObject resource dict entries for a page.
    fn build_xobject_resource_dict(used: &BTreeSet<usize>, builder: &PdfBuilder) -> String {
        used.iter()
            .map(|&idx| format!("/Im{} {} 0 R", idx, builder.image_objects[idx]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Escape special characters in a PDF string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        // Header
        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for obj in builder.objects.iter().skip(1) {
            offsets[obj.id] = output.len();
            let header = format!("{} 0 obj\n", obj.id);
            output.extend_from_slice(header.as_bytes());
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}
