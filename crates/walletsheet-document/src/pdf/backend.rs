// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF backend: turns flow engine draw calls into `printpdf` 0.8 operations.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`. Flow coordinates run top-down from the page's
// top-left corner; PDF coordinates run bottom-up, so every draw flips `y`.

use std::collections::HashMap;
use std::path::Path;

use printpdf::{
    BuiltinFont, Color, Line, LinePoint, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions,
    PdfWarnMsg, Point, Pt, RawImage, RawImageData, RawImageFormat, Rgb, TextItem, XObjectId,
    XObjectTransform,
};
use tracing::{debug, info, instrument, warn};
use walletsheet_core::error::{Result, SheetError};
use walletsheet_core::types::{ImageFormat, ImageRef, PaperSize};

use crate::dataurl;
use crate::flow::{DrawBackend, FontFamily, Rect, TextColour, TextStyle};

/// Share of the font size above the baseline.
const ASCENT: f32 = 0.8;
/// Images are placed at 72 DPI so one pixel is one point before scaling.
const IMAGE_DPI: f32 = 72.0;
const FOOTER_FONT_SIZE: f32 = 8.0;
const RULE_THICKNESS: f32 = 0.75;

/// An image already added to the document.
#[derive(Debug, Clone)]
struct EmbeddedImage {
    id: XObjectId,
    width_px: u32,
    height_px: u32,
}

/// Accumulates per-page operation lists for one document.
pub struct PdfBackend {
    doc: PdfDocument,
    paper_size: PaperSize,
    pages: Vec<Vec<Op>>,
    font: BuiltinFont,
    images: HashMap<ImageRef, EmbeddedImage>,
    page_numbers: bool,
}

impl PdfBackend {
    /// A document with one blank page.
    pub fn new(title: &str, paper_size: PaperSize) -> Self {
        Self {
            doc: PdfDocument::new(title),
            paper_size,
            pages: vec![Vec::new()],
            font: BuiltinFont::Helvetica,
            images: HashMap::new(),
            page_numbers: true,
        }
    }

    /// Whether to stamp "page/pages" in the footer of every page.
    pub fn with_page_numbers(mut self, enabled: bool) -> Self {
        self.page_numbers = enabled;
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page height in points.
    fn page_height(&self) -> f32 {
        self.paper_size.dimensions_pt().1
    }

    fn page_ops(&mut self, page: usize) -> Result<&mut Vec<Op>> {
        let count = self.pages.len();
        self.pages.get_mut(page).ok_or_else(|| {
            SheetError::RenderBackend(format!("page {page} does not exist ({count} pages)"))
        })
    }

    fn text_ops(&self, x: f32, baseline: f32, size: f32, colour: TextColour, text: &str) -> Vec<Op> {
        let (r, g, b) = colour.rgb();
        vec![
            Op::SetFillColor {
                col: Color::Rgb(Rgb::new(r, g, b, None)),
            },
            Op::StartTextSection,
            Op::SetTextCursor {
                pos: Point {
                    x: Pt(x),
                    y: Pt(baseline),
                },
            },
            Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font: self.font,
            },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(text.to_owned())],
                font: self.font,
            },
            Op::EndTextSection,
        ]
    }

    /// Decode and add an image once; later draws of the same reference reuse
    /// the XObject.
    fn embed(&mut self, image: &ImageRef, format: ImageFormat) -> Result<EmbeddedImage> {
        if let Some(embedded) = self.images.get(image) {
            return Ok(embedded.clone());
        }

        let (declared, bytes) = dataurl::decode(image)?;
        if declared != format {
            warn!(?declared, requested = ?format, "Image format differs from its data URL; using declared format");
        }
        let decoded = ::image::load_from_memory_with_format(&bytes, raster_format(declared))
            .map_err(|err| {
                SheetError::RenderBackend(format!("failed to decode image for PDF: {err}"))
            })?;

        let rgb = decoded.to_rgb8();
        let (width_px, height_px) = rgb.dimensions();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: width_px as usize,
            height: height_px as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let embedded = EmbeddedImage {
            id: self.doc.add_image(&raw),
            width_px,
            height_px,
        };
        debug!(width_px, height_px, "Image embedded");
        self.images.insert(image.clone(), embedded.clone());
        Ok(embedded)
    }

    /// Serialise the document.
    ///
    /// The bytes include backend-generated metadata (document id, creation
    /// date), so two renders of the same sheet are not byte-identical.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        let (page_w, page_h) = (Mm(w_mm as f32), Mm(h_mm as f32));
        let width_pt = self.paper_size.dimensions_pt().0;
        let total = self.pages.len();

        if self.page_numbers {
            for number in 1..=total {
                let label = format!("{number}/{total}");
                // Right-aligned, roughly half an em per glyph.
                let x = width_pt - 40.0 - label.len() as f32 * FOOTER_FONT_SIZE * 0.5;
                let ops = self.text_ops(x, 24.0, FOOTER_FONT_SIZE, TextColour::Grey, &label);
                self.pages[number - 1].extend(ops);
            }
        }

        let pages: Vec<PdfPage> = std::mem::take(&mut self.pages)
            .into_iter()
            .map(|ops| PdfPage::new(page_w, page_h, ops))
            .collect();
        self.doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "PDF serialisation warnings");
        }

        info!(pages = total, bytes = output.len(), "PDF document finished");
        Ok(output)
    }

    /// Finish the document and write it to a file.
    pub fn write_to_file(self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.finish()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote PDF to {}", path.as_ref().display());
        Ok(())
    }
}

impl DrawBackend for PdfBackend {
    fn set_font_family(&mut self, family: FontFamily) -> Result<()> {
        self.font = match family {
            FontFamily::Helvetica => BuiltinFont::Helvetica,
        };
        Ok(())
    }

    fn insert_page(&mut self) -> Result<()> {
        self.pages.push(Vec::new());
        Ok(())
    }

    fn draw_text(
        &mut self,
        page: usize,
        x: f32,
        y: f32,
        style: TextStyle,
        text: &str,
    ) -> Result<()> {
        check_builtin_encodable(text)?;
        let baseline = self.page_height() - y - style.size * ASCENT;
        let ops = self.text_ops(x, baseline, style.size, style.colour, text);
        self.page_ops(page)?.extend(ops);
        Ok(())
    }

    fn draw_image(
        &mut self,
        page: usize,
        image: &ImageRef,
        format: ImageFormat,
        frame: Rect,
    ) -> Result<()> {
        let embedded = self.embed(image, format)?;
        let bottom = self.page_height() - frame.y - frame.height;
        let op = Op::UseXobject {
            id: embedded.id,
            transform: XObjectTransform {
                translate_x: Some(Pt(frame.x)),
                translate_y: Some(Pt(bottom)),
                scale_x: Some(frame.width / embedded.width_px as f32),
                scale_y: Some(frame.height / embedded.height_px as f32),
                dpi: Some(IMAGE_DPI),
                rotate: None,
            },
        };
        self.page_ops(page)?.push(op);
        Ok(())
    }

    fn draw_rule(&mut self, page: usize, x_start: f32, x_end: f32, y: f32) -> Result<()> {
        let y = self.page_height() - y;
        let point = |x: f32| LinePoint {
            p: Point { x: Pt(x), y: Pt(y) },
            bezier: false,
        };
        let ops = [
            Op::SetOutlineColor {
                col: Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)),
            },
            Op::SetOutlineThickness {
                pt: Pt(RULE_THICKNESS),
            },
            Op::DrawLine {
                line: Line {
                    points: vec![point(x_start), point(x_end)],
                    is_closed: false,
                },
            },
        ];
        self.page_ops(page)?.extend(ops);
        Ok(())
    }
}

/// Builtin fonts carry no Unicode mapping; anything past printable ASCII
/// would come out as the wrong glyphs. Only the code point is reported so
/// secrets never reach the error text.
fn check_builtin_encodable(text: &str) -> Result<()> {
    match text.chars().find(|&c| c != ' ' && !c.is_ascii_graphic()) {
        Some(c) => Err(SheetError::RenderBackend(format!(
            "character U+{:04X} cannot be drawn with the builtin PDF font",
            c as u32
        ))),
        None => Ok(()),
    }
}

fn raster_format(format: ImageFormat) -> ::image::ImageFormat {
    match format {
        ImageFormat::Png => ::image::ImageFormat::Png,
        ImageFormat::Jpeg => ::image::ImageFormat::Jpeg,
    }
}
