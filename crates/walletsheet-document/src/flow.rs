// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flow engine: a top-down drawing cursor over fixed-size pages.
//
// The cursor tracks the current page, the vertical offset from the top of
// that page, and a stack of text styles. Every draw goes through here so the
// backends only ever see absolute positions.

use std::ops::{Deref, DerefMut};

use tracing::{debug, trace};
use walletsheet_core::error::Result;
use walletsheet_core::types::{ImageFormat, ImageRef, PaperSize};

/// Vertical gap left under every image (room for the caption baseline).
pub const IMAGE_GAP: f32 = 3.0;
/// Vertical gap left under a horizontal rule.
pub const RULE_GAP: f32 = 6.0;
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.3;
/// Base font size, active when no scope is open.
pub const BASE_FONT_SIZE: f32 = 10.0;

/// Helvetica advance widths for `' '..='~'`, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];
/// Width assumed for glyphs outside the table.
const FALLBACK_WIDTH: u16 = 1000;

/// Built-in font families the backends can select. Line wrapping measures
/// with Helvetica metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Helvetica,
}

/// Text colours used on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColour {
    Black,
    Grey,
    LightGrey,
}

impl TextColour {
    /// RGB components in 0.0..=1.0.
    pub fn rgb(&self) -> (f32, f32, f32) {
        match self {
            Self::Black => (0.0, 0.0, 0.0),
            Self::Grey => (0.4, 0.4, 0.4),
            Self::LightGrey => (0.6, 0.6, 0.6),
        }
    }
}

/// Font size and colour of the next text draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub colour: TextColour,
}

impl TextStyle {
    pub fn line_height(&self) -> f32 {
        self.size * LINE_HEIGHT_FACTOR
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: BASE_FONT_SIZE,
            colour: TextColour::Black,
        }
    }
}

/// An axis-aligned box, measured in points from the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Drawing primitives the flow engine needs from an output backend.
///
/// Coordinates are absolute, in points, measured from the top-left corner of
/// the page; `y` is the top of the drawn item.
pub trait DrawBackend {
    fn set_font_family(&mut self, family: FontFamily) -> Result<()>;

    /// Append a new blank page.
    fn insert_page(&mut self) -> Result<()>;

    fn draw_text(&mut self, page: usize, x: f32, y: f32, style: TextStyle, text: &str)
    -> Result<()>;

    fn draw_image(
        &mut self,
        page: usize,
        image: &ImageRef,
        format: ImageFormat,
        frame: Rect,
    ) -> Result<()>;

    /// Horizontal line from `x_start` to `x_end` at height `y`.
    fn draw_rule(&mut self, page: usize, x_start: f32, x_end: f32, y: f32) -> Result<()>;
}

/// Page size and margins, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    /// Standard sheet margins on the given paper.
    pub fn for_paper(paper: PaperSize) -> Self {
        let (width, height) = paper.dimensions_pt();
        Self {
            width,
            height,
            margin_top: 30.0,
            margin_bottom: 48.0,
            margin_left: 40.0,
            margin_right: 40.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Lowest vertical offset content may reach.
    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }
}

/// Image redrawn at the top of every page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageHeader {
    pub image: ImageRef,
    pub format: ImageFormat,
    pub width: f32,
    pub height: f32,
}

/// Mutable drawing position for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    page: usize,
    y: f32,
    styles: Vec<TextStyle>,
}

impl Cursor {
    fn new(y: f32) -> Self {
        Self {
            page: 0,
            y,
            styles: vec![TextStyle::default()],
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Number of open style scopes.
    pub fn depth(&self) -> usize {
        self.styles.len() - 1
    }

    pub fn style(&self) -> TextStyle {
        // The base style is never popped.
        self.styles.last().copied().unwrap_or_default()
    }
}

/// The flow engine: a cursor bound to one backend for one render.
pub struct Flow<B: DrawBackend> {
    backend: B,
    geometry: PageGeometry,
    header: Option<PageHeader>,
    cursor: Cursor,
}

impl<B: DrawBackend> Flow<B> {
    /// Start on page 0 at the top margin and draw the page header.
    ///
    /// The backend must already hold that first page.
    pub fn new(mut backend: B, geometry: PageGeometry, header: Option<PageHeader>) -> Result<Self> {
        backend.set_font_family(FontFamily::Helvetica)?;
        let mut flow = Self {
            backend,
            geometry,
            header,
            cursor: Cursor::new(geometry.margin_top),
        };
        flow.draw_header()?;
        Ok(flow)
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Move the cursor down by `delta` (up when negative). Not clamped.
    pub fn advance(&mut self, delta: f32) {
        self.cursor.y += delta;
        trace!(delta, y = self.cursor.y, "Cursor advanced");
    }

    /// Put the cursor at an absolute offset on the current page, such as a
    /// position saved earlier from [`Cursor::y`].
    pub fn set_y(&mut self, y: f32) {
        self.cursor.y = y;
        trace!(y, "Cursor moved");
    }

    /// Start a new page: top margin, next page index, header redrawn.
    ///
    /// Only fails if the backend does.
    pub fn break_page(&mut self) -> Result<()> {
        self.backend.insert_page()?;
        self.cursor.page += 1;
        self.cursor.y = self.geometry.margin_top;
        debug!(page = self.cursor.page, "Page break");
        self.draw_header()
    }

    /// Break the page unless `height` more points fit above the bottom
    /// margin.
    pub fn ensure_room(&mut self, height: f32) -> Result<()> {
        if self.cursor.y + height > self.geometry.content_bottom() {
            self.break_page()?;
        }
        Ok(())
    }

    /// Open a font size scope. It closes when the returned guard drops.
    pub fn font_size(&mut self, size: f32) -> StyleScope<'_, B> {
        let style = TextStyle {
            size,
            ..self.cursor.style()
        };
        self.push_style(style)
    }

    /// Open a text colour scope. It closes when the returned guard drops.
    pub fn text_colour(&mut self, colour: TextColour) -> StyleScope<'_, B> {
        let style = TextStyle {
            colour,
            ..self.cursor.style()
        };
        self.push_style(style)
    }

    fn push_style(&mut self, style: TextStyle) -> StyleScope<'_, B> {
        self.cursor.styles.push(style);
        StyleScope { flow: self }
    }

    /// Draw text at the cursor, word-wrapped to the content width.
    ///
    /// With `advance` the cursor moves down one line height per line and the
    /// page breaks when a line would cross the bottom margin. Without it the
    /// cursor stays put (captions beside an image).
    pub fn draw_text(&mut self, text: &str, x_offset: f32, advance: bool) -> Result<()> {
        let max_width = self.geometry.content_width() - x_offset;
        self.draw_text_in(text, x_offset, max_width, advance)
    }

    /// [`Flow::draw_text`] wrapped to `max_width` points instead of the rest
    /// of the content width.
    pub fn draw_text_in(
        &mut self,
        text: &str,
        x_offset: f32,
        max_width: f32,
        advance: bool,
    ) -> Result<()> {
        let style = self.cursor.style();
        let line_height = style.line_height();
        let x = self.geometry.margin_left + x_offset;

        let mut y = self.cursor.y;
        for line in wrap_text(text, max_width, style.size) {
            if advance {
                self.ensure_room(line_height)?;
                self.backend
                    .draw_text(self.cursor.page, x, self.cursor.y, style, &line)?;
                self.cursor.y += line_height;
            } else {
                self.backend.draw_text(self.cursor.page, x, y, style, &line)?;
                y += line_height;
            }
        }
        Ok(())
    }

    /// Draw an image at the cursor and move down by its height plus
    /// [`IMAGE_GAP`].
    pub fn draw_image(
        &mut self,
        image: &ImageRef,
        format: ImageFormat,
        width: f32,
        height: f32,
        x_offset: f32,
    ) -> Result<()> {
        let frame = Rect {
            x: self.geometry.margin_left + x_offset,
            y: self.cursor.y,
            width,
            height,
        };
        self.backend
            .draw_image(self.cursor.page, image, format, frame)?;
        self.cursor.y += height + IMAGE_GAP;
        Ok(())
    }

    /// Full-width horizontal rule at the cursor.
    pub fn rule(&mut self) -> Result<()> {
        let x_start = self.geometry.margin_left;
        let x_end = self.geometry.width - self.geometry.margin_right;
        self.backend
            .draw_rule(self.cursor.page, x_start, x_end, self.cursor.y)?;
        self.cursor.y += RULE_GAP;
        Ok(())
    }

    fn draw_header(&mut self) -> Result<()> {
        let Some(header) = self.header.clone() else {
            return Ok(());
        };
        self.draw_image(&header.image, header.format, header.width, header.height, 0.0)
    }
}

/// An open style scope. Derefs to the flow so nested draws (and nested
/// scopes) go through it; dropping it restores the previous style.
pub struct StyleScope<'a, B: DrawBackend> {
    flow: &'a mut Flow<B>,
}

impl<B: DrawBackend> Deref for StyleScope<'_, B> {
    type Target = Flow<B>;

    fn deref(&self) -> &Flow<B> {
        self.flow
    }
}

impl<B: DrawBackend> DerefMut for StyleScope<'_, B> {
    fn deref_mut(&mut self) -> &mut Flow<B> {
        self.flow
    }
}

impl<B: DrawBackend> Drop for StyleScope<'_, B> {
    fn drop(&mut self) {
        if self.flow.cursor.styles.len() > 1 {
            self.flow.cursor.styles.pop();
        }
    }
}

fn glyph_width(c: char, font_size: f32) -> f32 {
    let units = match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - 0x20],
        _ => FALLBACK_WIDTH,
    };
    f32::from(units) * font_size / 1000.0
}

/// Rendered width of `text` in points.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(|c| glyph_width(c, font_size)).sum()
}

/// Split a paragraph into alternating runs of spaces and non-spaces.
fn space_runs(paragraph: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (i, c) in paragraph.char_indices() {
        let is_space = c == ' ';
        if in_space.is_some_and(|prev| prev != is_space) {
            runs.push(&paragraph[start..i]);
            start = i;
        }
        in_space = Some(is_space);
    }
    if start < paragraph.len() {
        runs.push(&paragraph[start..]);
    }
    runs
}

/// Wrap a multi-line string so that no line is wider than `max_width`
/// points at `font_size`.
///
/// Splits on existing newlines first, then breaks each paragraph at runs of
/// spaces. Spacing inside a line is kept as given; the run a line breaks at
/// is dropped. Words wider than a line are force-broken.
pub(crate) fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0.0;

        for run in space_runs(paragraph) {
            let width = text_width(run, font_size);
            if line_width + width <= max_width {
                line.push_str(run);
                line_width += width;
                continue;
            }

            if run.starts_with(' ') {
                if !line.is_empty() {
                    result.push(std::mem::take(&mut line));
                    line_width = 0.0;
                }
                continue;
            }

            if !line.is_empty() {
                let kept = line.trim_end_matches(' ').to_owned();
                result.push(kept);
                line.clear();
                line_width = 0.0;
            }
            for c in run.chars() {
                let w = glyph_width(c, font_size);
                if line_width + w > max_width && !line.is_empty() {
                    result.push(std::mem::take(&mut line));
                    line_width = 0.0;
                }
                line.push(c);
                line_width += w;
            }
        }

        result.push(line);
    }

    result
}
