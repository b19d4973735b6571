// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flow-driven sheet writer: lays out each sheet block through the flow
// engine, independent of the drawing backend.

use walletsheet_core::error::Result;
use walletsheet_core::types::ExtraInfoItem;

use crate::assemble::SheetWriter;
use crate::flow::{DrawBackend, Flow, TextColour};
use crate::grid::{GridPlanner, Tile};
use crate::model::PublicKeyEntry;
use crate::qr::QrEncoder;

pub const FONT_SIZE_HEADER: f32 = 16.0;
pub const FONT_SIZE_SUBHEADER: f32 = 12.0;
pub const FONT_SIZE_NORMAL: f32 = 10.0;
pub const FONT_SIZE_SMALL: f32 = 8.0;

/// Gap between a field label and its value.
const LABEL_GAP: f32 = 5.0;
/// Gap between a section and the block that follows it.
const SECTION_GAP: f32 = 10.0;

/// Writes sheet blocks into a [`Flow`].
pub struct FlowWriter<B: DrawBackend> {
    flow: Flow<B>,
    encoder: QrEncoder,
    grid: GridPlanner,
}

impl<B: DrawBackend> FlowWriter<B> {
    pub fn new(flow: Flow<B>, encoder: QrEncoder) -> Self {
        Self {
            flow,
            encoder,
            grid: GridPlanner::default(),
        }
    }

    pub fn flow(&self) -> &Flow<B> {
        &self.flow
    }

    pub fn into_flow(self) -> Flow<B> {
        self.flow
    }
}

impl<B: DrawBackend> SheetWriter for FlowWriter<B> {
    fn title(&mut self, text: &str) -> Result<()> {
        self.flow.font_size(FONT_SIZE_HEADER).draw_text(text, 0.0, true)
    }

    fn heading(&mut self, text: &str) -> Result<()> {
        self.flow.advance(SECTION_GAP);
        let mut header = self.flow.font_size(FONT_SIZE_HEADER);
        header.draw_text(text, 0.0, true)?;
        header.rule()
    }

    fn paragraph(&mut self, text: &str) -> Result<()> {
        self.flow.font_size(FONT_SIZE_NORMAL).draw_text(text, 0.0, true)
    }

    fn emphasis(&mut self, text: &str) -> Result<()> {
        self.flow
            .font_size(FONT_SIZE_SUBHEADER)
            .text_colour(TextColour::Grey)
            .draw_text(text, 0.0, true)
    }

    fn field(&mut self, label: &str, value: &str) -> Result<()> {
        let mut sub = self.flow.font_size(FONT_SIZE_SUBHEADER);
        sub.text_colour(TextColour::Grey).draw_text(label, 0.0, true)?;
        sub.advance(LABEL_GAP);
        sub.font_size(FONT_SIZE_NORMAL).draw_text(value, 0.0, true)?;
        sub.advance(SECTION_GAP);
        Ok(())
    }

    fn public_keys(&mut self, heading: &str, keys: &[PublicKeyEntry]) -> Result<()> {
        {
            let mut sub = self.flow.font_size(FONT_SIZE_SUBHEADER);
            sub.text_colour(TextColour::Grey)
                .draw_text(heading, 0.0, true)?;
            sub.font_size(FONT_SIZE_NORMAL)
                .draw_text(&format!("{} in total", keys.len()), 0.0, true)?;
        }
        self.flow.advance(2.0 * SECTION_GAP);

        let mut images = Vec::with_capacity(keys.len());
        for key in keys {
            images.push(key.qr_image(&self.encoder)?.image_ref());
        }
        let captions: Vec<String> = keys.iter().map(PublicKeyEntry::caption).collect();
        let tiles: Vec<Tile<'_>> = images
            .into_iter()
            .zip(&captions)
            .map(|(image, caption)| Tile {
                image,
                caption: caption.as_str(),
            })
            .collect();

        // Smaller paper shrinks the tiles so a full row stays on the page.
        let grid = self.grid.fit_width(self.flow.geometry().content_width());
        grid.draw(&mut self.flow, &tiles, FONT_SIZE_SMALL)
    }

    fn extra_info(&mut self, item: &ExtraInfoItem) -> Result<()> {
        let mut sub = self.flow.font_size(FONT_SIZE_SUBHEADER);
        sub.text_colour(TextColour::Grey)
            .draw_text(&item.title, 0.0, true)?;
        if let Some(subtitle) = &item.subtitle {
            sub.font_size(FONT_SIZE_SMALL)
                .text_colour(TextColour::LightGrey)
                .draw_text(subtitle, 0.0, true)?;
        }
        sub.advance(LABEL_GAP);
        sub.font_size(FONT_SIZE_NORMAL)
            .draw_text(&item.value, 0.0, true)?;
        sub.advance(SECTION_GAP);
        Ok(())
    }

    fn page_break(&mut self) -> Result<()> {
        self.flow.break_page()
    }
}
