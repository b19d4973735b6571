// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML sheet writer: renders each sheet block as markup inside
// `<section class="page">` elements.

use std::fmt::Write as _;

use walletsheet_core::error::Result;
use walletsheet_core::types::{ExtraInfoItem, ImageRef};

use crate::assemble::SheetWriter;
use crate::model::PublicKeyEntry;
use crate::qr::QrEncoder;

/// Accumulates the page markup of one sheet.
pub struct HtmlWriter {
    branding: ImageRef,
    encoder: QrEncoder,
    pages: Vec<String>,
}

impl HtmlWriter {
    /// Start the first page, headed by `branding`.
    pub fn new(branding: ImageRef, encoder: QrEncoder) -> Self {
        let mut writer = Self {
            branding,
            encoder,
            pages: Vec::new(),
        };
        writer.open_page();
        writer
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Close the open page and return all page markup.
    pub fn finish(self) -> String {
        self.pages
            .into_iter()
            .map(|body| format!("<section class=\"page\">\n{body}</section>\n"))
            .collect()
    }

    fn open_page(&mut self) {
        let header = format!(
            "<header><img class=\"branding\" src=\"{}\" alt=\"branding\" /></header>\n",
            escape_attr(self.branding.as_str())
        );
        self.pages.push(header);
    }

    fn current(&mut self) -> &mut String {
        if self.pages.is_empty() {
            self.open_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

impl SheetWriter for HtmlWriter {
    fn title(&mut self, text: &str) -> Result<()> {
        let _ = writeln!(self.current(), "<h1>{}</h1>", escape_text(text));
        Ok(())
    }

    fn heading(&mut self, text: &str) -> Result<()> {
        let _ = writeln!(self.current(), "<h2>{}</h2>", escape_text(text));
        Ok(())
    }

    fn paragraph(&mut self, text: &str) -> Result<()> {
        let body = escape_text(text).replace('\n', "<br />\n");
        let _ = writeln!(self.current(), "<p>{body}</p>");
        Ok(())
    }

    fn emphasis(&mut self, text: &str) -> Result<()> {
        let _ = writeln!(
            self.current(),
            "<p class=\"identifier\">{}</p>",
            escape_text(text)
        );
        Ok(())
    }

    fn field(&mut self, label: &str, value: &str) -> Result<()> {
        let _ = writeln!(
            self.current(),
            "<h3>{}</h3>\n<p class=\"value\">{}</p>",
            escape_text(label),
            escape_text(value)
        );
        Ok(())
    }

    fn public_keys(&mut self, heading: &str, keys: &[PublicKeyEntry]) -> Result<()> {
        let mut block = format!(
            "<h3>{}</h3>\n<p>{} in total</p>\n<div class=\"public-keys\">\n",
            escape_text(heading),
            keys.len()
        );
        for key in keys {
            let qr = key.qr_image(&self.encoder)?;
            let _ = writeln!(
                block,
                "<figure><img src=\"{}\" width=\"{}\" height=\"{}\" alt=\"{}\" /><figcaption>{}</figcaption></figure>",
                escape_attr(qr.image_ref().as_str()),
                qr.width(),
                qr.height(),
                escape_attr(key.serialized_key()),
                escape_text(&key.caption())
            );
        }
        block.push_str("</div>\n");
        self.current().push_str(&block);
        Ok(())
    }

    fn extra_info(&mut self, item: &ExtraInfoItem) -> Result<()> {
        let subtitle = item
            .subtitle
            .as_deref()
            .map(|s| format!("<small>{}</small>", escape_text(s)))
            .unwrap_or_default();
        let _ = writeln!(
            self.current(),
            "<h3>{}{}</h3>\n<p class=\"value\">{}</p>",
            escape_text(&item.title),
            subtitle,
            escape_text(&item.value)
        );
        Ok(())
    }

    fn page_break(&mut self) -> Result<()> {
        self.open_page();
        Ok(())
    }
}

/// Escape text content. Quotes are legal in text nodes and stay as-is so
/// values like `M/0'` print verbatim.
pub(crate) fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value for a double-quoted attribute.
pub(crate) fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
