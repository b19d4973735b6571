// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR encoding for public keys. Symbols are rasterised to PNG so the same
// image can be embedded in HTML (as a data URL) and in PDF (as an XObject).

use image::{DynamicImage, Luma};
use qrcode::{EcLevel, QrCode};
use tracing::{debug, instrument};
use walletsheet_core::error::{Result, SheetError};
use walletsheet_core::types::{ImageFormat, ImageRef, QrErrorCorrection};

use crate::dataurl;

/// Default minimum edge length of a rendered symbol, in pixels.
const DEFAULT_MIN_DIMENSION: u32 = 180;

/// A rendered QR symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct QrImage {
    width: u32,
    height: u32,
    image_ref: ImageRef,
}

impl QrImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// PNG data URL of the symbol.
    pub fn image_ref(&self) -> &ImageRef {
        &self.image_ref
    }
}

/// Encodes text into QR images at a fixed error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrEncoder {
    level: QrErrorCorrection,
    min_dimension: u32,
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new(QrErrorCorrection::default())
    }
}

impl QrEncoder {
    pub fn new(level: QrErrorCorrection) -> Self {
        Self {
            level,
            min_dimension: DEFAULT_MIN_DIMENSION,
        }
    }

    /// Set the minimum edge length of rendered symbols.
    pub fn with_min_dimension(mut self, pixels: u32) -> Self {
        self.min_dimension = pixels.max(1);
        self
    }

    pub fn level(&self) -> QrErrorCorrection {
        self.level
    }

    /// Encode `text` as a PNG QR symbol.
    ///
    /// Fails with [`SheetError::Encoding`] when the text does not fit in any
    /// symbol version at the configured level.
    #[instrument(skip(self, text), fields(text_len = text.len(), level = ?self.level))]
    pub fn encode(&self, text: &str) -> Result<QrImage> {
        let code = QrCode::with_error_correction_level(text, ec_level(self.level))
            .map_err(|err| SheetError::Encoding(format!("QR encode: {err}")))?;

        let raster = code
            .render::<Luma<u8>>()
            .min_dimensions(self.min_dimension, self.min_dimension)
            .build();
        let (width, height) = raster.dimensions();

        let mut png = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut png);
        DynamicImage::ImageLuma8(raster)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|err| SheetError::Encoding(format!("PNG encode: {err}")))?;

        debug!(width, height, png_len = png.len(), "QR symbol rendered");

        Ok(QrImage {
            width,
            height,
            image_ref: dataurl::encode(ImageFormat::Png, &png),
        })
    }
}

fn ec_level(level: QrErrorCorrection) -> EcLevel {
    match level {
        QrErrorCorrection::Low => EcLevel::L,
        QrErrorCorrection::Medium => EcLevel::M,
        QrErrorCorrection::Quartile => EcLevel::Q,
        QrErrorCorrection::High => EcLevel::H,
    }
}
