// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `data:` URLs for embedded images. HTML output uses them verbatim; PDF
// output decodes them back into bytes.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use walletsheet_core::error::{Result, SheetError};
use walletsheet_core::types::{ImageFormat, ImageRef};

/// Wrap encoded image bytes in a base64 `data:` URL.
pub fn encode(format: ImageFormat, bytes: &[u8]) -> ImageRef {
    ImageRef::from_data_url(format!(
        "data:{};base64,{}",
        format.mime_type(),
        BASE64.encode(bytes)
    ))
}

/// Decode a `data:` URL into its declared format and raw bytes.
///
/// Anything that is not a base64 image URL of a supported type is a backend
/// error: the image cannot be drawn.
pub fn decode(image: &ImageRef) -> Result<(ImageFormat, Vec<u8>)> {
    let (mime, payload) = image.data_url_parts().ok_or_else(|| {
        SheetError::RenderBackend(format!(
            "image reference is not a base64 data URL: {}",
            preview(image.as_str())
        ))
    })?;
    let format = ImageFormat::from_mime_type(mime).ok_or_else(|| {
        SheetError::RenderBackend(format!("unsupported image type in data URL: {mime}"))
    })?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|err| SheetError::RenderBackend(format!("invalid base64 image data: {err}")))?;
    Ok((format, bytes))
}

/// Declared format of a data URL, if it has a recognizable one.
pub fn declared_format(image: &ImageRef) -> Option<ImageFormat> {
    image
        .data_url_parts()
        .and_then(|(mime, _)| ImageFormat::from_mime_type(mime))
}

// Error messages should not drag a whole base64 blob along.
fn preview(s: &str) -> String {
    match s.char_indices().nth(48) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_owned(),
    }
}
