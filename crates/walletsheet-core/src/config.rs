// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render configuration.

use serde::{Deserialize, Serialize};

use crate::types::{ImageRef, PaperSize, QrErrorCorrection};

/// Built-in branding logo (154x30 PNG) printed at the top of every page.
pub const DEFAULT_BRANDING_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAJoAAAAeCAIAAABbvJCOAAAAa0lEQVR42u3ZsQkAIAwAQedwFrd0WEudIGChEMI9likk12nbKlSzApxKz7lmf3LsFKdwCidOnDhVmHMERdcyfz+PEydOnNaN0zxOnDhx4sSJB6d5nDhx4vQE70dFOIUTJ06cONNyCqdw6lsHinF64ZkipWkAAAAASUVORK5CYII=";

/// Network label used in the sheet title when none is given.
pub const DEFAULT_NETWORK: &str = "Bitcoin";

/// Settings for a single render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Print the identity, secrets, and public key pages.
    pub page1: bool,
    /// Print the password-encrypted secret page (also needs the secret).
    pub page2: bool,
    /// Print the recovery instructions.
    pub page3: bool,
    /// Image drawn in the header of every page.
    pub branding_image: ImageRef,
    /// Network name used in the sheet title.
    pub network: String,
    /// Paper size for PDF output.
    pub paper_size: PaperSize,
    /// Error correction level for public key QR codes.
    pub qr_error_correction: QrErrorCorrection,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page1: true,
            page2: true,
            page3: true,
            branding_image: ImageRef::from_data_url(DEFAULT_BRANDING_IMAGE),
            network: DEFAULT_NETWORK.to_owned(),
            paper_size: PaperSize::default(),
            qr_error_correction: QrErrorCorrection::default(),
        }
    }
}

impl RenderOptions {
    /// Defaults with `overrides` applied on top.
    pub fn merged(overrides: RenderOverrides) -> Self {
        Self::default().apply(overrides)
    }

    /// Shallow merge: every field set in `overrides` wins.
    pub fn apply(mut self, overrides: RenderOverrides) -> Self {
        if let Some(page1) = overrides.page1 {
            self.page1 = page1;
        }
        if let Some(page2) = overrides.page2 {
            self.page2 = page2;
        }
        if let Some(page3) = overrides.page3 {
            self.page3 = page3;
        }
        if let Some(image) = overrides.branding_image {
            self.branding_image = image;
        }
        if let Some(network) = overrides.network {
            self.network = network;
        }
        if let Some(paper_size) = overrides.paper_size {
            self.paper_size = paper_size;
        }
        if let Some(level) = overrides.qr_error_correction {
            self.qr_error_correction = level;
        }
        self
    }
}

/// Caller-supplied partial options. Unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOverrides {
    pub page1: Option<bool>,
    pub page2: Option<bool>,
    pub page3: Option<bool>,
    #[serde(alias = "brandingLogo")]
    pub branding_image: Option<ImageRef>,
    pub network: Option<String>,
    pub paper_size: Option<PaperSize>,
    pub qr_error_correction: Option<QrErrorCorrection>,
}

impl RenderOverrides {
    /// Layer `other` over `self`; fields set in `other` win.
    pub fn or_from(self, other: RenderOverrides) -> Self {
        Self {
            page1: other.page1.or(self.page1),
            page2: other.page2.or(self.page2),
            page3: other.page3.or(self.page3),
            branding_image: other.branding_image.or(self.branding_image),
            network: other.network.or(self.network),
            paper_size: other.paper_size.or(self.paper_size),
            qr_error_correction: other.qr_error_correction.or(self.qr_error_correction),
        }
    }
}
