// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// walletsheet-document: Recovery sheet composition.
//
// Normalizes backup data into a render model, encodes public keys as QR
// codes, lays the sheet out page by page with a flow cursor, and writes the
// result as HTML or PDF.

pub mod assemble;
pub mod dataurl;
pub mod flow;
pub mod grid;
pub mod html;
pub mod model;
pub mod pdf;
pub mod qr;
pub mod sheet;

// Re-export the primary structs so callers can use `walletsheet_document::RecoverySheet` etc.
pub use assemble::{RenderedSections, SheetWriter, assemble};
pub use flow::{DrawBackend, Flow, PageGeometry};
pub use grid::{GridPlanner, TilePlacement};
pub use html::template::HtmlTemplate;
pub use model::{PublicKeyEntry, RenderModel};
pub use pdf::backend::PdfBackend;
pub use qr::{QrEncoder, QrImage};
pub use sheet::RecoverySheet;
