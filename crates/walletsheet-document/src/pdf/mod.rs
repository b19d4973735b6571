// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: printpdf drawing backend and the flow-driven sheet writer.

pub mod backend;
pub mod writer;

pub use backend::PdfBackend;
pub use writer::FlowWriter;
