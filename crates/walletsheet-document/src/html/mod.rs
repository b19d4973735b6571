// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML module: template loading and the HTML sheet writer.

pub mod template;
pub mod writer;

pub use template::{HtmlTemplate, TemplateVars};
pub use writer::HtmlWriter;
