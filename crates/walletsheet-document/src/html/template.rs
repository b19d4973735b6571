// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML template: `{{name}}` placeholder substitution over a page shell.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, instrument};
use walletsheet_core::error::{Result, SheetError};

const BUILTIN_NAME: &str = "recovery_sheet.html";
const BUILTIN_SOURCE: &str = include_str!("../../templates/recovery_sheet.html");

/// Values substituted into a template. Values are inserted as-is; callers
/// escape them first.
pub type TemplateVars = BTreeMap<&'static str, String>;

/// A loaded template resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTemplate {
    name: String,
    source: String,
}

impl Default for HtmlTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl HtmlTemplate {
    /// The template shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            name: BUILTIN_NAME.to_owned(),
            source: BUILTIN_SOURCE.to_owned(),
        }
    }

    /// Load a template from disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| {
            SheetError::TemplateLoad(format!("{}: {}", path.display(), err))
        })?;
        debug!(len = source.len(), "Template loaded");
        Ok(Self {
            name: path.display().to_string(),
            source,
        })
    }

    /// Build a template from an in-memory string.
    pub fn from_source(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Substitute every `{{ name }}` placeholder.
    ///
    /// Unknown names and unterminated placeholders are render errors; a
    /// template never renders with holes in it.
    pub fn render(&self, vars: &TemplateVars) -> Result<String> {
        let mut output = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            output.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            let end = after_open.find("}}").ok_or_else(|| {
                SheetError::TemplateRender(format!("{}: unterminated placeholder", self.name))
            })?;
            let key = after_open[..end].trim();
            let value = vars.get(key).ok_or_else(|| {
                SheetError::TemplateRender(format!("{}: unknown placeholder {key:?}", self.name))
            })?;
            output.push_str(value);
            rest = &after_open[end + 2..];
        }
        output.push_str(rest);

        Ok(output)
    }
}
