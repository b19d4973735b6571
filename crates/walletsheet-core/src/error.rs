// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for walletsheet.

use thiserror::Error;

/// Top-level error type for all recovery sheet operations.
///
/// A render either produces a complete document or fails with exactly one of
/// these; partial documents are never returned.
#[derive(Debug, Error)]
pub enum SheetError {
    // -- Input --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // -- Templates --
    #[error("failed to load template: {0}")]
    TemplateLoad(String),

    #[error("failed to render template: {0}")]
    TemplateRender(String),

    // -- Drawing --
    #[error("QR encoding failed: {0}")]
    Encoding(String),

    #[error("render backend error: {0}")]
    RenderBackend(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SheetError {
    /// Whether the failure was caused by the caller's input rather than by
    /// a broken resource or backend.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Serialization(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SheetError>;
