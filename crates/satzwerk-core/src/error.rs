// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Satzwerk.
//
// Only `Config` is fatal to a render pass. Filter and transform failures are
// caught where they occur and replaced with an empty match or a placeholder.

use thiserror::Error;

/// Top-level error type for all Satzwerk operations.
#[derive(Debug, Error)]
pub enum SatzwerkError {
    // -- Layout tree --
    #[error("invalid layout configuration: {0}")]
    Config(String),

    // -- Filter DSL --
    #[error("malformed filter condition: {0}")]
    Filter(String),

    // -- Value transforms --
    #[error("transform failed: {0}")]
    Transform(String),

    // -- Serialisation --
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SatzwerkError {
    /// Whether this error must abort the whole render pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Serialization(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SatzwerkError>;
