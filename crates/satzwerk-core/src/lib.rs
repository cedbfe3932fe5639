// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Satzwerk: core types, layout model and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod layout;
pub mod types;

pub use config::RenderConfig;
pub use error::{Result, SatzwerkError};
pub use layout::{FieldMapEntry, FontStyle, LayoutNode, NodeKind, StyleConfig};
pub use types::*;
