// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render units emitted by the interpreter and the backend they drive.

use satzwerk_core::Result;
use serde::Serialize;

use crate::separator::SeparatorGeometry;
use crate::table::StyledTable;

/// A `label: value` text line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub label: String,
    pub value: String,
}

impl TextLine {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn text(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

/// Backend-neutral output of a render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "unit", content = "content", rename_all = "snake_case")]
pub enum RenderUnit {
    Table(StyledTable),
    Text(TextLine),
    Rule(SeparatorGeometry),
    Spacer { height: f32 },
    PageBreak,
    /// Units laid out side by side.
    Band(Vec<RenderUnit>),
    /// A grid slot whose child rendered nothing.
    Empty,
}

impl RenderUnit {
    /// Number of units in a band, 1 for anything else.
    pub fn width(&self) -> usize {
        match self {
            Self::Band(units) => units.len(),
            _ => 1,
        }
    }
}

/// A document backend: cell matrices, line primitives, text lines and
/// composition.
pub trait RenderBackend {
    fn table(&mut self, table: &StyledTable) -> Result<()>;

    fn rule(&mut self, rule: &SeparatorGeometry) -> Result<()>;

    fn text(&mut self, line: &TextLine) -> Result<()>;

    fn spacer(&mut self, height: f32) -> Result<()>;

    fn page_break(&mut self) -> Result<()>;

    /// Start a horizontal band of `slots` units.
    fn begin_band(&mut self, slots: usize) -> Result<()>;

    fn end_band(&mut self) -> Result<()>;

    /// An empty grid slot. Ignored unless the backend needs to reserve space.
    fn empty_slot(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Feed `units` to `backend` in order. Stops at the first backend error.
pub fn dispatch<B: RenderBackend + ?Sized>(units: &[RenderUnit], backend: &mut B) -> Result<()> {
    for unit in units {
        match unit {
            RenderUnit::Table(table) => backend.table(table)?,
            RenderUnit::Text(line) => backend.text(line)?,
            RenderUnit::Rule(rule) => backend.rule(rule)?,
            RenderUnit::Spacer { height } => backend.spacer(*height)?,
            RenderUnit::PageBreak => backend.page_break()?,
            RenderUnit::Band(inner) => {
                backend.begin_band(inner.len())?;
                dispatch(inner, backend)?;
                backend.end_band()?;
            }
            RenderUnit::Empty => backend.empty_slot()?,
        }
    }
    Ok(())
}
