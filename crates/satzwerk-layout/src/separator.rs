// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decorative rule with fixed geometry.

use satzwerk_core::config::SeparatorDefaults;
use satzwerk_core::layout::SeparatorBlock;
use satzwerk_core::{Result, SatzwerkError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            _ => Err(SatzwerkError::Config(format!(
                "unsupported separator direction '{raw}'"
            ))),
        }
    }
}

/// Resolved separator: a box of `width` x `height` with one stroked line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeparatorGeometry {
    pub direction: Direction,
    pub length: f32,
    pub thickness: f32,
    pub color: String,
    pub margin_before: f32,
    pub margin_after: f32,
    pub dash: Option<Vec<f32>>,
    pub width: f32,
    pub height: f32,
}

impl SeparatorGeometry {
    /// Resolve a separator block against the configured defaults.
    pub fn new(block: &SeparatorBlock, defaults: &SeparatorDefaults) -> Result<Self> {
        let direction = Direction::parse(&block.direction)?;
        let length = block.length.unwrap_or(defaults.length);
        let thickness = block.thickness.unwrap_or(defaults.thickness);
        let margin_before = block.margin_before.unwrap_or(defaults.margin_before);
        let margin_after = block.margin_after.unwrap_or(defaults.margin_after);
        let across = margin_before + thickness + margin_after;

        let (width, height) = match direction {
            Direction::Horizontal => (length, across),
            Direction::Vertical => (across, length),
        };

        Ok(Self {
            direction,
            length,
            thickness,
            color: block.color.clone().unwrap_or_else(|| defaults.color.clone()),
            margin_before,
            margin_after,
            // An empty dash pattern draws a solid line.
            dash: block.dash.clone().filter(|dash| !dash.is_empty()),
            width,
            height,
        })
    }

    /// Endpoints of the stroked line within the separator's box.
    pub fn line(&self) -> ((f32, f32), (f32, f32)) {
        match self.direction {
            Direction::Horizontal => {
                let y = self.margin_after + self.thickness / 2.0;
                ((0.0, y), (self.length, y))
            }
            Direction::Vertical => {
                let x = self.margin_before + self.thickness / 2.0;
                ((x, 0.0), (x, self.length))
            }
        }
    }
}
