// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render configuration.

use serde::{Deserialize, Serialize};

/// Engine-wide defaults applied when a layout block does not say otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Padding added to every measured column width (pt).
    pub cell_padding: f32,
    /// Bottom padding of header cells (pt).
    pub header_bottom_padding: f32,
    /// Line width of the optional table grid (pt).
    pub grid_line_width: f32,
    /// Colour of the optional table grid.
    pub grid_color: String,
    /// Height of the spacer inserted between repetitions (pt).
    pub spacer_height: f32,
    /// Column count of a `grid` node that does not declare one.
    pub default_grid_columns: usize,
    /// Defaults for `separator` nodes.
    pub separator: SeparatorDefaults,
    /// Separator used to join composite values that have no transform.
    pub composite_join: String,
    /// Text shown when a transform fails on a value.
    pub transform_placeholder: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cell_padding: 10.0,
            header_bottom_padding: 10.0,
            grid_line_width: 1.0,
            grid_color: "black".into(),
            spacer_height: 20.0,
            default_grid_columns: 2,
            separator: SeparatorDefaults::default(),
            composite_join: ", ".into(),
            transform_placeholder: "-".into(),
        }
    }
}

/// Geometry used by separators that omit a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparatorDefaults {
    pub length: f32,
    pub thickness: f32,
    pub margin_before: f32,
    pub margin_after: f32,
    pub color: String,
}

impl Default for SeparatorDefaults {
    fn default() -> Self {
        Self {
            length: 500.0,
            thickness: 1.0,
            margin_before: 10.0,
            margin_after: 10.0,
            color: "black".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"cell_padding": 4, "separator": {"length": 300}}"#)
                .expect("parse config");
        assert_eq!(config.cell_padding, 4.0);
        assert_eq!(config.separator.length, 300.0);
        assert_eq!(config.separator.thickness, 1.0);
        assert_eq!(config.composite_join, ", ");
    }
}
