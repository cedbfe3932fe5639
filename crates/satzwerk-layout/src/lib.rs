// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// satzwerk-layout: layout interpretation for Satzwerk.
//
// Provides the filter DSL, the transform registry and its sandboxed expression
// language, the field-map header compiler, the table builder and the layout
// interpreter that turns a layout tree plus data rows into render units.

pub mod fieldmap;
pub mod filter;
pub mod interpreter;
pub mod metrics;
pub mod render;
pub mod separator;
pub mod table;
pub mod transform;

// Re-export the primary types so callers can use `satzwerk_layout::LayoutInterpreter` etc.
pub use fieldmap::{CompiledFieldMap, HeaderPlacement};
pub use filter::{FilterCondition, apply_filter};
pub use interpreter::LayoutInterpreter;
pub use metrics::{BuiltinMetrics, TextMeasure};
pub use render::{RenderBackend, RenderUnit, TextLine, dispatch};
pub use separator::SeparatorGeometry;
pub use table::{Cell, StyleCommand, StyledTable, TableBuilder, TableMatrix};
pub use transform::{Transform, TransformRegistry};
