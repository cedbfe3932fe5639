// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table builder: header and body matrices, column widths and style commands.

use satzwerk_core::{
    DataRow, FieldKey, FieldMapEntry, FieldValue, RenderConfig, StyleConfig,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::fieldmap::{self, CompiledFieldMap};
use crate::metrics::TextMeasure;
use crate::transform::{self, TransformRegistry};

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Cell {
    Text(String),
    /// Multi-line text, one entry per line.
    RichText(Vec<String>),
}

impl Cell {
    /// Text containing line breaks becomes a rich-text cell.
    pub fn from_text(text: String) -> Self {
        if text.contains('\n') {
            Self::RichText(text.split('\n').map(str::to_string).collect())
        } else {
            Self::Text(text)
        }
    }

    pub fn lines(&self) -> Vec<&str> {
        match self {
            Self::Text(text) => vec![text.as_str()],
            Self::RichText(lines) => lines.iter().map(String::as_str).collect(),
        }
    }

    pub fn plain_text(&self) -> String {
        self.lines().join("\n")
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::from_text(text.to_string())
    }
}

/// Header rows followed by body rows, all the same width.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TableMatrix {
    pub header_rows: usize,
    pub rows: Vec<Vec<Cell>>,
    pub width: usize,
}

impl TableMatrix {
    pub fn body_rows(&self) -> &[Vec<Cell>] {
        &self.rows[self.header_rows.min(self.rows.len())..]
    }
}

/// Inclusive cell rectangle, `(col, row)` corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellRange {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

impl CellRange {
    pub fn new(start: (usize, usize), end: (usize, usize)) -> Self {
        Self { start, end }
    }

    /// All columns of rows `first..=last`.
    fn rows(width: usize, first: usize, last: usize) -> Self {
        Self::new((0, first), (width - 1, last))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Backend-neutral styling instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum StyleCommand {
    Background { range: CellRange, color: String },
    TextColor { range: CellRange, color: String },
    Font { range: CellRange, name: String },
    FontSize { range: CellRange, size: f32 },
    Align { range: CellRange, alignment: Alignment },
    BottomPadding { range: CellRange, padding: f32 },
    Grid { range: CellRange, width: f32, color: String },
    Span { range: CellRange },
}

/// A table ready for a render backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledTable {
    pub cells: Vec<Vec<Cell>>,
    pub header_rows: usize,
    pub col_widths: Vec<f32>,
    pub commands: Vec<StyleCommand>,
}

impl StyledTable {
    pub fn spans(&self) -> impl Iterator<Item = &CellRange> {
        self.commands.iter().filter_map(|command| match command {
            StyleCommand::Span { range } => Some(range),
            _ => None,
        })
    }
}

/// Builds styled tables from a field map and data rows.
pub struct TableBuilder<'a> {
    registry: &'a TransformRegistry,
    metrics: &'a dyn TextMeasure,
    config: &'a RenderConfig,
}

impl<'a> TableBuilder<'a> {
    pub fn new(
        registry: &'a TransformRegistry,
        metrics: &'a dyn TextMeasure,
        config: &'a RenderConfig,
    ) -> Self {
        Self {
            registry,
            metrics,
            config,
        }
    }

    /// Build and style in one step.
    pub fn render(
        &self,
        field_map: &[FieldMapEntry],
        style: &StyleConfig,
        rows: &[DataRow],
    ) -> StyledTable {
        let compiled = fieldmap::compile(field_map);
        let matrix = self.build_compiled(&compiled, field_map, rows);
        self.style_compiled(matrix, style, &compiled)
    }

    /// Header rows plus one body row per data row.
    pub fn build(&self, field_map: &[FieldMapEntry], rows: &[DataRow]) -> TableMatrix {
        self.build_compiled(&fieldmap::compile(field_map), field_map, rows)
    }

    #[instrument(skip_all, fields(columns = compiled.width(), rows = rows.len()))]
    fn build_compiled(
        &self,
        compiled: &CompiledFieldMap,
        field_map: &[FieldMapEntry],
        rows: &[DataRow],
    ) -> TableMatrix {
        // Resolved once per column, not per cell.
        let transforms: Vec<_> = compiled
            .leaves
            .iter()
            .map(|leaf| {
                self.registry
                    .resolve_optional(leaf.transform.as_deref(), leaf.key.as_str())
            })
            .collect();

        let mut matrix_rows: Vec<Vec<Cell>> = compiled
            .header_rows
            .iter()
            .map(|row| row.iter().map(|label| Cell::from(label.as_str())).collect())
            .collect();

        for row in rows {
            let values = if mirrors_nested_shape(row, field_map) {
                let mut values = Vec::with_capacity(compiled.width());
                nested_values(row, field_map, &mut values);
                values
            } else {
                compiled.leaves.iter().map(|leaf| leaf.key.lookup(row)).collect()
            };

            let cells = values
                .iter()
                .zip(&compiled.leaves)
                .zip(&transforms)
                .map(|((value, leaf), transform)| {
                    Cell::from_text(transform::render_value(
                        transform.as_ref(),
                        value,
                        leaf.key.as_str(),
                        self.config,
                    ))
                })
                .collect();
            matrix_rows.push(cells);
        }

        debug!(header_rows = compiled.header_row_count(), "table matrix built");
        TableMatrix {
            header_rows: compiled.header_row_count(),
            rows: matrix_rows,
            width: compiled.width(),
        }
    }

    /// Column widths and style commands for a built matrix.
    pub fn style(
        &self,
        matrix: TableMatrix,
        style: &StyleConfig,
        field_map: &[FieldMapEntry],
    ) -> StyledTable {
        self.style_compiled(matrix, style, &fieldmap::compile(field_map))
    }

    fn style_compiled(
        &self,
        matrix: TableMatrix,
        style: &StyleConfig,
        compiled: &CompiledFieldMap,
    ) -> StyledTable {
        let font = style.resolved_font_name();
        let col_widths = self.column_widths(&matrix, style, &font);

        let width = matrix.width;
        let total_rows = matrix.rows.len();
        let header_rows = matrix.header_rows.min(total_rows);
        let mut commands = Vec::new();

        if width > 0 && total_rows > 0 {
            if header_rows > 0 {
                let header = CellRange::rows(width, 0, header_rows - 1);
                commands.push(StyleCommand::Background {
                    range: header,
                    color: style.header_background.clone(),
                });
                commands.push(StyleCommand::TextColor {
                    range: header,
                    color: style.header_text_color.clone(),
                });
                commands.push(StyleCommand::Font {
                    range: header,
                    name: font.clone(),
                });
                commands.push(StyleCommand::FontSize {
                    range: header,
                    size: style.font_size,
                });
            }
            let body = (header_rows < total_rows)
                .then(|| CellRange::rows(width, header_rows, total_rows - 1));
            if let Some(body) = body {
                commands.push(StyleCommand::FontSize {
                    range: body,
                    size: style.body_font_size(),
                });
            }

            let all = CellRange::rows(width, 0, total_rows - 1);
            commands.push(StyleCommand::Align {
                range: all,
                alignment: Alignment::Center,
            });
            if header_rows > 0 {
                commands.push(StyleCommand::BottomPadding {
                    range: CellRange::rows(width, 0, header_rows - 1),
                    padding: self.config.header_bottom_padding,
                });
            }
            if let Some(body) = body {
                commands.push(StyleCommand::Background {
                    range: body,
                    color: style.body_background.clone(),
                });
            }
            if style.grid {
                commands.push(StyleCommand::Grid {
                    range: all,
                    width: self.config.grid_line_width,
                    color: self.config.grid_color.clone(),
                });
            }
            if header_rows > 0 {
                commands.extend(header_spans(compiled));
            }
        }

        StyledTable {
            cells: matrix.rows,
            header_rows,
            col_widths,
            commands,
        }
    }

    /// Explicit widths win; missing trailing entries are measured.
    fn column_widths(&self, matrix: &TableMatrix, style: &StyleConfig, font: &str) -> Vec<f32> {
        let explicit = style.col_widths.as_deref().unwrap_or_default();
        (0..matrix.width)
            .map(|col| match explicit.get(col) {
                Some(width) => *width,
                None => self.measure_column(matrix, col, font, style.font_size),
            })
            .collect()
    }

    fn measure_column(&self, matrix: &TableMatrix, col: usize, font: &str, size: f32) -> f32 {
        let widest = matrix
            .rows
            .iter()
            .filter_map(|row| row.get(col))
            .flat_map(Cell::lines)
            .map(|line| self.metrics.text_width(line, font, size))
            .fold(0.0_f32, f32::max);
        widest + self.config.cell_padding
    }
}

/// Span commands for every header cell: groups across their leaves, leaves
/// down to the last header row.
pub fn header_spans(compiled: &CompiledFieldMap) -> Vec<StyleCommand> {
    compiled
        .placements
        .iter()
        .map(|p| StyleCommand::Span {
            range: CellRange::new((p.col, p.row), (p.last_col(), p.last_row())),
        })
        .collect()
}

/// Whether a row holds an object under one of the field map's group labels.
fn mirrors_nested_shape(row: &DataRow, field_map: &[FieldMapEntry]) -> bool {
    field_map.iter().any(|entry| {
        matches!(entry, FieldMapEntry::Group { .. })
            && row.get(entry.label()).is_some_and(Value::is_object)
    })
}

/// Leaf values of a nested-shape row in column order. Group labels select
/// nested objects; leaves read their key, then their label.
fn nested_values(row: &DataRow, entries: &[FieldMapEntry], out: &mut Vec<FieldValue>) {
    for entry in entries {
        match entry {
            FieldMapEntry::Group { label, children } => {
                let empty = DataRow::new();
                let nested = row.get(label).and_then(Value::as_object).unwrap_or(&empty);
                nested_values(nested, children, out);
            }
            FieldMapEntry::Leaf { label, key, .. } => out.push(leaf_value(row, key, label)),
        }
    }
}

fn leaf_value(row: &DataRow, key: &FieldKey, label: &str) -> FieldValue {
    let present = key.parts().iter().any(|part| row.contains_key(part));
    if present {
        key.lookup(row)
    } else {
        FieldValue::Single(row.get(label).cloned().unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BuiltinMetrics;
    use serde_json::json;

    fn rows(value: Value) -> Vec<DataRow> {
        serde_json::from_value(value).expect("rows")
    }

    fn text_rows(matrix: &[Vec<Cell>]) -> Vec<Vec<String>> {
        matrix
            .iter()
            .map(|row| row.iter().map(Cell::plain_text).collect())
            .collect()
    }

    fn price_map() -> Vec<FieldMapEntry> {
        vec![
            FieldMapEntry::leaf("Ticker", "RIC"),
            FieldMapEntry::group(
                "Price",
                vec![
                    FieldMapEntry::leaf_with("Ask", "ASK", "price"),
                    FieldMapEntry::leaf("Bid", "BID"),
                ],
            ),
        ]
    }

    struct Fixture {
        registry: TransformRegistry,
        config: RenderConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: TransformRegistry::builtin(),
                config: RenderConfig::default(),
            }
        }

        fn builder(&self) -> TableBuilder<'_> {
            TableBuilder::new(&self.registry, &BuiltinMetrics, &self.config)
        }
    }

    #[test]
    fn flat_table_with_transform() {
        let fx = Fixture::new();
        let map = vec![
            FieldMapEntry::leaf("Ticker", "Ticker"),
            FieldMapEntry::leaf_with("Price", "Last", "dollarize"),
        ];
        let matrix = fx
            .builder()
            .build(&map, &rows(json!([{"Ticker": "AAPL", "Last": 175.22}])));
        assert_eq!(matrix.header_rows, 1);
        assert_eq!(
            text_rows(&matrix.rows),
            vec![vec!["Ticker", "Price"], vec!["AAPL", "$175.22"]]
        );
    }

    #[test]
    fn nested_header_spans() {
        let fx = Fixture::new();
        let data = rows(json!([
            {"RIC": "AAPL", "ASK": 175.2, "BID": 175.1},
            {"RIC": "MSFT", "ASK": 410, "BID": null},
        ]));
        let table = fx.builder().render(&price_map(), &StyleConfig::default(), &data);

        assert_eq!(table.header_rows, 2);
        assert_eq!(
            text_rows(&table.cells),
            vec![
                vec!["Ticker", "Price", ""],
                vec!["", "Ask", "Bid"],
                vec!["AAPL", "$175.20", "175.1"],
                vec!["MSFT", "$410.00", ""],
            ]
        );
        let spans: Vec<_> = table.spans().copied().collect();
        assert_eq!(
            spans,
            vec![
                CellRange::new((0, 0), (0, 1)),
                CellRange::new((1, 0), (2, 0)),
                CellRange::new((1, 1), (1, 1)),
                CellRange::new((2, 1), (2, 1)),
            ]
        );
    }

    #[test]
    fn nested_shape_rows_are_flattened() {
        let fx = Fixture::new();
        let data = rows(json!([
            {"RIC": "AAPL", "Price": {"ASK": 1, "Bid": 2}},
        ]));
        let matrix = fx.builder().build(&price_map(), &data);
        assert_eq!(text_rows(matrix.body_rows()), vec![vec!["AAPL", "$1.00", "2"]]);
    }

    #[test]
    fn composite_keys_join_or_transform() {
        let fx = Fixture::new();
        let map = vec![
            FieldMapEntry::leaf("Both", "A|B"),
            FieldMapEntry::leaf_with("Lines", "A|B", "join_lines"),
        ];
        let matrix = fx.builder().build(&map, &rows(json!([{"A": 1, "B": 2}])));
        let body = matrix.body_rows();
        assert_eq!(body[0][0], Cell::Text("1, 2".into()));
        assert_eq!(body[0][1], Cell::RichText(vec!["1".into(), "2".into()]));
    }

    #[test]
    fn bad_transforms_degrade_per_cell() {
        let fx = Fixture::new();
        let map = vec![
            FieldMapEntry::leaf_with("Unknown", "v", "no_such_transform"),
            FieldMapEntry::leaf_with("Failing", "v", "price"),
        ];
        let matrix = fx.builder().build(&map, &rows(json!([{"v": "abc"}])));
        assert_eq!(text_rows(matrix.body_rows()), vec![vec!["abc", "-"]]);
    }

    #[test]
    fn style_commands_cover_header_and_body() {
        let fx = Fixture::new();
        let style = StyleConfig {
            font_style: satzwerk_core::FontStyle::Bold,
            body_font_size: Some(8.0),
            ..StyleConfig::default()
        };
        let data = rows(json!([{"RIC": "AAPL", "ASK": 1, "BID": 2}]));
        let table = fx.builder().render(&price_map(), &style, &data);

        let header = CellRange::new((0, 0), (2, 1));
        let body = CellRange::new((0, 2), (2, 2));
        assert!(table.commands.contains(&StyleCommand::Font {
            range: header,
            name: "Helvetica-Bold".into()
        }));
        assert!(table.commands.contains(&StyleCommand::FontSize { range: body, size: 8.0 }));
        assert!(table.commands.contains(&StyleCommand::Background {
            range: body,
            color: "beige".into()
        }));
        assert!(table.commands.contains(&StyleCommand::BottomPadding {
            range: header,
            padding: 10.0
        }));
        assert!(table
            .commands
            .iter()
            .any(|c| matches!(c, StyleCommand::Grid { width, .. } if *width == 1.0)));
    }

    #[test]
    fn grid_can_be_disabled() {
        let fx = Fixture::new();
        let style = StyleConfig {
            grid: false,
            ..StyleConfig::default()
        };
        let table = fx.builder().render(&price_map(), &style, &[]);
        assert!(!table.commands.iter().any(|c| matches!(c, StyleCommand::Grid { .. })));
        // Header only: no body styling.
        assert!(!table.commands.iter().any(|c| matches!(
            c,
            StyleCommand::Background { color, .. } if color == "beige"
        )));
    }

    #[test]
    fn column_widths_measure_widest_cell_plus_padding() {
        let fx = Fixture::new();
        let map = vec![FieldMapEntry::leaf("A", "a")];
        let data = rows(json!([{"a": "WWWW"}, {"a": "i"}]));
        let table = fx.builder().render(&map, &StyleConfig::default(), &data);
        let expected = BuiltinMetrics.text_width("WWWW", "Helvetica", 10.0) + 10.0;
        assert!((table.col_widths[0] - expected).abs() < 1e-4);
    }

    #[test]
    fn explicit_widths_win_with_measured_fallback() {
        let fx = Fixture::new();
        let style = StyleConfig {
            col_widths: Some(vec![50.0]),
            ..StyleConfig::default()
        };
        let table = fx.builder().render(&price_map(), &style, &[]);
        assert_eq!(table.col_widths.len(), 3);
        assert_eq!(table.col_widths[0], 50.0);
        assert!(table.col_widths[1] > 10.0);
    }

    #[test]
    fn rich_text_measures_widest_line() {
        let fx = Fixture::new();
        let map = vec![FieldMapEntry::leaf_with("X", "a|b", "join_lines")];
        let data = rows(json!([{"a": "WW", "b": "i"}]));
        let table = fx.builder().render(&map, &StyleConfig::default(), &data);
        let expected = BuiltinMetrics.text_width("WW", "Helvetica", 10.0) + 10.0;
        assert!((table.col_widths[0] - expected).abs() < 1e-4);
    }
}
