// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field-map header compiler.
//
// Flattens a nested field map into rectangular header rows and the ordered
// list of leaf columns. Groups take one header row and span the columns of
// their leaves; leaves span downwards to the last header row. A group with no
// leaves takes no columns and is dropped.

use satzwerk_core::{FieldKey, FieldMapEntry};
use serde::Serialize;

/// One header cell and the rectangle it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderPlacement {
    pub label: String,
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
    pub is_group: bool,
}

impl HeaderPlacement {
    pub fn last_row(&self) -> usize {
        self.row + self.row_span - 1
    }

    pub fn last_col(&self) -> usize {
        self.col + self.col_span - 1
    }
}

/// A body column, in canonical column order.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafColumn {
    pub label: String,
    pub key: FieldKey,
    pub transform: Option<String>,
}

/// Result of compiling a field map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledFieldMap {
    /// Header text, one row per level, each exactly `width()` cells wide.
    pub header_rows: Vec<Vec<String>>,
    /// Leaf columns in depth-first left-to-right order.
    pub leaves: Vec<LeafColumn>,
    /// Every header cell in placement order.
    pub placements: Vec<HeaderPlacement>,
}

impl CompiledFieldMap {
    pub fn width(&self) -> usize {
        self.leaves.len()
    }

    pub fn header_row_count(&self) -> usize {
        self.header_rows.len()
    }

    pub fn leaf_keys(&self) -> Vec<&FieldKey> {
        self.leaves.iter().map(|leaf| &leaf.key).collect()
    }
}

/// Header levels below and including `entry`. Groups without leaves do not
/// count towards their parent's depth.
pub fn depth(entry: &FieldMapEntry) -> usize {
    match entry {
        FieldMapEntry::Leaf { .. } => 1,
        FieldMapEntry::Group { children, .. } => 1 + map_depth(children),
    }
}

/// Header levels of a whole field map.
pub fn map_depth(entries: &[FieldMapEntry]) -> usize {
    entries
        .iter()
        .filter(|entry| leaf_count(entry) > 0)
        .map(depth)
        .max()
        .unwrap_or(0)
}

pub fn leaf_count(entry: &FieldMapEntry) -> usize {
    match entry {
        FieldMapEntry::Leaf { .. } => 1,
        FieldMapEntry::Group { children, .. } => children.iter().map(leaf_count).sum(),
    }
}

/// Place `entries` starting at (`row`, `col`) in a header `depth` rows tall.
///
/// Returns the next free column and the placements made.
pub fn place(
    entries: &[FieldMapEntry],
    row: usize,
    col: usize,
    depth: usize,
) -> (usize, Vec<HeaderPlacement>) {
    entries
        .iter()
        .fold((col, Vec::new()), |(col, mut placed), entry| match entry {
            FieldMapEntry::Leaf { label, .. } => {
                placed.push(HeaderPlacement {
                    label: label.clone(),
                    row,
                    col,
                    row_span: depth - row,
                    col_span: 1,
                    is_group: false,
                });
                (col + 1, placed)
            }
            FieldMapEntry::Group { label, children } => {
                let span = leaf_count(entry);
                if span == 0 {
                    return (col, placed);
                }
                placed.push(HeaderPlacement {
                    label: label.clone(),
                    row,
                    col,
                    row_span: 1,
                    col_span: span,
                    is_group: true,
                });
                let (next, inner) = place(children, row + 1, col, depth);
                placed.extend(inner);
                (next, placed)
            }
        })
}

/// Compile a field map into header rows and leaf columns.
pub fn compile(entries: &[FieldMapEntry]) -> CompiledFieldMap {
    let depth = map_depth(entries);
    let (width, placements) = place(entries, 0, 0, depth);

    let mut header_rows = vec![vec![String::new(); width]; depth];
    for p in &placements {
        header_rows[p.row][p.col] = p.label.clone();
    }

    let mut leaves = Vec::with_capacity(width);
    collect_leaves(entries, &mut leaves);

    CompiledFieldMap {
        header_rows,
        leaves,
        placements,
    }
}

fn collect_leaves(entries: &[FieldMapEntry], out: &mut Vec<LeafColumn>) {
    for entry in entries {
        match entry {
            FieldMapEntry::Leaf {
                label,
                key,
                transform,
            } => out.push(LeafColumn {
                label: label.clone(),
                key: key.clone(),
                transform: transform.clone(),
            }),
            FieldMapEntry::Group { children, .. } => collect_leaves(children, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_map() -> Vec<FieldMapEntry> {
        vec![
            FieldMapEntry::leaf("Ticker", "RIC"),
            FieldMapEntry::group(
                "Price",
                vec![
                    FieldMapEntry::leaf("Ask", "ASK"),
                    FieldMapEntry::leaf("Bid", "BID"),
                ],
            ),
        ]
    }

    #[test]
    fn two_level_header() {
        let compiled = compile(&price_map());
        assert_eq!(
            compiled.header_rows,
            vec![
                vec!["Ticker".to_string(), "Price".into(), String::new()],
                vec![String::new(), "Ask".into(), "Bid".into()],
            ]
        );
        let keys: Vec<&str> = compiled.leaf_keys().iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["RIC", "ASK", "BID"]);
    }

    #[test]
    fn leaves_span_to_last_header_row() {
        let compiled = compile(&price_map());
        let ticker = &compiled.placements[0];
        assert_eq!((ticker.row, ticker.col, ticker.row_span), (0, 0, 2));
        assert_eq!(ticker.last_row(), 1);

        let price = &compiled.placements[1];
        assert!(price.is_group);
        assert_eq!((price.col, price.last_col()), (1, 2));
    }

    #[test]
    fn header_rows_are_rectangular_for_uneven_depths() {
        let map = vec![
            FieldMapEntry::group(
                "A",
                vec![
                    FieldMapEntry::group("B", vec![FieldMapEntry::leaf("C", "c")]),
                    FieldMapEntry::leaf("D", "d"),
                ],
            ),
            FieldMapEntry::leaf("E", "e"),
            FieldMapEntry::group("F", vec![FieldMapEntry::leaf("G", "g")]),
        ];
        let compiled = compile(&map);
        assert_eq!(compiled.header_row_count(), 3);
        assert_eq!(compiled.width(), 4);
        for row in &compiled.header_rows {
            assert_eq!(row.len(), compiled.width());
        }
        let labels: Vec<&str> = compiled.leaves.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, ["C", "D", "E", "G"]);
        assert_eq!(compiled.header_rows[2], ["C", "", "", ""]);
    }

    #[test]
    fn depth_and_leaf_count() {
        let map = price_map();
        assert_eq!(depth(&map[0]), 1);
        assert_eq!(depth(&map[1]), 2);
        assert_eq!(leaf_count(&map[1]), 2);
        assert_eq!(map_depth(&map), 2);
    }

    #[test]
    fn groups_without_leaves_are_dropped() {
        let map = vec![
            FieldMapEntry::leaf("A", "a"),
            FieldMapEntry::group("Empty", vec![FieldMapEntry::group("Deeper", Vec::new())]),
        ];
        let compiled = compile(&map);
        assert_eq!(compiled.header_rows, vec![vec!["A".to_string()]]);
        assert_eq!(compiled.placements.len(), 1);
    }

    #[test]
    fn empty_field_map() {
        let compiled = compile(&[]);
        assert!(compiled.header_rows.is_empty());
        assert_eq!(compiled.width(), 0);
    }

    #[test]
    fn placement_returns_next_column() {
        let (next, placed) = place(&price_map(), 0, 5, 2);
        assert_eq!(next, 8);
        assert_eq!(placed.last().map(|p| p.col), Some(7));
    }
}
