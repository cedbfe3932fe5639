// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout tree, field map and table style configuration.
//
// Layout nodes deserialise from the declarative JSON form:
//
//   {"type": "column", "children": [
//       {"type": "group", "group_name": "quote", "data": [...], "filter": {"RIC": "GOOGL.O"}},
//       {"type": "variable", "label": "Last", "key": "Last", "group_name": "quote"},
//       {"type": "table", "field_map": [...], "style": {...}}
//   ]}
//
// A node without `type` is a column. Unrecognised types deserialise to
// `NodeKind::Unknown` so the interpreter can skip them with a warning instead
// of rejecting the whole document.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::{DataSet, FieldKey};

/// One node of the layout tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct LayoutNode {
    pub kind: NodeKind,
    /// How many times a column renders this node (default 1).
    pub repeat: u32,
    /// What a column inserts between repetitions.
    pub repeat_separator: Option<RepeatSeparator>,
}

/// Node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Column { children: Vec<LayoutNode> },
    Row { children: Vec<LayoutNode> },
    Grid { columns: Option<usize>, children: Vec<LayoutNode> },
    Table(TableBlock),
    Variable(VariableBlock),
    Separator(SeparatorBlock),
    Group(GroupBlock),
    /// A `type` this engine does not know.
    Unknown { kind: String },
}

/// Separator inserted between repetitions of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatSeparator {
    Spacer,
    #[serde(alias = "page_break")]
    PageBreak,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableBlock {
    #[serde(default)]
    pub field_map: Vec<FieldMapEntry>,
    #[serde(default)]
    pub style: StyleConfig,
    /// Block-local data; replaces the ambient rows when present.
    #[serde(default)]
    pub data: Option<DataSet>,
    /// A single condition or a list of conditions whose matches are removed.
    #[serde(default)]
    pub negative_filter: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableBlock {
    #[serde(default)]
    pub label: String,
    pub key: String,
    #[serde(default)]
    pub transform: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeparatorBlock {
    #[serde(default)]
    pub length: Option<f32>,
    #[serde(default)]
    pub thickness: Option<f32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default)]
    pub margin_before: Option<f32>,
    #[serde(default)]
    pub margin_after: Option<f32>,
    #[serde(default)]
    pub dash: Option<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupBlock {
    pub group_name: String,
    /// Raw bound data: a list (requires `filter`) or a single record.
    #[serde(default = "empty_object")]
    pub data: Value,
    #[serde(default)]
    pub filter: Option<Value>,
}

fn default_direction() -> String {
    "horizontal".into()
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Tagged form used once the `type` is known to be supported.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TaggedKind {
    Column(ContainerRepr),
    Row(ContainerRepr),
    Grid(GridRepr),
    Table(TableBlock),
    Variable(VariableBlock),
    Separator(SeparatorBlock),
    Group(GroupBlock),
}

#[derive(Deserialize)]
struct ContainerRepr {
    #[serde(default)]
    children: Vec<LayoutNode>,
}

#[derive(Deserialize)]
struct GridRepr {
    #[serde(default)]
    columns: Option<usize>,
    #[serde(default)]
    children: Vec<LayoutNode>,
}

const KNOWN_KINDS: &[&str] = &[
    "column",
    "row",
    "grid",
    "table",
    "variable",
    "separator",
    "group",
];

impl TryFrom<Value> for LayoutNode {
    type Error = serde_json::Error;

    fn try_from(mut value: Value) -> std::result::Result<Self, Self::Error> {
        let (repeat, repeat_separator, type_name) = {
            let object = value
                .as_object_mut()
                .ok_or_else(|| serde_json::Error::custom("layout node must be an object"))?;

            let repeat = match object.remove("repeat") {
                Some(Value::Null) | None => 1,
                Some(v) => serde_json::from_value(v)?,
            };
            let repeat_separator = match object.remove("repeat_separator") {
                Some(Value::Null) | None => None,
                Some(v) => Some(serde_json::from_value(v)?),
            };
            let type_name = match object
                .entry("type")
                .or_insert_with(|| Value::String("column".into()))
            {
                Value::String(s) => s.clone(),
                other => {
                    return Err(serde_json::Error::custom(format!(
                        "layout node type must be a string, found {other}"
                    )));
                }
            };
            (repeat, repeat_separator, type_name)
        };

        let kind = if KNOWN_KINDS.contains(&type_name.as_str()) {
            match serde_json::from_value::<TaggedKind>(value)? {
                TaggedKind::Column(c) => NodeKind::Column { children: c.children },
                TaggedKind::Row(c) => NodeKind::Row { children: c.children },
                TaggedKind::Grid(g) => NodeKind::Grid {
                    columns: g.columns,
                    children: g.children,
                },
                TaggedKind::Table(t) => NodeKind::Table(t),
                TaggedKind::Variable(v) => NodeKind::Variable(v),
                TaggedKind::Separator(s) => NodeKind::Separator(s),
                TaggedKind::Group(g) => NodeKind::Group(g),
            }
        } else {
            NodeKind::Unknown { kind: type_name }
        };

        Ok(Self {
            kind,
            repeat,
            repeat_separator,
        })
    }
}

impl LayoutNode {
    /// Wrap a kind with default repetition.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            repeat: 1,
            repeat_separator: None,
        }
    }

    /// Build a node from an in-memory JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(Self::try_from(value)?)
    }

    /// Children of container nodes; `None` for blocks.
    pub fn children(&self) -> Option<&[LayoutNode]> {
        match &self.kind {
            NodeKind::Column { children }
            | NodeKind::Row { children }
            | NodeKind::Grid { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.children().is_some()
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    /// The `type` string this node was declared with.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            NodeKind::Column { .. } => "column",
            NodeKind::Row { .. } => "row",
            NodeKind::Grid { .. } => "grid",
            NodeKind::Table(_) => "table",
            NodeKind::Variable(_) => "variable",
            NodeKind::Separator(_) => "separator",
            NodeKind::Group(_) => "group",
            NodeKind::Unknown { kind } => kind,
        }
    }
}

// -- Field map ----------------------------------------------------------------

/// One entry of a table field map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawFieldEntry")]
pub enum FieldMapEntry {
    /// A header spanning its children's columns.
    Group {
        label: String,
        children: Vec<FieldMapEntry>,
    },
    /// A body column.
    Leaf {
        label: String,
        key: FieldKey,
        transform: Option<String>,
    },
}

#[derive(Deserialize)]
struct RawFieldEntry {
    #[serde(default)]
    label: String,
    #[serde(default)]
    group: bool,
    #[serde(default)]
    children: Vec<FieldMapEntry>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    transform: Option<String>,
}

impl TryFrom<RawFieldEntry> for FieldMapEntry {
    type Error = String;

    fn try_from(raw: RawFieldEntry) -> std::result::Result<Self, Self::Error> {
        if raw.group {
            return Ok(Self::Group {
                label: raw.label,
                children: raw.children,
            });
        }
        match raw.key {
            Some(key) => Ok(Self::Leaf {
                label: raw.label,
                key: FieldKey::parse(&key),
                transform: raw.transform,
            }),
            None if !raw.children.is_empty() => Ok(Self::Group {
                label: raw.label,
                children: raw.children,
            }),
            None => Err(format!(
                "field map entry '{}' has neither a key nor children",
                raw.label
            )),
        }
    }
}

impl FieldMapEntry {
    pub fn leaf(label: impl Into<String>, key: &str) -> Self {
        Self::Leaf {
            label: label.into(),
            key: FieldKey::parse(key),
            transform: None,
        }
    }

    pub fn leaf_with(label: impl Into<String>, key: &str, transform: impl Into<String>) -> Self {
        Self::Leaf {
            label: label.into(),
            key: FieldKey::parse(key),
            transform: Some(transform.into()),
        }
    }

    pub fn group(label: impl Into<String>, children: Vec<FieldMapEntry>) -> Self {
        Self::Group {
            label: label.into(),
            children,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Group { label, .. } | Self::Leaf { label, .. } => label,
        }
    }
}

// -- Table style --------------------------------------------------------------

/// Font style applied to header rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    #[serde(alias = "", alias = "regular")]
    Normal,
    Bold,
    Italic,
    #[serde(alias = "bold_italic", alias = "bolditalic")]
    BoldItalic,
}

/// Per-table style configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub font_name: String,
    /// Header font size; also the size used to measure column widths.
    pub font_size: f32,
    /// Body font size; falls back to `font_size`.
    pub body_font_size: Option<f32>,
    pub font_style: FontStyle,
    /// Explicit column widths (pt), overriding measurement.
    pub col_widths: Option<Vec<f32>>,
    pub header_background: String,
    pub header_text_color: String,
    pub body_background: String,
    /// Draw a full grid around every cell.
    pub grid: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_name: "Helvetica".into(),
            font_size: 10.0,
            body_font_size: None,
            font_style: FontStyle::Normal,
            col_widths: None,
            header_background: "grey".into(),
            header_text_color: "whitesmoke".into(),
            body_background: "beige".into(),
            grid: true,
        }
    }
}

impl StyleConfig {
    pub fn body_font_size(&self) -> f32 {
        self.body_font_size.unwrap_or(self.font_size)
    }

    /// Standard PDF font name for the configured family and style.
    ///
    /// Families outside the base-14 set are returned unchanged.
    pub fn resolved_font_name(&self) -> String {
        let family = self.font_name.to_ascii_lowercase();
        let resolved = match (family.as_str(), self.font_style) {
            ("helvetica", FontStyle::Normal) => "Helvetica",
            ("helvetica", FontStyle::Bold) => "Helvetica-Bold",
            ("helvetica", FontStyle::Italic) => "Helvetica-Oblique",
            ("helvetica", FontStyle::BoldItalic) => "Helvetica-BoldOblique",
            ("times-roman", FontStyle::Normal) => "Times-Roman",
            ("times-roman", FontStyle::Bold) => "Times-Bold",
            ("times-roman", FontStyle::Italic) => "Times-Italic",
            ("times-roman", FontStyle::BoldItalic) => "Times-BoldItalic",
            ("courier", FontStyle::Normal) => "Courier",
            ("courier", FontStyle::Bold) => "Courier-Bold",
            ("courier", FontStyle::Italic) => "Courier-Oblique",
            ("courier", FontStyle::BoldItalic) => "Courier-BoldOblique",
            _ => return self.font_name.clone(),
        };
        resolved.to_string()
    }
}
