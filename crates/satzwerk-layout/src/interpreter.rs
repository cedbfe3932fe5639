// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout interpreter: walks a layout tree over data rows and emits render units.
//
// A pass runs in three phases. Group blocks among a container's direct
// children are resolved into a GroupContext, but only while the incoming
// context is still empty; once non-empty it is passed down unchanged. Nodes
// are then dispatched by type, and containers assemble their children's units
// into a flat sequence (column, positional grid) or bands (row, grid over data).

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

use satzwerk_core::layout::{GroupBlock, RepeatSeparator, TableBlock, VariableBlock};
use satzwerk_core::{
    DataRow, DataSet, FieldKey, GroupContext, GroupData, LayoutNode, NodeKind, RenderConfig,
    Result, SatzwerkError,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::filter::{self, FilterCondition};
use crate::metrics::{BuiltinMetrics, TextMeasure};
use crate::render::{RenderUnit, TextLine};
use crate::separator::SeparatorGeometry;
use crate::table::{StyledTable, TableBuilder};
use crate::transform::{self, TransformRegistry};

/// Stateless layout evaluator. Cheap to share between threads.
#[derive(Clone)]
pub struct LayoutInterpreter {
    registry: Arc<TransformRegistry>,
    metrics: Arc<dyn TextMeasure>,
    config: RenderConfig,
}

impl Default for LayoutInterpreter {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl std::fmt::Debug for LayoutInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutInterpreter")
            .field("transforms", &self.registry.names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LayoutInterpreter {
    /// Interpreter with the built-in transforms and metrics.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            registry: Arc::new(TransformRegistry::builtin()),
            metrics: Arc::new(BuiltinMetrics),
            config,
        }
    }

    pub fn with_registry(mut self, registry: TransformRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_metrics(mut self, metrics: impl TextMeasure + 'static) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// Render `node` over `rows`, starting with an empty group context.
    #[instrument(skip_all, fields(node = node.type_name(), rows = rows.len()))]
    pub fn interpret(&self, node: &LayoutNode, rows: &[DataRow]) -> Result<Vec<RenderUnit>> {
        let units = self.interpret_with_context(node, rows, &GroupContext::new())?;
        info!(units = units.len(), "layout interpreted");
        Ok(units)
    }

    /// Render `node` with an already resolved group context.
    pub fn interpret_with_context(
        &self,
        node: &LayoutNode,
        rows: &[DataRow],
        context: &GroupContext,
    ) -> Result<Vec<RenderUnit>> {
        let Some(children) = node.children() else {
            return self.render_block(node, rows, context);
        };

        // Groups resolved here are visible to this subtree only.
        let resolved;
        let context = if context.is_empty() {
            resolved = self.resolve_groups(children)?;
            &resolved
        } else {
            context
        };

        match &node.kind {
            NodeKind::Row { .. } => {
                let units = self.render_sequence(children, rows, context)?;
                Ok(if units.is_empty() {
                    Vec::new()
                } else {
                    vec![RenderUnit::Band(units)]
                })
            }
            NodeKind::Grid { columns, .. } => {
                let columns = columns.unwrap_or(self.config.default_grid_columns).max(1);
                if rows.is_empty() {
                    self.render_grid_positional(children, columns, context)
                } else {
                    rows.iter()
                        .map(|row| {
                            self.render_sequence(children, std::slice::from_ref(row), context)
                                .map(RenderUnit::Band)
                        })
                        .collect()
                }
            }
            _ => self.render_column(children, rows, context),
        }
    }

    /// Phase 1: bind the data of every `group` child.
    ///
    /// List-shaped data must carry a filter; its match set is bound, or an
    /// empty record when the filter fails or matches nothing. Record-shaped
    /// data is bound as is.
    pub fn resolve_groups(&self, children: &[LayoutNode]) -> Result<GroupContext> {
        let mut context = GroupContext::new();
        for child in children {
            if let NodeKind::Group(group) = &child.kind {
                if let Some(data) = self.resolve_group(group)? {
                    context.insert(group.group_name.clone(), data);
                }
            }
        }
        if !context.is_empty() {
            debug!(groups = ?context.keys().collect::<Vec<_>>(), "group context resolved");
        }
        Ok(context)
    }

    fn resolve_group(&self, group: &GroupBlock) -> Result<Option<GroupData>> {
        let name = group.group_name.as_str();
        match &group.data {
            Value::Array(_) => {
                let rows: DataSet = serde_json::from_value(group.data.clone()).map_err(|err| {
                    SatzwerkError::Config(format!("group '{name}' data must be records: {err}"))
                })?;
                let condition = group
                    .filter
                    .as_ref()
                    .filter(|condition| !is_blank(condition))
                    .ok_or_else(|| {
                        SatzwerkError::Config(format!(
                            "group '{name}' is a list but has no filter"
                        ))
                    })?;

                match filter::apply_filter(&GroupData::List(rows), condition) {
                    Ok(matched) if !matched.is_empty() => Ok(Some(matched)),
                    Ok(_) => {
                        warn!(group = name, filter = %condition, "no match in group");
                        Ok(Some(GroupData::empty()))
                    }
                    Err(err) => {
                        warn!(group = name, error = %err, "group filter failed");
                        Ok(Some(GroupData::empty()))
                    }
                }
            }
            Value::Object(record) => Ok(Some(GroupData::Record(record.clone()))),
            other => {
                warn!(group = name, data = %other, "unsupported group data format");
                Ok(None)
            }
        }
    }

    /// Column: children in order, each repeated with optional separators.
    fn render_column(
        &self,
        children: &[LayoutNode],
        rows: &[DataRow],
        context: &GroupContext,
    ) -> Result<Vec<RenderUnit>> {
        let mut units = Vec::new();
        for child in children.iter().filter(|child| !child.is_group()) {
            for i in 0..child.repeat {
                units.extend(self.render_node(child, rows, context)?);
                if i + 1 < child.repeat {
                    match child.repeat_separator {
                        Some(RepeatSeparator::Spacer) => units.push(RenderUnit::Spacer {
                            height: self.config.spacer_height,
                        }),
                        Some(RepeatSeparator::PageBreak) => units.push(RenderUnit::PageBreak),
                        None => {}
                    }
                }
            }
        }
        Ok(units)
    }

    /// Children rendered once each, nested container output spliced in.
    fn render_sequence(
        &self,
        children: &[LayoutNode],
        rows: &[DataRow],
        context: &GroupContext,
    ) -> Result<Vec<RenderUnit>> {
        let mut units = Vec::new();
        for child in children.iter().filter(|child| !child.is_group()) {
            units.extend(self.render_node(child, rows, context)?);
        }
        Ok(units)
    }

    /// Grid without data: one slot per child, a new band every `columns`
    /// slots. A child that renders nothing keeps its slot as `Empty`.
    fn render_grid_positional(
        &self,
        children: &[LayoutNode],
        columns: usize,
        context: &GroupContext,
    ) -> Result<Vec<RenderUnit>> {
        let mut bands = Vec::new();
        let mut band = Vec::new();
        for (slot, child) in children.iter().filter(|child| !child.is_group()).enumerate() {
            let units = self.render_node(child, &[], context)?;
            if units.is_empty() {
                band.push(RenderUnit::Empty);
            } else {
                band.extend(units);
            }
            if (slot + 1) % columns == 0 {
                bands.push(RenderUnit::Band(std::mem::take(&mut band)));
            }
        }
        if !band.is_empty() {
            bands.push(RenderUnit::Band(band));
        }
        Ok(bands)
    }

    fn render_node(
        &self,
        node: &LayoutNode,
        rows: &[DataRow],
        context: &GroupContext,
    ) -> Result<Vec<RenderUnit>> {
        if node.is_container() {
            self.interpret_with_context(node, rows, context)
        } else {
            self.render_block(node, rows, context)
        }
    }

    /// Phase 2 for leaf blocks.
    fn render_block(
        &self,
        node: &LayoutNode,
        rows: &[DataRow],
        context: &GroupContext,
    ) -> Result<Vec<RenderUnit>> {
        Ok(match &node.kind {
            NodeKind::Table(block) => vec![RenderUnit::Table(self.render_table(block, rows))],
            NodeKind::Variable(block) => {
                vec![RenderUnit::Text(self.render_variable(block, rows, context))]
            }
            NodeKind::Separator(block) => vec![RenderUnit::Rule(SeparatorGeometry::new(
                block,
                &self.config.separator,
            )?)],
            NodeKind::Group(_) => Vec::new(),
            NodeKind::Unknown { kind } => {
                warn!(node_type = %kind, "unsupported layout type, skipping");
                Vec::new()
            }
            NodeKind::Column { .. } | NodeKind::Row { .. } | NodeKind::Grid { .. } => {
                self.interpret_with_context(node, rows, context)?
            }
        })
    }

    #[instrument(skip_all, fields(columns = block.field_map.len()))]
    fn render_table(&self, block: &TableBlock, rows: &[DataRow]) -> StyledTable {
        let source = block.data.as_deref().unwrap_or(rows);
        let rows = match &block.negative_filter {
            Some(negative) => Cow::Owned(exclude_matching(source, negative)),
            None => Cow::Borrowed(source),
        };
        TableBuilder::new(&self.registry, self.metrics.as_ref(), &self.config).render(
            &block.field_map,
            &block.style,
            &rows,
        )
    }

    fn render_variable(
        &self,
        block: &VariableBlock,
        rows: &[DataRow],
        context: &GroupContext,
    ) -> TextLine {
        let source = match block.group_name.as_deref().and_then(|name| context.get(name)) {
            Some(group) => group.first_record(),
            None => rows.first(),
        };
        let empty = DataRow::new();
        let key = FieldKey::parse(&block.key);
        let value = key.lookup(source.unwrap_or(&empty));

        let transform = self
            .registry
            .resolve_optional(block.transform.as_deref(), &block.key);
        let text = transform::render_value(transform.as_ref(), &value, &block.key, &self.config);
        TextLine::new(block.label.clone(), text)
    }
}

/// Rows not matched by any of the negative conditions, in original order.
///
/// `negative` is one condition or a list of them. A malformed condition
/// excludes nothing.
pub fn exclude_matching(rows: &[DataRow], negative: &Value) -> DataSet {
    let conditions: Vec<&Value> = match negative {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };

    let mut excluded = BTreeSet::new();
    for raw in conditions {
        match FilterCondition::parse(raw) {
            Ok(condition) => excluded.extend(filter::matching_indices(rows, &condition)),
            Err(err) => warn!(condition = %raw, error = %err, "ignoring malformed negative filter"),
        }
    }

    rows.iter()
        .enumerate()
        .filter(|(idx, _)| !excluded.contains(idx))
        .map(|(_, row)| row.clone())
        .collect()
}

/// Null, empty strings and empty containers count as "no filter".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
