// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transform registry: resolves a transform name or an ad hoc expression to a
// function from a field value to display text.

pub mod builtin;
pub mod expr;

use std::collections::HashMap;
use std::sync::Arc;

use satzwerk_core::{FieldValue, RenderConfig, Result, SatzwerkError};
use tracing::{debug, warn};

use expr::Scalar;

/// Signature shared by built-in, registered and compiled transforms.
pub type TransformFn = dyn Fn(&FieldValue) -> Result<String> + Send + Sync;

/// A named value formatter.
#[derive(Clone)]
pub struct Transform {
    name: String,
    func: Arc<TransformFn>,
}

impl Transform {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&FieldValue) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, value: &FieldValue) -> Result<String> {
        (self.func)(value)
    }
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform").field("name", &self.name).finish()
    }
}

/// Immutable name -> transform mapping, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct TransformRegistry {
    transforms: HashMap<String, Transform>,
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TransformRegistry {
    /// Registry holding only the built-in transforms.
    pub fn builtin() -> Self {
        Self::builder().with_builtins().build()
    }

    /// Empty builder. Call [`TransformRegistryBuilder::with_builtins`] to
    /// start from the built-in set.
    pub fn builder() -> TransformRegistryBuilder {
        TransformRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Transform> {
        self.transforms.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up a registered transform, or compile `name` as an expression.
    pub fn resolve(&self, name: &str) -> Result<Transform> {
        if let Some(found) = self.get(name) {
            return Ok(found.clone());
        }

        let compiled = expr::compile(name)?;
        debug!(
            expression = compiled.source(),
            param = compiled.param(),
            "compiled ad hoc transform"
        );
        Ok(Transform::new(name, move |value: &FieldValue| {
            compiled
                .render(&scalar_of(value))
                .map_err(SatzwerkError::from)
        }))
    }

    /// Resolve an optional transform for one column or variable. A name that
    /// fails to resolve is logged and yields `None`, so the caller falls back
    /// to plain display.
    pub fn resolve_optional(&self, name: Option<&str>, key: &str) -> Option<Transform> {
        let name = name?;
        match self.resolve(name) {
            Ok(transform) => Some(transform),
            Err(err) => {
                warn!(key, transform = name, error = %err, "invalid transform, showing raw value");
                None
            }
        }
    }
}

/// Builder for [`TransformRegistry`].
#[derive(Default)]
pub struct TransformRegistryBuilder {
    transforms: HashMap<String, Transform>,
}

impl TransformRegistryBuilder {
    pub fn with_builtins(mut self) -> Self {
        for (name, func) in builtin::BUILTINS {
            self.transforms
                .insert((*name).to_string(), Transform::new(*name, *func));
        }
        self
    }

    /// Add or replace a named transform.
    pub fn register<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&FieldValue) -> Result<String> + Send + Sync + 'static,
    {
        let name = name.into();
        self.transforms
            .insert(name.clone(), Transform::new(name, func));
        self
    }

    pub fn build(self) -> TransformRegistry {
        TransformRegistry {
            transforms: self.transforms,
        }
    }
}

/// Display text for a looked-up value.
///
/// Without a transform, single values show as-is and composite values are
/// joined with the configured separator. A failing transform is logged and
/// replaced by the configured placeholder.
pub fn render_value(
    transform: Option<&Transform>,
    value: &FieldValue,
    key: &str,
    config: &RenderConfig,
) -> String {
    let Some(transform) = transform else {
        return value.display(&config.composite_join);
    };
    match transform.apply(value) {
        Ok(text) => text,
        Err(err) => {
            warn!(key, transform = transform.name(), error = %err, "transform failed");
            config.transform_placeholder.clone()
        }
    }
}

/// Expression input for a field value: composite values become a list.
fn scalar_of(value: &FieldValue) -> Scalar {
    match value {
        FieldValue::Single(v) => Scalar::from(v),
        FieldValue::Composite(values) => Scalar::List(values.iter().map(Scalar::from).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn one(v: Value) -> FieldValue {
        FieldValue::Single(v)
    }

    #[test]
    fn builtins_are_registered() {
        let registry = TransformRegistry::builtin();
        assert_eq!(
            registry.names(),
            [
                "abbreviate",
                "dash_if_none",
                "dollarize",
                "format_time_dd",
                "join_lines",
                "join_pipes",
                "price",
                "volume_millions",
            ]
        );
        let price = registry.resolve("price").unwrap();
        assert_eq!(price.apply(&one(json!(1.5))).unwrap(), "$1.50");
    }

    #[test]
    fn custom_transforms_override_builtins() {
        let registry = TransformRegistry::builder()
            .with_builtins()
            .register("price", |_: &FieldValue| Ok("n/a".to_string()))
            .build();
        assert_eq!(
            registry.resolve("price").unwrap().apply(&one(json!(1))).unwrap(),
            "n/a"
        );
    }

    #[test]
    fn unknown_names_compile_as_expressions() {
        let registry = TransformRegistry::builtin();
        let pct = registry.resolve("lambda v: format(v, '.1%')").unwrap();
        assert_eq!(pct.apply(&one(json!(0.25))).unwrap(), "25.0%");

        let sum = registry.resolve("x[0] + x[1]").unwrap();
        let composite = FieldValue::Composite(vec![json!(1), json!(2)]);
        assert_eq!(sum.apply(&composite).unwrap(), "3");
    }

    #[test]
    fn unresolvable_transform_falls_back_to_plain_display() {
        let registry = TransformRegistry::builtin();
        assert!(registry.resolve("no_such_transform").is_err());
        assert!(registry.resolve_optional(Some("no_such_transform"), "Price").is_none());
        assert!(registry.resolve_optional(None, "Price").is_none());

        let config = RenderConfig::default();
        let composite = FieldValue::Composite(vec![json!(1), json!(2)]);
        assert_eq!(render_value(None, &composite, "A|B", &config), "1, 2");
    }

    #[test]
    fn failing_transform_yields_placeholder() {
        let registry = TransformRegistry::builtin();
        let config = RenderConfig::default();
        let price = registry.resolve("price").unwrap();
        assert_eq!(
            render_value(Some(&price), &one(json!("oops")), "Price", &config),
            "-"
        );
        let div = registry.resolve("1 / x").unwrap();
        assert_eq!(render_value(Some(&div), &one(json!(0)), "Q", &config), "-");
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransformRegistry>();
    }
}
