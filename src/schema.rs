use crate::ast::DocumentNode;
use crate::context::ParsingContext;
use crate::error::{ErrorList, LionError, LionErrors};
use crate::registry::{TypeOutcome, TypeRegistry};
use std::ops::ControlFlow;

/// One declared property: its type expression and whether it may be omitted.
#[derive(Debug, PartialEq, Clone)]
pub struct SchemaComponent {
    pub type_expr: String,
    pub is_optional: bool,
}

impl SchemaComponent {
    pub fn new(type_expr: impl Into<String>) -> Self {
        Self {
            type_expr: type_expr.into(),
            is_optional: false,
        }
    }

    pub fn optional(type_expr: impl Into<String>) -> Self {
        Self {
            type_expr: type_expr.into(),
            is_optional: true,
        }
    }
}

/// Ordered property declarations, plus the sub-schemas declared alongside them.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Schema {
    pub components: Vec<(String, SchemaComponent)>,
    pub sub_schemas: Vec<(String, Schema)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component, replacing any earlier declaration of the same name.
    pub fn add_component(&mut self, name: impl Into<String>, component: SchemaComponent) {
        let name = name.into();
        match self.components.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = component,
            None => self.components.push((name, component)),
        }
    }

    pub fn add_sub_schema(&mut self, name: impl Into<String>, schema: Schema) {
        let name = name.into();
        match self.sub_schemas.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = schema,
            None => self.sub_schemas.push((name, schema)),
        }
    }

    pub fn component(&self, name: &str) -> Option<&SchemaComponent> {
        self.components
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, component)| component)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of components that must be present.
    pub fn required_count(&self) -> usize {
        self.components
            .iter()
            .filter(|(_, component)| !component.is_optional)
            .count()
    }

    /// Makes the sub-schemas declared with this schema resolvable by name.
    pub fn register_into(&self, registry: &mut TypeRegistry) {
        for (name, schema) in &self.sub_schemas {
            registry.register_sub_schema(name.clone(), schema.clone());
        }
    }

    /// Validates `node` and reports every problem found in one pass.
    ///
    /// Returns `Ok(true)` if no error was recorded during this call. With
    /// `raise_on_finish`, a failed check returns the accumulated errors as
    /// `Err`. With `clear_after`, a successful check empties the accumulator.
    pub fn validate(
        &self,
        node: &DocumentNode,
        ctx: &mut ParsingContext,
        raise_on_finish: bool,
        clear_after: bool,
    ) -> Result<bool, LionErrors> {
        if self.check(node, &ctx.type_registry, &mut ctx.errors) {
            if clear_after {
                ctx.errors.clear();
            }
            return Ok(true);
        }
        if raise_on_finish {
            return Err(LionErrors::new(ctx.errors.take()));
        }
        Ok(false)
    }

    /// Runs every check against `node`, returning true if none of them
    /// recorded an error. Never clears `errors`.
    pub fn check(&self, node: &DocumentNode, registry: &TypeRegistry, errors: &mut ErrorList) -> bool {
        let before = errors.len();
        let _ = self.run_checks(node, registry, errors, before);
        errors.len() == before
    }

    fn run_checks(
        &self,
        node: &DocumentNode,
        registry: &TypeRegistry,
        errors: &mut ErrorList,
        before: usize,
    ) -> ControlFlow<()> {
        let region = node.region_or_default();

        if node.is_single_value() {
            errors.add(LionError::schema(
                "Expected an object, got a single value.",
                region,
            ))?;
        }

        let required = self.required_count();
        let size = node.len();
        if size < required || size > self.len() {
            let message = if required == self.len() {
                format!("Expected {} keys, got {size}.", self.len())
            } else {
                format!("Expected {required}-{} keys, got {size}.", self.len())
            };
            errors.add(LionError::schema(message, region))?;
        }

        for entry in node.entries() {
            if self.component(&entry.key).is_none() {
                errors.add(LionError::schema(
                    format!("Unexpected key '{}'.", entry.key),
                    entry.value.region_or_default(),
                ))?;
            }
        }

        for (key, component) in &self.components {
            let Some(value) = node.get(key) else {
                if !component.is_optional {
                    errors.add(LionError::schema(
                        format!("Expected key '{key}' to be present."),
                        region,
                    ))?;
                }
                continue;
            };

            match registry.check_type(&component.type_expr, value, errors) {
                TypeOutcome::Satisfied => {}
                TypeOutcome::Unknown => {}
                // A failed sub-schema may already have stopped on its own violation.
                TypeOutcome::Violated if errors.process_when_added && errors.len() > before => {
                    return ControlFlow::Break(());
                }
                TypeOutcome::Violated => {
                    errors.add(LionError::schema(
                        format!(
                            "Expected key '{key}' to satisfy the constraints of type '{}'.",
                            component.type_expr
                        ),
                        value.region_or_default(),
                    ))?;
                }
            }
            if errors.process_when_added && errors.len() > before {
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }
}
