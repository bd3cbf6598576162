use crate::ast::{DocumentNode, Primitive};
use crate::error::{ErrorList, LionError};
use crate::schema::Schema;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A type predicate. The second argument is the check for the type parameter,
/// present when the type was written as `Name<Inner>`.
pub type TypeCheckFn =
    dyn Fn(&DocumentNode, Option<&mut dyn FnMut(&DocumentNode) -> bool>) -> bool + Send + Sync;

#[derive(Clone)]
pub enum TypeCheck {
    Predicate(Arc<TypeCheckFn>),
    /// Validates against the sub-schema registered under the same name.
    SubSchema,
}

/// Result of checking a node against a type expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOutcome {
    Satisfied,
    Violated,
    /// The expression names a type that is not registered. Already reported.
    Unknown,
}

/// Splits `Name<Inner>` into `("Name", Some("Inner"))` and `Name` into `("Name", None)`.
/// Only the outermost parameter is split off; nesting resolves by calling this again
/// on the inner expression.
pub fn extract_type(expr: &str) -> (&str, Option<&str>) {
    let expr = expr.trim();
    match expr.find('<') {
        Some(open) if expr.ends_with('>') && open > 0 => {
            (&expr[..open], Some(&expr[open + 1..expr.len() - 1]))
        }
        _ => (expr, None),
    }
}

/// Catalog of the types a schema can refer to, scoped to one parsing session.
#[derive(Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeCheck>,
    sub_schemas: Vec<(String, Schema)>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.types.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry")
            .field("types", &names)
            .field("sub_schemas", &self.sub_schemas)
            .finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// A registry holding only the built-in types.
    pub fn new() -> Self {
        let mut registry = Self {
            types: HashMap::new(),
            sub_schemas: Vec::new(),
        };
        registry.load_built_in_types();
        registry
    }

    fn load_built_in_types(&mut self) {
        self.register_type("String", |node, _| {
            matches!(node.value(), Some(Primitive::String(_)))
        });
        self.register_type("Number", |node, _| {
            node.value().is_some_and(Primitive::is_number)
        });
        self.register_type("Integer", |node, _| {
            node.value()
                .is_some_and(|value| value.is_number() && value.is_integral())
        });
        self.register_type("Float", |node, _| {
            node.value()
                .is_some_and(|value| value.is_number() && !value.is_integral())
        });
        self.register_type("Boolean", |node, _| {
            matches!(node.value(), Some(Primitive::Boolean(_)))
        });
        self.register_type("Array", |node, of| {
            node.is_array()
                && match of {
                    Some(of) => node.values().all(|element| of(element)),
                    None => true,
                }
        });
        self.register_type("Any", |_, _| true);
    }

    pub fn register_type<F>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn(&DocumentNode, Option<&mut dyn FnMut(&DocumentNode) -> bool>) -> bool
            + Send
            + Sync
            + 'static,
    {
        self.types
            .insert(name.into(), TypeCheck::Predicate(Arc::new(check)));
    }

    /// Registers a schema both as a named type and as a named sub-schema.
    pub fn register_sub_schema(&mut self, name: impl Into<String>, schema: Schema) {
        let name = name.into();
        log::trace!("registering sub-schema '{name}'");
        self.types.insert(name.clone(), TypeCheck::SubSchema);
        match self.sub_schemas.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = schema,
            None => self.sub_schemas.push((name, schema)),
        }
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn sub_schema(&self, name: &str) -> Option<&Schema> {
        self.sub_schemas
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, schema)| schema)
    }

    /// Sub-schemas in registration order.
    pub fn sub_schemas(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.sub_schemas
            .iter()
            .map(|(name, schema)| (name.as_str(), schema))
    }

    /// The first name in `expr`, outermost first, that is not registered.
    fn first_unknown<'e>(&self, expr: &'e str) -> Option<&'e str> {
        let mut current = Some(expr);
        while let Some(expr) = current {
            let (name, inner) = extract_type(expr);
            if !self.has_type(name) {
                return Some(name);
            }
            current = inner;
        }
        None
    }

    /// Checks `node` against a type expression such as `Integer` or
    /// `Array<Array<Integer>>`, recording an error if a type does not exist.
    pub fn validate_type(&self, expr: &str, node: &DocumentNode, errors: &mut ErrorList) -> bool {
        self.check_type(expr, node, errors) == TypeOutcome::Satisfied
    }

    pub fn check_type(&self, expr: &str, node: &DocumentNode, errors: &mut ErrorList) -> TypeOutcome {
        if let Some(unknown) = self.first_unknown(expr) {
            let _ = errors.add(LionError::schema(
                format!("Type '{unknown}' does not exist."),
                node.region_or_default(),
            ));
            return TypeOutcome::Unknown;
        }

        let (name, inner) = extract_type(expr);
        let satisfied = match self.types.get(name) {
            Some(TypeCheck::Predicate(check)) => match inner {
                Some(inner) => {
                    let mut check_element = |element: &DocumentNode| {
                        self.check_type(inner, element, errors) == TypeOutcome::Satisfied
                    };
                    let of: &mut dyn FnMut(&DocumentNode) -> bool = &mut check_element;
                    check(node, Some(of))
                }
                None => check(node, None),
            },
            Some(TypeCheck::SubSchema) => match self.sub_schema(name) {
                Some(schema) => !node.is_single_value() && schema.check(node, self, errors),
                None => false,
            },
            None => false,
        };

        if satisfied {
            TypeOutcome::Satisfied
        } else {
            TypeOutcome::Violated
        }
    }
}
