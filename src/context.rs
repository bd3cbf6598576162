use crate::error::ErrorList;
use crate::registry::TypeRegistry;
use crate::schema::Schema;

/// Per-call state threaded through the lexer, the parsers and the validator.
///
/// Build one for every top-level call; a context is never shared between calls.
#[derive(Debug, Default, Clone)]
pub struct ParsingContext {
    pub errors: ErrorList,
    pub type_registry: TypeRegistry,
}

impl ParsingContext {
    /// Deferred policy: errors are collected and the caller decides at the end.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops parsing and validation at the first recorded error.
    pub fn fail_fast() -> Self {
        Self {
            errors: ErrorList::fail_fast(),
            type_registry: TypeRegistry::new(),
        }
    }

    /// A fresh context whose registry knows the sub-schemas declared with `schema`.
    pub fn for_schema(schema: &Schema) -> Self {
        let mut ctx = Self::new();
        schema.register_into(&mut ctx.type_registry);
        ctx
    }
}
