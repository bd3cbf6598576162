use crate::ast::{DocumentNode, LionDocument};
use crate::context::ParsingContext;
use crate::error::{LionError, LionErrors};
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;
use crate::schema::Schema;
use crate::schema_parser::SchemaParser;
use crate::serialization::{to_value, Value};
use serde::{Serialize, Serializer};

pub use crate::printer::{stringify_document, stringify_schema};

const DEFAULT_SOURCE_NAME: &str = "source.lion";

impl Serialize for LionDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl LionDocument {
    /// Converts the document data into a generic, serializable `Value`.
    /// The schema is not part of the data.
    #[must_use]
    pub fn to_value(&self) -> Value {
        to_value(&self.root)
    }

    /// Serializes the document data into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the document data into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

fn lex(text: &str, ctx: &mut ParsingContext) -> Option<Vec<Token>> {
    match Lexer::new(text).lex(&mut ctx.errors) {
        Ok(tokens) => Some(tokens),
        Err(abort) => {
            log::debug!("lexing stopped after {} tokens", abort.partial.len());
            None
        }
    }
}

/// Lexes, parses and validates `text` inside a caller-supplied context.
///
/// Errors stay in `ctx.errors`; `None` means parsing stopped early. Use this
/// with [`ParsingContext::fail_fast`] to stop at the first problem.
pub fn parse_text_in(text: &str, ctx: &mut ParsingContext) -> Option<LionDocument> {
    let tokens = lex(text, ctx)?;
    let document = Parser::new(tokens).validating(true).parse(ctx);
    log::debug!(
        "parsed document: complete={}, errors={}",
        document.is_ok(),
        ctx.errors.len()
    );
    document.ok()
}

/// Lexes and parses schema text inside a caller-supplied context.
pub fn parse_schema_in(text: &str, ctx: &mut ParsingContext) -> Option<Schema> {
    let tokens = lex(text, ctx)?;
    let schema = SchemaParser::new(tokens).parse(ctx);
    log::debug!(
        "parsed schema: complete={}, errors={}",
        schema.is_ok(),
        ctx.errors.len()
    );
    schema.ok()
}

fn finish<T>(value: Option<T>, ctx: &mut ParsingContext, text: &str, file_name: &str) -> Result<T, LionErrors> {
    ctx.errors
        .process()
        .map_err(|errors| errors.with_source(file_name, text))?;
    // A parse that stops early has always recorded why.
    value.ok_or_else(|| LionErrors::new(Vec::new()).with_source(file_name, text))
}

/// Parses a Lion document, validating it against its inline schema if it has one.
///
/// # Errors
/// Returns every lex, syntax and schema error found, if there were any.
pub fn parse_text(text: &str) -> Result<LionDocument, LionErrors> {
    parse_text_with_name(text, DEFAULT_SOURCE_NAME)
}

/// Like [`parse_text`], with `file_name` used as the source name in diagnostics.
///
/// # Errors
/// Returns every lex, syntax and schema error found, if there were any.
pub fn parse_text_with_name(text: &str, file_name: &str) -> Result<LionDocument, LionErrors> {
    let mut ctx = ParsingContext::new();
    let document = parse_text_in(text, &mut ctx);
    finish(document, &mut ctx, text, file_name)
}

pub fn parse_text_or_none(text: &str) -> Option<LionDocument> {
    parse_text(text).ok()
}

/// Collects the errors of parsing `text` instead of failing on them.
pub fn analyze_text(text: &str) -> Vec<LionError> {
    let mut ctx = ParsingContext::new();
    parse_text_in(text, &mut ctx);
    LionErrors::new(ctx.errors.take())
        .with_source(DEFAULT_SOURCE_NAME, text)
        .errors
}

/// Parses standalone schema text: `@definition { ... }` followed by any
/// number of `@subschema Name { ... }` blocks.
///
/// # Errors
/// Returns every lex and syntax error found, if there were any.
pub fn parse_schema(text: &str) -> Result<Schema, LionErrors> {
    parse_schema_with_name(text, DEFAULT_SOURCE_NAME)
}

/// # Errors
/// Returns every lex and syntax error found, if there were any.
pub fn parse_schema_with_name(text: &str, file_name: &str) -> Result<Schema, LionErrors> {
    let mut ctx = ParsingContext::new();
    let schema = parse_schema_in(text, &mut ctx);
    finish(schema, &mut ctx, text, file_name)
}

pub fn parse_schema_or_none(text: &str) -> Option<Schema> {
    parse_schema(text).ok()
}

pub fn analyze_schema(text: &str) -> Vec<LionError> {
    let mut ctx = ParsingContext::new();
    parse_schema_in(text, &mut ctx);
    LionErrors::new(ctx.errors.take())
        .with_source(DEFAULT_SOURCE_NAME, text)
        .errors
}

/// Validates any tree against a standalone schema and returns the violations.
pub fn validate_node(schema: &Schema, node: &DocumentNode) -> Vec<LionError> {
    let mut ctx = ParsingContext::for_schema(schema);
    schema.check(node, &ctx.type_registry, &mut ctx.errors);
    log::debug!("validated node: errors={}", ctx.errors.len());
    ctx.errors.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_simple_parse_to_json() {
        let source = r#"
        {
            name: "My App",
            version: 1.0,
            enabled: true,
            features: ["a", "b", "c"],
            config: {
                host: "localhost",
                port: 8080,
            }
        }
    "#;

        let expected_json = serde_json::json!({
            "name": "My App",
            "version": 1.0,
            "enabled": true,
            "features": ["a", "b", "c"],
            "config": {
                "host": "localhost",
                "port": 8080,
            }
        });

        let document = parse_text(source).unwrap();
        let result = document.to_json().unwrap();
        let result_json: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(result_json, expected_json);
    }

    #[test]
    fn test_simple_parse_to_yaml() {
        let source = r#"
        {
            name: "My App",
            version: 1.5,
            enabled: true,
        }
    "#;

        let expected_yaml = "enabled: true\nname: My App\nversion: 1.5\n";

        let document = parse_text(source).unwrap();
        assert_eq!(document.to_yaml().unwrap(), expected_yaml);
    }

    #[test]
    fn test_parse_and_analyze_agree() {
        let source = "{ a: 1.2.3 }";
        assert!(parse_text(source).is_err());
        assert!(parse_text_or_none(source).is_none());
        let errors = analyze_text(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Lex);
        assert!(errors[0].span.is_some());
    }

    #[test]
    fn test_errors_carry_source_name() {
        let err = parse_text_with_name("{ a 1 }", "app.lion").unwrap_err();
        assert_eq!(err.src.name(), "app.lion");
        assert!(!err.is_empty());
    }

    #[test]
    fn test_schema_entry_points() {
        let schema = parse_schema("@definition { a: String }").unwrap();
        assert_eq!(schema.len(), 1);
        assert!(parse_schema_or_none("@definition { a: }").is_none());
        assert_eq!(analyze_schema("@definition { a: String }"), Vec::new());
    }

    #[test]
    fn test_validate_node_uses_sub_schemas() {
        let schema = parse_schema(
            "@definition { env: Env } @subschema Env { port: Integer }",
        )
        .unwrap();
        let good = parse_text("{ env: { port: 80 } }").unwrap();
        assert!(validate_node(&schema, &good.root).is_empty());

        let bad = parse_text("{ env: { port: \"80\" } }").unwrap();
        let errors = validate_node(&schema, &bad.root);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == ErrorKind::Schema));
    }

    #[test]
    fn test_fail_fast_context() {
        let mut ctx = ParsingContext::fail_fast();
        assert!(parse_text_in("{ a: :, b: ] }", &mut ctx).is_none());
        assert_eq!(ctx.errors.len(), 1);
    }
}
