use crate::ast::{DocumentNode, LionDocument, Primitive};
use crate::context::ParsingContext;
use crate::error::LionError;
use crate::lexer::{Token, TokenType};
use crate::schema::Schema;
use crate::schema_parser::SchemaParser;

/// Why a parse stopped before reaching the end of its grammar rule.
/// The corresponding error has always been recorded already.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The token stream ran out in the middle of a construct.
    EndOfInput,
    /// An error was recorded under the fail-fast policy.
    FailFast,
    /// Objects, arrays or type parameters were nested past [`MAX_DEPTH`].
    NestingLimit,
}

/// How deep objects, arrays and type parameters may nest.
pub(crate) const MAX_DEPTH: usize = 128;

pub type Step<T> = Result<T, Halt>;

/// Token stream with one-token lookahead, shared by the document and schema parsers.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Cursor {
    pub(crate) fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|t| t.ttype == TokenType::Eof) {
            let region = tokens.last().map(|t| t.region).unwrap_or_default();
            tokens.push(Token::new(TokenType::Eof, region));
        }
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn last_index(&self) -> usize {
        self.tokens.len() - 1
    }

    /// Moves one token forward, never past the trailing `Eof`.
    pub(crate) fn advance(&mut self) {
        if self.position < self.last_index() {
            self.position += 1;
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.current().ttype == TokenType::Eof
    }

    pub(crate) fn check(&self, ttype: &TokenType) -> bool {
        self.current().ttype.same_kind(ttype)
    }

    pub(crate) fn check_modifier(&self, name: &str) -> bool {
        matches!(&self.current().ttype, TokenType::Modifier(m) if m == name)
    }

    pub(crate) fn match_token(&mut self, ttype: &TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Commas only separate items, so any run of them is skipped.
    pub(crate) fn skip_commas(&mut self) {
        while self.match_token(&TokenType::Comma) {}
    }

    /// Index of the next modifier named `name`, starting at the current token.
    fn find_modifier(&self, name: &str) -> Option<usize> {
        self.tokens[self.position..]
            .iter()
            .position(|t| matches!(&t.ttype, TokenType::Modifier(m) if m == name))
            .map(|offset| self.position + offset)
    }

    pub(crate) fn record(&self, ctx: &mut ParsingContext, error: LionError) -> Step<()> {
        if ctx.errors.add(error).is_break() {
            Err(Halt::FailFast)
        } else {
            Ok(())
        }
    }

    /// Records the fatal end-of-input error.
    pub(crate) fn end_of_input(&self, ctx: &mut ParsingContext, message: String) -> Halt {
        let _ = ctx.errors.add(
            LionError::syntax(message, self.current().region)
                .with_description("The input ended before the surrounding block was closed."),
        );
        Halt::EndOfInput
    }

    pub(crate) fn unexpected_end(&self, ctx: &mut ParsingContext, expected: &str) -> Halt {
        self.end_of_input(ctx, format!("Expected token type to be {expected} (got EOF)"))
    }

    /// Opens one nesting level. Past [`MAX_DEPTH`] the error is recorded and
    /// parsing stops, whatever the error policy.
    pub(crate) fn enter(&mut self, ctx: &mut ParsingContext) -> Step<()> {
        if self.depth >= MAX_DEPTH {
            let _ = ctx.errors.add(LionError::syntax(
                format!("Nesting is deeper than {MAX_DEPTH} levels"),
                self.current().region,
            ));
            return Err(Halt::NestingLimit);
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Consumes the current token and returns it if it has the expected kind.
    /// On a mismatch the error is recorded and the token is skipped anyway,
    /// so that parsing can resynchronize.
    pub(crate) fn expect(&mut self, ctx: &mut ParsingContext, expected: TokenType) -> Step<Option<Token>> {
        let token = self.current().clone();
        if token.ttype.same_kind(&expected) {
            self.advance();
            return Ok(Some(token));
        }
        if token.ttype == TokenType::Eof {
            return Err(self.unexpected_end(ctx, expected.name()));
        }
        self.record(
            ctx,
            LionError::syntax(
                format!(
                    "Expected token type to be {} (got {})",
                    expected.name(),
                    token.ttype.name()
                ),
                token.region,
            ),
        )?;
        self.advance();
        Ok(None)
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &mut ParsingContext) -> Step<Option<String>> {
        let token = self.expect(ctx, TokenType::Identifier(String::new()))?;
        Ok(token.and_then(|t| match t.ttype {
            TokenType::Identifier(name) => Some(name),
            _ => None,
        }))
    }

    /// Like [`Cursor::expect`], but also requires the modifier to be `name`.
    pub(crate) fn expect_modifier(&mut self, ctx: &mut ParsingContext, name: &str) -> Step<bool> {
        let token = self.current().clone();
        match &token.ttype {
            TokenType::Modifier(found) if found == name => {
                self.advance();
                Ok(true)
            }
            TokenType::Modifier(found) => {
                self.record(
                    ctx,
                    LionError::syntax(
                        format!("Expected value to be {name} (got {found})"),
                        token.region,
                    ),
                )?;
                self.advance();
                Ok(false)
            }
            TokenType::Eof => Err(self.unexpected_end(ctx, "MODIFIER")),
            other => {
                self.record(
                    ctx,
                    LionError::syntax(
                        format!("Expected token type to be MODIFIER (got {})", other.name()),
                        token.region,
                    ),
                )?;
                self.advance();
                Ok(false)
            }
        }
    }
}

/// A recursive descent parser for Lion documents.
///
///    Document ::= [ "@schema" "{" SchemaBody "}" ] [ "@doc" ] Object
#[derive(Debug, Clone)]
pub struct Parser {
    cursor: Cursor,
    validate: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            cursor: Cursor::new(tokens),
            validate: false,
        }
    }

    /// Validate the root against the inline schema right after parsing.
    #[must_use]
    pub fn validating(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn parse(&mut self, ctx: &mut ParsingContext) -> Step<LionDocument> {
        let schema = if self.cursor.check_modifier("@schema") {
            self.parse_embedded_schema(ctx)?
        } else {
            None
        };

        if self.cursor.check_modifier("@doc") {
            self.cursor.advance();
        }

        let root = self.parse_doc(ctx)?;

        if !self.cursor.at_end() {
            let token = self.cursor.current().clone();
            self.cursor.record(
                ctx,
                LionError::syntax(
                    format!("Unexpected trailing content (got {})", token.ttype.name()),
                    token.region,
                )
                .with_description("A document holds a single root object."),
            )?;
        }

        let mut document = LionDocument::new(root);
        if let Some(schema) = schema {
            if self.validate {
                schema.check(&document.root, &ctx.type_registry, &mut ctx.errors);
            }
            document = document.with_schema(schema);
        }
        Ok(document)
    }

    /// Hands the tokens between `@schema` and the next `@doc` to the schema parser.
    /// An incomplete schema block is reported but does not stop the document.
    fn parse_embedded_schema(&mut self, ctx: &mut ParsingContext) -> Step<Option<Schema>> {
        self.cursor.advance(); // Consume `@schema`
        let braced = self.cursor.match_token(&TokenType::LBrace);
        let end = self
            .cursor
            .find_modifier("@doc")
            .unwrap_or(self.cursor.last_index());
        let end_region = self.cursor.tokens[end].region;

        let mut block = self.cursor.tokens[self.cursor.position..end].to_vec();
        while block.last().is_some_and(|t| t.ttype == TokenType::Comma) {
            block.pop();
        }
        if braced {
            let depth: isize = block
                .iter()
                .map(|t| match t.ttype {
                    TokenType::LBrace => 1,
                    TokenType::RBrace => -1,
                    _ => 0,
                })
                .sum();
            if depth < 0 && block.last().is_some_and(|t| t.ttype == TokenType::RBrace) {
                block.pop();
            } else {
                self.cursor.record(
                    ctx,
                    LionError::syntax("Expected '}' to close the @schema block", end_region),
                )?;
            }
        }
        block.push(Token::new(TokenType::Eof, end_region));
        self.cursor.position = end;

        match SchemaParser::new(block).parse(ctx) {
            Ok(schema) => Ok(Some(schema)),
            Err(Halt::EndOfInput) => Ok(None),
            Err(halt) => Err(halt),
        }
    }

    /// Object ::= "{" { Pair [ "," ] } "}"
    fn parse_doc(&mut self, ctx: &mut ParsingContext) -> Step<DocumentNode> {
        let open = self.cursor.current().region;
        self.cursor.enter(ctx)?;
        self.cursor.expect(ctx, TokenType::LBrace)?;
        let mut node = DocumentNode::object();
        loop {
            self.cursor.skip_commas();
            if self.cursor.check(&TokenType::RBrace) {
                break;
            }
            if let Some((key, value)) = self.parse_pair(ctx)? {
                node.set(key, value);
            }
        }
        let close = self.cursor.current().region;
        self.cursor.advance(); // Consume the closing brace
        self.cursor.leave();
        Ok(node.with_region(open.combine(&close)))
    }

    /// Pair ::= Identifier ":" Value
    fn parse_pair(&mut self, ctx: &mut ParsingContext) -> Step<Option<(String, DocumentNode)>> {
        let key = self.cursor.expect_identifier(ctx)?;
        self.cursor.expect(ctx, TokenType::Colon)?;
        let value = self.parse_value(ctx)?;
        Ok(key.zip(value))
    }

    /// Value ::= Object | Array | String | Integer | Float | Boolean
    fn parse_value(&mut self, ctx: &mut ParsingContext) -> Step<Option<DocumentNode>> {
        let token = self.cursor.current().clone();
        let value = match token.ttype {
            TokenType::LBrace => return self.parse_doc(ctx).map(Some),
            TokenType::LBracket => return self.parse_array(ctx).map(Some),
            TokenType::String(s) => Primitive::String(s),
            TokenType::Integer(n) => Primitive::Integer(n),
            TokenType::Float(n) => Primitive::Float(n),
            TokenType::Boolean(b) => Primitive::Boolean(b),
            TokenType::Eof => {
                return Err(self
                    .cursor
                    .end_of_input(ctx, "Expected a value (got EOF)".to_string()))
            }
            other => {
                self.cursor.record(
                    ctx,
                    LionError::syntax(
                        format!("Expected a value (got {})", other.name()),
                        token.region,
                    ),
                )?;
                self.cursor.advance();
                return Ok(None);
            }
        };
        self.cursor.advance();
        Ok(Some(DocumentNode::leaf(value).with_region(token.region)))
    }

    /// Array ::= "[" { Value [ "," ] } "]"
    fn parse_array(&mut self, ctx: &mut ParsingContext) -> Step<DocumentNode> {
        let open = self.cursor.current().region;
        self.cursor.enter(ctx)?;
        self.cursor.expect(ctx, TokenType::LBracket)?;
        let mut items = Vec::new();
        loop {
            self.cursor.skip_commas();
            if self.cursor.check(&TokenType::RBracket) {
                break;
            }
            if let Some(value) = self.parse_value(ctx)? {
                items.push(value);
            }
        }
        let close = self.cursor.current().region;
        self.cursor.advance(); // Consume the closing bracket
        self.cursor.leave();
        Ok(DocumentNode::from_array(items).with_region(open.combine(&close)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::error::ErrorKind;
    use crate::lexer::{Lexer, Region};

    fn parse_with(source: &str, ctx: &mut ParsingContext) -> Step<LionDocument> {
        let tokens = Lexer::new(source)
            .lex(&mut ctx.errors)
            .expect("lexing failed");
        Parser::new(tokens).validating(true).parse(ctx)
    }

    fn parse_ok(source: &str) -> LionDocument {
        let mut ctx = ParsingContext::new();
        let doc = parse_with(source, &mut ctx).expect("parse stopped early");
        assert!(ctx.errors.is_empty(), "unexpected errors: {}", ctx.errors);
        doc
    }

    fn leaf(doc: &LionDocument, key: &str) -> Primitive {
        doc.get(key)
            .and_then(DocumentNode::value)
            .cloned()
            .unwrap_or_else(|| panic!("no leaf at '{key}'"))
    }

    #[test]
    fn test_empty_object() {
        let doc = parse_ok("{}");
        assert!(doc.root.is_empty());
        assert!(!doc.has_schema);
    }

    #[test]
    fn test_simple_pairs() {
        let doc = parse_ok(r#"{ name: "lion", count: 3, ratio: 0.5, on: true }"#);
        assert_eq!(doc.root.keys().collect::<Vec<_>>(), vec!["name", "count", "ratio", "on"]);
        assert_eq!(leaf(&doc, "name"), Primitive::from("lion"));
        assert_eq!(leaf(&doc, "count"), Primitive::Integer(3));
        assert_eq!(leaf(&doc, "ratio"), Primitive::Float(0.5));
        assert_eq!(leaf(&doc, "on"), Primitive::Boolean(true));
    }

    #[test]
    fn test_doc_modifier_is_optional() {
        assert_eq!(parse_ok("@doc { a: 1 }").root, parse_ok("{ a: 1 }").root);
    }

    #[test]
    fn test_commas_are_optional_separators() {
        let with = parse_ok(r#"{ a: [1, 2, 3], b: "x", }"#);
        let without = parse_ok(r#"{ a: [1 2 3] b: "x" }"#);
        let doubled = parse_ok(r#"{ a: [1,, 2, 3,], ,b: "x" }"#);
        assert_eq!(with.root, without.root);
        assert_eq!(with.root, doubled.root);
    }

    #[test]
    fn test_nested_structures() {
        let doc = parse_ok("{ matrix: [[1, 2], [3]], env: { port: 8080 } }");
        let matrix = doc.get("matrix").unwrap();
        assert!(matrix.is_array());
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.get("1").unwrap().len(), 1);
        let env = doc.get("env").unwrap();
        assert!(matches!(env.kind, NodeKind::Container { is_array: false, .. }));
        assert_eq!(env.get("port").and_then(DocumentNode::value), Some(&Primitive::Integer(8080)));
    }

    #[test]
    fn test_regions_are_combined() {
        let doc = parse_ok("{\n    list: [\n1,\n 2 ]\n}");
        assert_eq!(doc.root.region, Some(Region::new(1, 5, 1, 1)));
        let list = doc.get("list").unwrap();
        assert_eq!(list.region, Some(Region::new(2, 4, 4, 11)));
        assert_eq!(list.get("0").unwrap().region, Some(Region::point(3, 1)));
    }

    #[test]
    fn test_embedded_schema() {
        let doc = parse_ok(
            r#"
            @schema {
                @definition {
                    name: String,
                    env?: Env,
                }
                @subschema Env {
                    port: Integer,
                }
            }
            @doc {
                name: "config",
                env: { port: 8080 },
            }
            "#,
        );
        assert!(doc.has_schema);
        let schema = doc.schema.as_ref().unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.component("env").unwrap().is_optional);
        assert_eq!(schema.sub_schemas.len(), 1);
        assert_eq!(schema.sub_schemas[0].0, "Env");
    }

    #[test]
    fn test_embedded_schema_validates_document() {
        let mut ctx = ParsingContext::new();
        let source = r#"
            @schema { @definition { name: String } }
            @doc { name: 1, extra: true }
        "#;
        let doc = parse_with(source, &mut ctx).unwrap();
        assert!(doc.has_schema);
        let messages: Vec<&str> = ctx.errors.errors.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.contains(&"Unexpected key 'extra'."));
        assert!(messages.contains(&"Expected key 'name' to satisfy the constraints of type 'String'."));
        assert!(ctx.errors.errors.iter().all(|e| e.kind == ErrorKind::Schema));
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let mut ctx = ParsingContext::new();
        let tokens = Lexer::new("@schema { @definition { a: String } } @doc { a: 1 }")
            .lex(&mut ctx.errors)
            .unwrap();
        let doc = Parser::new(tokens).parse(&mut ctx).unwrap();
        assert!(doc.has_schema);
        assert!(ctx.errors.is_empty());
    }

    #[test]
    fn test_mismatch_is_recorded_and_parsing_continues() {
        let mut ctx = ParsingContext::new();
        let doc = parse_with("{ a 1, b: 2, c: 3 }", &mut ctx).unwrap();
        assert!(!ctx.errors.is_empty());
        assert_eq!(
            ctx.errors.errors[0].message,
            "Expected token type to be COLON (got INTEGER)"
        );
        assert!(doc.get("c").is_some());
    }

    #[test]
    fn test_multiple_errors_in_one_pass() {
        let mut ctx = ParsingContext::new();
        let doc = parse_with("{ a: :, b: 2, c: ] }", &mut ctx).unwrap();
        assert_eq!(ctx.errors.len(), 2);
        assert_eq!(doc.get("b").and_then(DocumentNode::value), Some(&Primitive::Integer(2)));
    }

    #[test]
    fn test_premature_end_stops_parsing() {
        let mut ctx = ParsingContext::new();
        let result = parse_with("{ a: [1, 2", &mut ctx);
        assert_eq!(result.unwrap_err(), Halt::EndOfInput);
        assert_eq!(ctx.errors.len(), 1);
        assert!(ctx.errors.errors[0].message.ends_with("(got EOF)"));
    }

    #[test]
    fn test_trailing_content_is_reported() {
        let mut ctx = ParsingContext::new();
        parse_with("{ a: 1 } { b: 2 }", &mut ctx).unwrap();
        assert_eq!(ctx.errors.len(), 1);
        assert!(ctx.errors.errors[0].message.starts_with("Unexpected trailing content"));
    }

    #[test]
    fn test_fail_fast_halts_on_first_error() {
        let mut ctx = ParsingContext::fail_fast();
        let result = parse_with("{ a: :, b: 2, c: ] }", &mut ctx);
        assert_eq!(result.unwrap_err(), Halt::FailFast);
        assert_eq!(ctx.errors.len(), 1);
    }

    #[test]
    fn test_unclosed_schema_block_is_reported() {
        let mut ctx = ParsingContext::new();
        let doc = parse_with("@schema { @definition { a: String } @doc { a: \"x\" }", &mut ctx).unwrap();
        assert_eq!(ctx.errors.len(), 1);
        assert_eq!(ctx.errors.errors[0].message, "Expected '}' to close the @schema block");
        assert!(doc.has_schema);
        assert_eq!(doc.get("a").and_then(DocumentNode::value), Some(&Primitive::from("x")));
    }

    #[test]
    fn test_comma_after_schema_block() {
        let doc = parse_ok("@schema { @definition { a: String } }, @doc { a: \"x\" }");
        assert!(doc.has_schema);
        assert_eq!(doc.schema.as_ref().map(Schema::len), Some(1));
    }

    #[test]
    fn test_missing_value_at_end() {
        let mut ctx = ParsingContext::new();
        let result = parse_with("{ a:", &mut ctx);
        assert_eq!(result.unwrap_err(), Halt::EndOfInput);
        assert_eq!(ctx.errors.errors[0].message, "Expected a value (got EOF)");
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let mut ctx = ParsingContext::new();
        let source = format!("{{ a: {}", "[".repeat(MAX_DEPTH * 4));
        let result = parse_with(&source, &mut ctx);
        assert_eq!(result.unwrap_err(), Halt::NestingLimit);
        assert_eq!(ctx.errors.len(), 1);
        assert_eq!(ctx.errors.errors[0].message, "Nesting is deeper than 128 levels");
    }

    #[test]
    fn test_nesting_within_limit() {
        let depth = MAX_DEPTH - 1;
        let source = format!("{{ a: {}{} }}", "[".repeat(depth), "]".repeat(depth));
        let doc = parse_ok(&source);
        assert!(doc.get("a").is_some_and(DocumentNode::is_array));
    }
}
