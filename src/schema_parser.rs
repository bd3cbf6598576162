use crate::context::ParsingContext;
use crate::lexer::{Token, TokenType};
use crate::parser::{Cursor, Step};
use crate::schema::{Schema, SchemaComponent};

/// Parses schema text.
///
///    SchemaText ::= "@definition" Block { "@subschema" Identifier Block }
///    Block      ::= "{" { Property [ "," ] } "}"
///    Property   ::= Identifier [ "?" ] ":" Type
///    Type       ::= Identifier [ "<" Type ">" ]
///
/// Each sub-schema is registered in the context's type registry as it is
/// parsed, and also kept on the returned schema.
#[derive(Debug, Clone)]
pub struct SchemaParser {
    cursor: Cursor,
}

impl SchemaParser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            cursor: Cursor::new(tokens),
        }
    }

    pub fn parse(&mut self, ctx: &mut ParsingContext) -> Step<Schema> {
        self.cursor.expect_modifier(ctx, "@definition")?;
        let mut schema = self.parse_block(ctx)?;

        loop {
            self.cursor.skip_commas();
            if self.cursor.at_end() {
                break;
            }
            if !self.cursor.expect_modifier(ctx, "@subschema")? {
                continue;
            }
            let name = self.cursor.expect_identifier(ctx)?;
            let sub_schema = self.parse_block(ctx)?;
            if let Some(name) = name {
                ctx.type_registry
                    .register_sub_schema(name.clone(), sub_schema.clone());
                schema.add_sub_schema(name, sub_schema);
            }
        }

        Ok(schema)
    }

    fn parse_block(&mut self, ctx: &mut ParsingContext) -> Step<Schema> {
        self.cursor.expect(ctx, TokenType::LBrace)?;
        let mut schema = Schema::new();
        loop {
            self.cursor.skip_commas();
            if self.cursor.check(&TokenType::RBrace) {
                break;
            }
            if let Some((name, component)) = self.parse_property(ctx)? {
                schema.add_component(name, component);
            }
        }
        self.cursor.advance(); // Consume the closing brace
        Ok(schema)
    }

    fn parse_property(&mut self, ctx: &mut ParsingContext) -> Step<Option<(String, SchemaComponent)>> {
        let name = self.cursor.expect_identifier(ctx)?;
        let is_optional = self.cursor.match_token(&TokenType::OptionalProperty);
        self.cursor.expect(ctx, TokenType::Colon)?;
        let type_expr = self.parse_type(ctx)?;
        Ok(name.zip(type_expr).map(|(name, type_expr)| {
            (
                name,
                SchemaComponent {
                    type_expr,
                    is_optional,
                },
            )
        }))
    }

    /// Reads a possibly parameterized type and returns its canonical text,
    /// e.g. `Array<Array<Integer>>`.
    fn parse_type(&mut self, ctx: &mut ParsingContext) -> Step<Option<String>> {
        let name = self.cursor.expect_identifier(ctx)?;
        if !self.cursor.match_token(&TokenType::OfTypeStart) {
            return Ok(name);
        }
        self.cursor.enter(ctx)?;
        let inner = self.parse_type(ctx)?;
        self.cursor.expect(ctx, TokenType::OfTypeEnd)?;
        self.cursor.leave();
        Ok(name
            .zip(inner)
            .map(|(name, inner)| format!("{name}<{inner}>")))
    }
}
