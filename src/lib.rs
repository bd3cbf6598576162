pub mod api;
pub mod ast;
pub mod context;
pub mod error;
pub mod lexer;
pub mod parser;
mod printer;
pub mod registry;
pub mod schema;
pub mod schema_parser;
pub mod serialization;
pub mod utils;

pub use api::{
    analyze_schema, analyze_text, parse_schema, parse_schema_in, parse_schema_or_none,
    parse_schema_with_name, parse_text, parse_text_in, parse_text_or_none, parse_text_with_name,
    stringify_document, stringify_schema, validate_node,
};
pub use ast::{DocumentNode, LionDocument, NodeKind, Primitive};
pub use context::ParsingContext;
pub use error::{ErrorKind, ErrorList, LionError, LionErrors};
pub use schema::{Schema, SchemaComponent};
