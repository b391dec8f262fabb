#![doc = include_str!("../README.md")]

mod definitions;
mod diagnostic;
mod document;
mod node;
mod processor;
mod registry;
mod schema;
mod source;
mod value;

pub use crate::definitions::{Definition, Definitions, ResolveError};
pub use crate::diagnostic::{DocumentError, ErrorCategory};
pub use crate::document::{compile_schema, Document, Parser, Section};
pub use crate::node::Node;
pub use crate::processor::{process, ValidationError, ValidationErrorKind};
pub use crate::registry::{registry, TypeRegistry, TypeValidator};
pub use crate::schema::{
    CompileError, Constraints, MemberDef, Open, Pattern, Schema, SchemaHandle,
};
pub use crate::source::SourceFile;
pub use crate::value::Value;

// the syntax layer, re-exported for processor and AST consumers
pub use iobj_parser::{ast, DateTimeVariant, Position, PositionRange};

use std::path::Path;

/// Parse an Internet Object document with the default configuration.
///
/// Parsing never fails: the returned [`Document`] carries a value tree for
/// every section plus the accumulated error list.
pub fn parse(source_text: &str) -> Document {
    parse_with_path(source_text, "document.iobj")
}

/// Parse a document, naming the input for diagnostics.
pub fn parse_with_path(source_text: &str, path: impl AsRef<Path>) -> Document {
    Parser::new().parse(source_text, path)
}
