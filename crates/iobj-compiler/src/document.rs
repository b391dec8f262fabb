//! The top-level document pipeline: parse, build definitions, process
//! sections, convert to JSON.

use crate::definitions::Definitions;
use crate::diagnostic::DocumentError;
use crate::node::Node;
use crate::processor::Processor;
use crate::schema::{compile_schema_node, CompileError, Schema, SchemaHandle};
use crate::source::SourceFile;
use crate::value::Value;
use iobj_parser::{ast, normalize_newlines};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Configuration for parsing an input string as an Internet Object
/// document.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    recursion_limit: Option<usize>,
    token_limit: Option<usize>,
}

impl Parser {
    /// Create a `Parser` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the recursion limit to use while parsing. This protects
    /// against stack overflow on deeply nested input.
    pub fn recursion_limit(mut self, value: usize) -> Self {
        self.recursion_limit = Some(value);
        self
    }

    /// Configure the limit on the number of tokens to parse. If an input
    /// document is too big, parsing is aborted.
    pub fn token_limit(mut self, value: usize) -> Self {
        self.token_limit = Some(value);
        self
    }

    /// Parse `source_text` into a [`Document`].
    ///
    /// `path` is the filesystem path (or arbitrary string) used in
    /// diagnostics to identify this input to users; it does not need to
    /// exist.
    pub fn parse(&self, source_text: &str, path: impl AsRef<Path>) -> Document {
        let normalized = normalize_newlines(source_text).into_owned();

        let mut parser = iobj_parser::Parser::new(&normalized);
        if let Some(limit) = self.recursion_limit {
            parser = parser.recursion_limit(limit);
        }
        if let Some(limit) = self.token_limit {
            parser = parser.token_limit(limit);
        }
        let (ast_document, syntax_errors) = parser.parse().into_parts();

        let mut errors: Vec<DocumentError> = syntax_errors
            .iter()
            .map(|e| {
                DocumentError::syntax(
                    e.message(),
                    e.position(),
                    Some(e.end_position()),
                    e.collection_index(),
                )
            })
            .collect();

        let mut definitions = Definitions::new();
        if let Some(header) = &ast_document.header {
            process_header(header, &mut definitions, &mut errors);
        }

        let mut used_keys: HashSet<String> = ast_document
            .sections
            .iter()
            .filter_map(|s| s.unique_name.clone())
            .collect();
        let mut sections = Vec::with_capacity(ast_document.sections.len());
        for (index, section) in ast_document.sections.iter().enumerate() {
            let name = section.name_text().map(str::to_string);
            let key = match &section.unique_name {
                Some(unique) => unique.clone(),
                None => unnamed_key(&mut used_keys, index),
            };
            // an explicit `: $Ref` wins; otherwise a section picks up
            // `$<its-name>` or the header's default `$schema` when declared
            let explicit = section.schema_text().map(str::to_string);
            let schema = explicit.or_else(|| {
                section.body.as_ref()?;
                name.as_ref()
                    .map(|n| format!("${n}"))
                    .filter(|candidate| definitions.contains(candidate))
                    .or_else(|| {
                        definitions
                            .contains("$schema")
                            .then(|| "$schema".to_string())
                    })
            });

            let mut processor = Processor::new(&definitions);
            let value = match (&section.body, &schema) {
                (None, _) => Value::Null,
                (Some(body), Some(reference)) => {
                    let range = section
                        .schema
                        .as_ref()
                        .map(|t| t.range())
                        .unwrap_or_else(|| body.range());
                    processor.process_reference(body, reference, range)
                }
                (Some(body), None) => processor.raw_body(body),
            };
            for error in processor.into_errors() {
                errors.push(DocumentError::validation(
                    error.to_string(),
                    error.range.start,
                    Some(error.range.end),
                    error.collection_index,
                ));
            }

            sections.push(Section {
                name,
                key,
                schema,
                value,
            });
        }

        errors.sort_by_key(|e| e.position);

        Document {
            source: Arc::new(SourceFile::new(path.as_ref().to_owned(), normalized)),
            definitions,
            sections,
            errors,
        }
    }
}

/// A parsed, processed document.
///
/// Parsing never fails: a document always carries a value for every
/// section (with `__error` placeholders where something went wrong) plus
/// the accumulated error list, ordered by source position.
#[derive(Debug)]
pub struct Document {
    source: Arc<SourceFile>,
    pub definitions: Definitions,
    pub sections: Vec<Section>,
    pub errors: Vec<DocumentError>,
}

/// One processed data section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// The name written in the source, if any.
    pub name: Option<String>,
    /// The unique key this section answers to: the (auto-renamed) name, or
    /// `section_<ordinal>` for unnamed sections.
    pub key: String,
    /// The `$Name` schema this section was validated against: the explicit
    /// reference from the section header line, or the implied
    /// `$<section-name>` / default `$schema` definition.
    pub schema: Option<String>,
    pub value: Value,
}

impl Document {
    /// Parse a document with the default parser configuration.
    pub fn parse(source_text: &str, path: impl AsRef<Path>) -> Self {
        Parser::new().parse(source_text, path)
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.key == key)
    }

    /// Convert the processed document to a JSON value tree.
    ///
    /// A document whose only data section is unnamed converts to that
    /// section's value directly; otherwise sections convert to a map keyed
    /// by section key.
    pub fn to_json(&self) -> serde_json::Value {
        match self.sections.as_slice() {
            [only] if only.name.is_none() => only.value.to_json(),
            sections => serde_json::Value::Object(
                sections
                    .iter()
                    .map(|s| (s.key.clone(), s.value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Render every accumulated error as an ariadne report over the
    /// source.
    pub fn format_errors(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.report(&self.source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn unnamed_key(used: &mut HashSet<String>, index: usize) -> String {
    let base = format!("section_{}", index + 1);
    if used.insert(base.clone()) {
        return base;
    }
    let mut suffix = 2usize;
    loop {
        let candidate = format!("{base}_{suffix}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Build the definitions table from the header section, in source order.
/// Variables resolve against everything declared before them; schemas
/// compile eagerly, with `$a: $b` aliases kept as deferred references.
fn process_header(
    header: &ast::Section,
    definitions: &mut Definitions,
    errors: &mut Vec<DocumentError>,
) {
    let members: Vec<&ast::Member> = match &header.body {
        Some(ast::SectionBody::Object(object)) => object.defined_members().collect(),
        Some(ast::SectionBody::Collection(collection)) => collection
            .rows
            .iter()
            .filter_map(|row| match row {
                ast::Row::Object(object) => Some(object.defined_members()),
                _ => None,
            })
            .flatten()
            .collect(),
        None => Vec::new(),
    };

    for member in members {
        let Some(key) = member.key_text() else {
            continue;
        };
        let key = key.to_string();
        if key.starts_with('@') {
            let value = match &member.value {
                Some(node) => {
                    let mut processor = Processor::new(definitions);
                    let value = processor.raw_node(node);
                    for error in processor.into_errors() {
                        errors.push(DocumentError::validation(
                            error.to_string(),
                            error.range.start,
                            Some(error.range.end),
                            None,
                        ));
                    }
                    value
                }
                None => Value::Null,
            };
            definitions.define_variable(key, value);
        } else if key.starts_with('$') {
            let Some(node) = &member.value else {
                errors.push(DocumentError::syntax(
                    format!("schema `{key}` has no definition"),
                    member.range().start,
                    Some(member.range().end),
                    None,
                ));
                continue;
            };
            match compile_schema_node(&key, node, definitions) {
                Ok(SchemaHandle::Inline(schema)) => definitions.define_schema(key, schema),
                Ok(SchemaHandle::Reference { name, range }) => {
                    definitions.define_schema_ref(key, name, range)
                }
                Err(compile_error) => {
                    let range = compile_error.range();
                    errors.push(DocumentError::syntax(
                        compile_error.to_string(),
                        range.start,
                        Some(range.end),
                        None,
                    ));
                }
            }
        }
    }
}

/// Parse and compile a standalone schema string.
///
/// Unlike document parsing, schema compilation is fatal: the first syntax
/// or compile fault fails the whole call and no partial schema is
/// produced.
pub fn compile_schema(name: &str, schema_text: &str) -> Result<Node<Schema>, CompileError> {
    let normalized = normalize_newlines(schema_text).into_owned();
    let tree = iobj_parser::Parser::new(&normalized).parse();
    if let Some(error) = tree.errors().first() {
        return Err(CompileError::InvalidSchema {
            name: name.to_string(),
            reason: error.message().to_string(),
            range: error.range(),
        });
    }
    let document = tree.document();
    let body = document.sections.first().and_then(|s| s.body.as_ref());
    match body {
        Some(ast::SectionBody::Object(object)) => {
            let schema =
                crate::schema::compile_object(name, object, &Definitions::new(), "")?;
            Ok(Node::new_parsed(schema, object.range()))
        }
        _ => Err(CompileError::InvalidSchema {
            name: name.to_string(),
            reason: "expected a schema object".to_string(),
            range: iobj_parser::PositionRange::UNKNOWN,
        }),
    }
}
