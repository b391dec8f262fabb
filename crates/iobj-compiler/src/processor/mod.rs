//! Validation and materialization of data AST nodes against compiled
//! schemas.

mod types;

use crate::definitions::{Definitions, ResolveError};
use crate::schema::{MemberDef, Open, Schema, SchemaHandle};
use crate::value::Value;
use indexmap::IndexMap;
use iobj_parser::{ast, PositionRange, Token, TokenKind, TokenValue};
use std::fmt;
use thiserror::Error;

/// Why a value failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationErrorKind {
    #[error("missing required value for `{0}`")]
    ValueRequired(String),
    #[error("null is not allowed for `{0}`")]
    NullNotAllowed(String),
    #[error("invalid type for `{path}`: expected {expected}, found {found}")]
    InvalidType {
        path: String,
        expected: String,
        found: String,
    },
    #[error("value for `{0}` is not one of the allowed choices")]
    ValueNotInChoices(String),
    #[error("value for `{0}` is out of range")]
    OutOfRange(String),
    #[error("length of `{0}` is out of range")]
    LengthOutOfRange(String),
    #[error("value for `{0}` does not match the required pattern")]
    PatternMismatch(String),
    #[error("unknown member `{0}`")]
    ExtraField(String),
    #[error("duplicate member `{0}`")]
    DuplicateMember(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A validation failure with its source range and, inside collections, the
/// zero-based row it occurred in.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub range: PositionRange,
    pub collection_index: Option<usize>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)?;
        if let Some(row) = self.collection_index {
            write!(f, " (row {row})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Validate and materialize `body` against `schema`.
///
/// This is the direct-call surface: any validation failure makes the whole
/// call fail. During document parsing the same machinery runs in
/// accumulating mode instead, leaving `__error` placeholders in the value
/// tree.
pub fn process(
    body: &ast::SectionBody,
    schema: &Schema,
    defs: &Definitions,
) -> Result<Value, Vec<ValidationError>> {
    let mut processor = Processor::new(defs);
    let value = processor.process_body(body, schema);
    let errors = processor.into_errors();
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

pub(crate) struct Processor<'a> {
    defs: &'a Definitions,
    errors: Vec<ValidationError>,
    row: Option<usize>,
}

impl<'a> Processor<'a> {
    pub(crate) fn new(defs: &'a Definitions) -> Self {
        Self {
            defs,
            errors: Vec::new(),
            row: None,
        }
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Record a failure and return the placeholder that stands in for the
    /// value.
    fn error(&mut self, kind: ValidationErrorKind, range: PositionRange) -> Value {
        let message = kind.to_string();
        self.errors.push(ValidationError {
            kind,
            range,
            collection_index: self.row,
        });
        Value::error_placeholder(message)
    }

    // ---- schema-driven processing ----

    pub(crate) fn process_body(&mut self, body: &ast::SectionBody, schema: &Schema) -> Value {
        match body {
            ast::SectionBody::Object(object) => self.validate_object(object, schema),
            ast::SectionBody::Collection(collection) => {
                self.validate_collection(collection, schema)
            }
        }
    }

    /// Process `body` against a `$Name` schema reference, resolving it
    /// through the definitions table.
    pub(crate) fn process_reference(
        &mut self,
        body: &ast::SectionBody,
        name: &str,
        range: PositionRange,
    ) -> Value {
        let defs = self.defs;
        match defs.schema(name) {
            Ok(schema) => {
                let schema = schema.clone();
                self.process_body(body, &schema)
            }
            Err(e) => self.error(e.into(), range),
        }
    }

    fn validate_collection(&mut self, collection: &ast::Collection, schema: &Schema) -> Value {
        let mut rows = Vec::with_capacity(collection.rows.len());
        for (index, row) in collection.rows.iter().enumerate() {
            // fresh per-row validator state
            self.row = Some(index);
            let value = match row {
                ast::Row::Object(object) => self.validate_object(object, schema),
                ast::Row::Empty(_) => Value::Null,
                ast::Row::Error(e) => Value::error_placeholder(e.error.message()),
            };
            rows.push(value);
        }
        self.row = None;
        Value::Array(rows)
    }

    /// Validate a data object against a schema, field by field in declared
    /// schema order.
    pub(crate) fn validate_object(&mut self, object: &ast::Object, schema: &Schema) -> Value {
        // duplicate keys: the first value is used, every extra occurrence
        // reports
        let mut first_by_key: IndexMap<&str, usize> = IndexMap::new();
        for (i, slot) in object.members.iter().enumerate() {
            let Some(member) = slot else { continue };
            let Some(key) = member.key_text() else { continue };
            if first_by_key.contains_key(key) {
                self.error(
                    ValidationErrorKind::DuplicateMember(qualify(&schema.path, key)),
                    member.range(),
                );
            } else {
                first_by_key.insert(key, i);
            }
        }

        let mut consumed = vec![false; object.members.len()];
        let mut out: IndexMap<String, Value> = IndexMap::new();

        for (index, field) in schema.names.iter().enumerate() {
            let def = &schema.defs[field];
            let found: Option<&ast::Member> = if let Some(&i) = first_by_key.get(field.as_str())
            {
                consumed[i] = true;
                object.members[i].as_ref()
            } else if let Some(Some(member)) = object.members.get(index) {
                if member.key.is_none() && !consumed[index] {
                    consumed[index] = true;
                    Some(member)
                } else {
                    None
                }
            } else {
                None
            };
            if let Some(value) = self.validate_member(found, def, object.range()) {
                out.insert(field.clone(), value);
            }
        }

        // members the schema does not name
        for (i, slot) in object.members.iter().enumerate() {
            if consumed[i] {
                continue;
            }
            let Some(member) = slot else { continue };
            if let Some(key) = member.key_text() {
                if first_by_key.get(key) != Some(&i) {
                    continue; // later duplicate, already reported
                }
            }
            let key = member
                .key_text()
                .map(str::to_string)
                .unwrap_or_else(|| i.to_string());
            match &schema.open {
                Open::Closed => {
                    self.error(
                        ValidationErrorKind::ExtraField(qualify(&schema.path, &key)),
                        member.range(),
                    );
                }
                Open::Untyped => {
                    let value = match &member.value {
                        Some(node) => self.raw_node(node),
                        None => Value::Null,
                    };
                    out.insert(key, value);
                }
                Open::Typed(def) => {
                    let mut typed = (**def).clone();
                    typed.name = key.clone();
                    typed.path = qualify(&schema.path, &key);
                    if let Some(value) = self.validate_member(Some(member), &typed, member.range())
                    {
                        out.insert(key, value);
                    }
                }
            }
        }

        Value::Object(out)
    }

    /// Validate one member against its definition. `None` means the field
    /// is omitted from the output (optional and absent, with no default).
    fn validate_member(
        &mut self,
        member: Option<&ast::Member>,
        def: &MemberDef,
        fallback: PositionRange,
    ) -> Option<Value> {
        let node = member.and_then(|m| m.value.as_ref());
        let Some(node) = node else {
            if def.optional {
                return def.default.clone();
            }
            let range = member.map(|m| m.range()).unwrap_or(fallback);
            return Some(self.error(ValidationErrorKind::ValueRequired(def.path.clone()), range));
        };

        // the `null` type validates null itself
        if is_null_leaf(node) && def.validator != crate::registry::TypeValidator::Null {
            if def.nullable {
                return Some(def.default.clone().unwrap_or(Value::Null));
            }
            return Some(self.error(
                ValidationErrorKind::NullNotAllowed(def.path.clone()),
                node.range(),
            ));
        }

        Some(self.validate_value(node, def))
    }

    pub(crate) fn validate_value(&mut self, node: &ast::Node, def: &MemberDef) -> Value {
        use crate::registry::TypeValidator as V;
        use iobj_parser::DateTimeVariant as DV;

        if let ast::Node::Error(e) = node {
            // already reported as a syntax error
            return Value::error_placeholder(e.error.message());
        }

        match def.validator {
            V::Any => self.raw_node(node),
            V::String => types::string(self, node, def),
            V::Number => types::number(self, node, def),
            V::Bool => types::boolean(self, node, def),
            V::Null => types::null(self, node, def),
            V::Date => types::date_time(self, node, def, DV::Date),
            V::Time => types::date_time(self, node, def, DV::Time),
            V::DateTime => types::date_time(self, node, def, DV::DateTime),
            V::Object => self.validate_object_member(node, def),
            V::Array => self.validate_array_member(node, def),
            V::Binary => types::binary(self, node, def),
        }
    }

    fn validate_object_member(&mut self, node: &ast::Node, def: &MemberDef) -> Value {
        let ast::Node::Object(object) = node else {
            return self.error(
                ValidationErrorKind::InvalidType {
                    path: def.path.clone(),
                    expected: "object".to_string(),
                    found: describe_node(node).to_string(),
                },
                node.range(),
            );
        };
        match &def.schema {
            None => self.raw_object(object),
            Some(SchemaHandle::Inline(schema)) => {
                let schema = schema.clone();
                self.validate_object(object, &schema)
            }
            Some(SchemaHandle::Reference { name, range }) => {
                let defs = self.defs;
                match defs.schema(name) {
                    Ok(schema) => {
                        let schema = schema.clone();
                        self.validate_object(object, &schema)
                    }
                    Err(e) => self.error(e.into(), *range),
                }
            }
        }
    }

    fn validate_array_member(&mut self, node: &ast::Node, def: &MemberDef) -> Value {
        let ast::Node::Array(array) = node else {
            return self.error(
                ValidationErrorKind::InvalidType {
                    path: def.path.clone(),
                    expected: "array".to_string(),
                    found: describe_node(node).to_string(),
                },
                node.range(),
            );
        };
        let mut items = Vec::with_capacity(array.elements.len());
        for element in &array.elements {
            let value = match &def.of {
                Some(of) => self.validate_value(element, of),
                None => self.raw_node(element),
            };
            items.push(value);
        }
        let len = items.len();
        if def.constraints.min_len.is_some_and(|min| len < min)
            || def.constraints.max_len.is_some_and(|max| len > max)
        {
            self.error(
                ValidationErrorKind::LengthOutOfRange(def.path.clone()),
                array.range(),
            );
        }
        Value::Array(items)
    }

    // ---- raw (schema-less) materialization ----

    pub(crate) fn raw_body(&mut self, body: &ast::SectionBody) -> Value {
        match body {
            ast::SectionBody::Object(object) => self.raw_object(object),
            ast::SectionBody::Collection(collection) => {
                let mut rows = Vec::with_capacity(collection.rows.len());
                for (index, row) in collection.rows.iter().enumerate() {
                    self.row = Some(index);
                    let value = match row {
                        ast::Row::Object(object) => self.raw_object(object),
                        ast::Row::Empty(_) => Value::Null,
                        ast::Row::Error(e) => Value::error_placeholder(e.error.message()),
                    };
                    rows.push(value);
                }
                self.row = None;
                Value::Array(rows)
            }
        }
    }

    pub(crate) fn raw_node(&mut self, node: &ast::Node) -> Value {
        match node {
            ast::Node::Leaf(token) => self.leaf_value(token),
            ast::Node::Object(object) => self.raw_object(object),
            ast::Node::Array(array) => {
                let mut items = Vec::with_capacity(array.elements.len());
                for element in &array.elements {
                    let value = self.raw_node(element);
                    items.push(value);
                }
                Value::Array(items)
            }
            ast::Node::Error(e) => Value::error_placeholder(e.error.message()),
        }
    }

    /// Materialize an object with no schema. A bracketless object whose
    /// members are all positional renders as its single value or as an
    /// array; everything else becomes a map (positional members keyed by
    /// index).
    pub(crate) fn raw_object(&mut self, object: &ast::Object) -> Value {
        let defined: Vec<&ast::Member> = object.defined_members().collect();
        if object.is_open() && !defined.is_empty() && defined.iter().all(|m| m.key.is_none()) {
            if object.members.len() == 1 {
                return match &defined[0].value {
                    Some(node) => self.raw_node(node),
                    None => Value::Null,
                };
            }
            let mut items = Vec::with_capacity(object.members.len());
            for slot in &object.members {
                let value = match slot {
                    Some(member) => match &member.value {
                        Some(node) => self.raw_node(node),
                        None => Value::Null,
                    },
                    None => Value::Null,
                };
                items.push(value);
            }
            return Value::Array(items);
        }

        let mut out: IndexMap<String, Value> = IndexMap::new();
        for (i, slot) in object.members.iter().enumerate() {
            let Some(member) = slot else { continue };
            let key = member
                .key_text()
                .map(str::to_string)
                .unwrap_or_else(|| i.to_string());
            if out.contains_key(&key) {
                self.error(ValidationErrorKind::DuplicateMember(key), member.range());
                continue;
            }
            let value = match &member.value {
                Some(node) => self.raw_node(node),
                None => Value::Null,
            };
            out.insert(key, value);
        }
        Value::Object(out)
    }

    pub(crate) fn leaf_value(&mut self, token: &Token) -> Value {
        match self.resolve_leaf(token) {
            Ok(value) => value,
            Err(kind) => self.error(kind, token.range()),
        }
    }

    /// The value of a scalar token, with `@variable` references resolved
    /// through the definitions table.
    fn resolve_leaf(&self, token: &Token) -> Result<Value, ValidationErrorKind> {
        self.defs.resolve_token(token).map_err(Into::into)
    }
}

fn is_null_leaf(node: &ast::Node) -> bool {
    matches!(node.as_leaf(), Some(token) if token.kind() == TokenKind::Null
        || matches!(token.value(), TokenValue::Null))
}

pub(crate) fn describe_node(node: &ast::Node) -> &'static str {
    match node {
        ast::Node::Object(_) => "object",
        ast::Node::Array(_) => "array",
        ast::Node::Leaf(token) => token.kind().describe(),
        ast::Node::Error(_) => "error",
    }
}

fn qualify(schema_path: &str, key: &str) -> String {
    if schema_path.is_empty() {
        key.to_string()
    } else {
        format!("{schema_path}.{key}")
    }
}
