//! Compiled schemas and their member definitions.

mod compile;

pub(crate) use compile::{compile_object, compile_schema_node};

use crate::node::Node;
use crate::registry::TypeValidator;
use crate::value::Value;
use indexmap::IndexMap;
use iobj_parser::{Position, PositionRange};
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// A compiled schema: an ordered field list, the definition of each field,
/// and the policy for fields the schema does not name.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// The `$Name` this schema was declared under (or the name given to
    /// [`compile_schema`][crate::compile_schema]).
    pub name: String,
    /// Dotted path from the root schema; empty at the root.
    pub path: String,
    /// Field names in declared order. Never contains `*`.
    pub names: Vec<String>,
    /// Field definitions, keyed by field name. A typed open schema is
    /// mirrored at `defs["*"]`.
    pub defs: IndexMap<String, MemberDef>,
    pub open: Open,
}

impl Schema {
    pub fn member(&self, name: &str) -> Option<&MemberDef> {
        self.defs.get(name)
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.open, Open::Closed)
    }
}

/// What happens to fields the schema does not declare.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Open {
    /// Unknown fields are rejected.
    #[default]
    Closed,
    /// Unknown fields are accepted as-is (`*` sentinel, or an empty
    /// schema).
    Untyped,
    /// Unknown fields validate against this definition (`*: type`).
    Typed(Box<MemberDef>),
}

/// The compiled description of one schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    /// Field name with `?`/`*` suffixes stripped.
    pub name: String,
    /// Dotted concatenation with the enclosing schema path.
    pub path: String,
    pub type_name: String,
    pub validator: TypeValidator,
    pub optional: bool,
    pub nullable: bool,
    /// Used when an optional member is absent or a nullable member is
    /// null.
    pub default: Option<Value>,
    pub constraints: Constraints,
    /// For `object`-typed members: the nested or referenced schema.
    pub schema: Option<SchemaHandle>,
    /// For `array`-typed members: the element definition, when given.
    pub of: Option<Box<MemberDef>>,
    /// Where this member was declared.
    pub range: PositionRange,
}

impl MemberDef {
    /// A member accepting anything, as inferred for bare field names.
    pub(crate) fn any(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            type_name: "any".to_string(),
            validator: TypeValidator::Any,
            optional: false,
            nullable: false,
            default: None,
            constraints: Constraints::default(),
            schema: None,
            of: None,
            range: PositionRange::UNKNOWN,
        }
    }
}

/// A nested schema, either compiled inline or referenced by `$Name`.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaHandle {
    Inline(Node<Schema>),
    Reference {
        name: String,
        range: PositionRange,
    },
}

/// Constraint record for a member definition. Which fields apply depends
/// on the member's type; the rest stay unset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constraints {
    pub choices: Option<Vec<Value>>,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Pattern>,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

/// A compiled `pattern:` constraint.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    pub regex: Regex,
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// A fatal schema-compile failure. There is no partial schema: the compile
/// call fails as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("invalid schema `{name}`: {reason}")]
    InvalidSchema {
        name: String,
        reason: String,
        range: PositionRange,
    },
    #[error("unknown type `{type_name}` for `{path}`")]
    InvalidType {
        type_name: String,
        path: String,
        range: PositionRange,
    },
    #[error("invalid key for `{path}`: {reason}")]
    InvalidKey {
        path: String,
        reason: String,
        range: PositionRange,
    },
    #[error("duplicate member `{name}` in schema `{schema}` (first defined at {first})")]
    DuplicateMember {
        name: String,
        schema: String,
        first: Position,
        range: PositionRange,
    },
    #[error("`*` must be the last member of schema `{schema}`")]
    StarPosition {
        schema: String,
        range: PositionRange,
    },
    #[error("empty member definition for `{path}`")]
    EmptyMemberDef {
        path: String,
        range: PositionRange,
    },
}

impl CompileError {
    pub fn range(&self) -> PositionRange {
        match self {
            CompileError::InvalidSchema { range, .. }
            | CompileError::InvalidType { range, .. }
            | CompileError::InvalidKey { range, .. }
            | CompileError::DuplicateMember { range, .. }
            | CompileError::StarPosition { range, .. }
            | CompileError::EmptyMemberDef { range, .. } => *range,
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema {} {{", self.name)?;
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {name}")?;
        }
        match &self.open {
            Open::Closed => write!(f, " }}"),
            Open::Untyped => write!(f, ", * }}"),
            Open::Typed(def) => write!(f, ", *: {} }}", def.type_name),
        }
    }
}
