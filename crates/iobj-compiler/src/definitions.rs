use crate::node::Node;
use crate::schema::Schema;
use crate::value::Value;
use indexmap::IndexMap;
use iobj_parser::PositionRange;
use thiserror::Error;

/// The `@name → value` and `$Name → schema` table built from a document
/// header.
///
/// Populated while the header is processed, then read-only for the rest of
/// the document. Schema references resolve by name lookup, never by pointer
/// fixup, so reference cycles are detected here instead of recursed into.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    entries: IndexMap<String, Definition>,
}

/// One header declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// `@name: value`
    Variable(Value),
    /// `$Name: { … }`, compiled eagerly.
    Schema(Node<Schema>),
    /// `$Name: $Other`, resolved by name at validation time.
    SchemaRef {
        target: String,
        range: PositionRange,
    },
}

/// A failed lookup in the definitions table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("schema `{0}` is not defined")]
    SchemaNotDefined(String),
    #[error("schema `{0}` is not defined: cyclic schema reference")]
    CyclicSchemaReference(String),
    #[error("variable `{0}` is not defined")]
    VariableNotDefined(String),
}

/// Whether `text` is an `@identifier` variable reference.
pub(crate) fn is_variable_ref(text: &str) -> bool {
    text.strip_prefix('@')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(is_ident_char))
}

/// Whether `text` is a `$Identifier` schema reference.
pub(crate) fn is_schema_ref(text: &str) -> bool {
    text.strip_prefix('$')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(is_ident_char))
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `@name` to a value. Names keep their `@` sigil.
    pub fn define_variable(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), Definition::Variable(value));
    }

    /// Bind `$Name` to a compiled schema. Names keep their `$` sigil.
    pub fn define_schema(&mut self, name: impl Into<String>, schema: Node<Schema>) {
        self.entries.insert(name.into(), Definition::Schema(schema));
    }

    /// Bind `$Name` to another schema name, to be resolved on use.
    pub fn define_schema_ref(
        &mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        range: PositionRange,
    ) {
        self.entries.insert(
            name.into(),
            Definition::SchemaRef {
                target: target.into(),
                range,
            },
        );
    }

    /// The value of a scalar token, with `@variable` references resolved
    /// through this table. Only open and quoted strings can hold
    /// references; raw strings are always literal.
    pub fn resolve_token(&self, token: &iobj_parser::Token) -> Result<Value, ResolveError> {
        if token.may_hold_variable() {
            if let Some(text) = token.string_value() {
                if is_variable_ref(text) {
                    return self.variable(text).cloned();
                }
            }
        }
        Ok(Value::from_token(token))
    }

    /// Look up a variable by its `@name`.
    pub fn variable(&self, name: &str) -> Result<&Value, ResolveError> {
        match self.entries.get(name) {
            Some(Definition::Variable(value)) => Ok(value),
            _ => Err(ResolveError::VariableNotDefined(name.to_string())),
        }
    }

    /// Look up a schema by its `$Name`, following `$a: $b` chains.
    /// A chain that returns to a name already visited is rejected instead
    /// of recursed into.
    pub fn schema(&self, name: &str) -> Result<&Node<Schema>, ResolveError> {
        let mut visited: Vec<&str> = Vec::new();
        let mut current = name;
        loop {
            if visited.contains(&current) {
                return Err(ResolveError::CyclicSchemaReference(name.to_string()));
            }
            visited.push(current);
            match self.entries.get(current) {
                Some(Definition::Schema(schema)) => return Ok(schema),
                Some(Definition::SchemaRef { target, .. }) => current = target,
                _ => return Err(ResolveError::SchemaNotDefined(current.to_string())),
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Definition)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{Open, Schema};
    use pretty_assertions::assert_eq;

    fn empty_schema(name: &str) -> Node<Schema> {
        Node::new_synthetic(Schema {
            name: name.to_string(),
            path: String::new(),
            names: Vec::new(),
            defs: IndexMap::new(),
            open: Open::Untyped,
        })
    }

    #[test]
    fn variables_resolve_by_sigiled_name() {
        let mut defs = Definitions::new();
        defs.define_variable("@r", Value::String("red".into()));
        assert_eq!(defs.variable("@r").unwrap().as_str(), Some("red"));
        assert_eq!(
            defs.variable("@g"),
            Err(ResolveError::VariableNotDefined("@g".into()))
        );
    }

    #[test]
    fn schema_reference_chains_resolve() {
        let mut defs = Definitions::new();
        defs.define_schema("$a", empty_schema("$a"));
        defs.define_schema_ref("$b", "$a", PositionRange::UNKNOWN);
        defs.define_schema_ref("$c", "$b", PositionRange::UNKNOWN);
        assert_eq!(defs.schema("$c").unwrap().name, "$a");
    }

    #[test]
    fn reference_cycles_are_rejected() {
        let mut defs = Definitions::new();
        defs.define_schema_ref("$a", "$b", PositionRange::UNKNOWN);
        defs.define_schema_ref("$b", "$a", PositionRange::UNKNOWN);
        assert_eq!(
            defs.schema("$a"),
            Err(ResolveError::CyclicSchemaReference("$a".into()))
        );
        // self-cycle
        let mut defs = Definitions::new();
        defs.define_schema_ref("$x", "$x", PositionRange::UNKNOWN);
        assert!(matches!(
            defs.schema("$x"),
            Err(ResolveError::CyclicSchemaReference(_))
        ));
    }

    #[test]
    fn missing_schema_reports_the_broken_link() {
        let mut defs = Definitions::new();
        defs.define_schema_ref("$a", "$gone", PositionRange::UNKNOWN);
        assert_eq!(
            defs.schema("$a"),
            Err(ResolveError::SchemaNotDefined("$gone".into()))
        );
    }
}
