//! Typed AST for parsed documents.
//!
//! Nodes are a tagged sum; consumers pattern-match on the variant. Every
//! node exposes a [`PositionRange`]: bracket tokens bound it when present,
//! otherwise it is derived from the first and last child, otherwise it is
//! [`PositionRange::UNKNOWN`].

use crate::{Error, Position, PositionRange, Token};

/// A parsed document: an optional header section plus data sections in
/// source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub header: Option<Section>,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn range(&self) -> PositionRange {
        let header = self.header.iter().map(|s| s.range());
        let sections = self.sections.iter().map(|s| s.range());
        fold_ranges(header.chain(sections))
    }
}

/// A document region started by `---` (or the top of the input).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    /// The section-name token from the `---` line, if any.
    pub name: Option<Token>,
    /// The `$Schema` reference token from the `---` line, if any.
    pub schema: Option<Token>,
    /// The section's name after duplicate auto-renaming (`users`,
    /// `users_2`, …). `None` for unnamed sections.
    pub unique_name: Option<String>,
    pub body: Option<SectionBody>,
}

impl Section {
    pub fn name_text(&self) -> Option<&str> {
        self.name.as_ref().and_then(|t| t.string_value())
    }

    pub fn schema_text(&self) -> Option<&str> {
        self.schema.as_ref().and_then(|t| t.string_value())
    }

    pub fn range(&self) -> PositionRange {
        let parts = self
            .name
            .iter()
            .chain(self.schema.iter())
            .map(|t| t.range())
            .chain(self.body.iter().map(|b| b.range()));
        fold_ranges(parts)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Object(Object),
    Collection(Collection),
}

impl SectionBody {
    pub fn range(&self) -> PositionRange {
        match self {
            SectionBody::Object(o) => o.range(),
            SectionBody::Collection(c) => c.range(),
        }
    }
}

/// An object: an ordered list of member slots. A slot is `None` when the
/// source held nothing between two separators (`{a,,b}`).
///
/// Brace tokens are absent for open objects (the bracketless form at the
/// top of a section).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    pub members: Vec<Option<Member>>,
    pub open_brace: Option<Token>,
    pub close_brace: Option<Token>,
}

impl Object {
    pub fn is_open(&self) -> bool {
        self.open_brace.is_none()
    }

    /// The defined members, skipping undefined slots.
    pub fn defined_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().flatten()
    }

    pub fn range(&self) -> PositionRange {
        let braces = self
            .open_brace
            .iter()
            .chain(self.close_brace.iter())
            .map(|t| t.range());
        let members = self.defined_members().map(|m| m.range());
        fold_ranges(braces.chain(members))
    }
}

/// A single `key: value` or positional entry of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// The key token; `None` makes the member positional.
    pub key: Option<Token>,
    /// The member's value; `None` when the value position was empty
    /// (`{a:, b}`).
    pub value: Option<Node>,
}

impl Member {
    pub fn key_text(&self) -> Option<&str> {
        self.key.as_ref().and_then(|t| t.string_value())
    }

    pub fn range(&self) -> PositionRange {
        let key = self.key.iter().map(|t| t.range());
        let value = self.value.iter().map(|v| v.range());
        fold_ranges(key.chain(value))
    }
}

/// A bracketed array of values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    pub elements: Vec<Node>,
    pub open_bracket: Option<Token>,
    pub close_bracket: Option<Token>,
}

impl Array {
    pub fn range(&self) -> PositionRange {
        let brackets = self
            .open_bracket
            .iter()
            .chain(self.close_bracket.iter())
            .map(|t| t.range());
        fold_ranges(brackets.chain(self.elements.iter().map(|e| e.range())))
    }
}

/// A section body made of `~`-marked rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    pub rows: Vec<Row>,
}

impl Collection {
    pub fn range(&self) -> PositionRange {
        fold_ranges(self.rows.iter().map(|r| r.range()))
    }
}

/// One collection row. Every non-empty row is an anonymous object; an empty
/// row (`~` with nothing after it) collapses to [`Row::Empty`]; a row the
/// parser gave up on is [`Row::Error`].
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Object(Object),
    Error(ErrorNode),
    Empty(Position),
}

impl Row {
    pub fn range(&self) -> PositionRange {
        match self {
            Row::Object(o) => o.range(),
            Row::Error(e) => e.range(),
            Row::Empty(at) => PositionRange::new(*at, *at),
        }
    }
}

/// A value node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Object(Object),
    Array(Array),
    /// A single token standing as a value.
    Leaf(Token),
    /// A placeholder for a region the parser could not make sense of, so
    /// traversal and error ordering stay well defined.
    Error(ErrorNode),
}

impl Node {
    pub fn range(&self) -> PositionRange {
        match self {
            Node::Object(o) => o.range(),
            Node::Array(a) => a.range(),
            Node::Leaf(t) => t.range(),
            Node::Error(e) => e.range(),
        }
    }

    pub fn as_leaf(&self) -> Option<&Token> {
        match self {
            Node::Leaf(t) => Some(t),
            _ => None,
        }
    }
}

/// The AST face of an accumulated [`Error`].
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNode {
    pub error: Error,
}

impl ErrorNode {
    pub fn range(&self) -> PositionRange {
        self.error.range()
    }
}

fn fold_ranges(ranges: impl Iterator<Item = PositionRange>) -> PositionRange {
    ranges.fold(PositionRange::UNKNOWN, PositionRange::join)
}
