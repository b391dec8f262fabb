use crate::{Position, PositionRange};
use std::fmt;

/// An `Error` accumulated by the lexer or the parser.
///
/// Errors are returned alongside the resulting document: lexing faults are
/// carried in-stream as [`TokenKind::Error`][crate::TokenKind::Error] tokens,
/// syntactic faults become `Error` nodes in the tree, and both end up in
/// [`SyntaxTree::errors`][crate::SyntaxTree::errors]. Check that list before
/// iterating over the document's nodes.
#[derive(PartialEq, Eq, Clone)]
pub struct Error {
    pub(crate) message: String,
    pub(crate) data: String,
    pub(crate) range: PositionRange,
    pub(crate) is_limit: bool,
    pub(crate) collection_index: Option<usize>,
}

impl Error {
    /// Create a new instance of `Error`.
    pub fn new<S: Into<String>>(message: S, data: String, range: PositionRange) -> Self {
        Self {
            message: message.into(),
            data,
            range,
            is_limit: false,
            collection_index: None,
        }
    }

    /// Create an `Error` that reports an exceeded parser limit.
    pub fn limit<S: Into<String>>(message: S, range: PositionRange) -> Self {
        Self {
            message: message.into(),
            data: String::new(),
            range,
            is_limit: true,
            collection_index: None,
        }
    }

    /// Get a reference to the error's message.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    /// Get a reference to the error's data. This is usually the text that
    /// was found to be lexically or syntactically incorrect.
    pub fn data(&self) -> &str {
        self.data.as_ref()
    }

    /// The position where the error begins.
    pub fn position(&self) -> Position {
        self.range.start
    }

    /// The position just past the offending text, when known.
    pub fn end_position(&self) -> Position {
        self.range.end
    }

    pub fn range(&self) -> PositionRange {
        self.range
    }

    /// The byte offset where the error begins in the input.
    pub fn index(&self) -> usize {
        self.range.start.pos
    }

    /// Whether this error is a limit error (recursion or token limit
    /// exceeded) as opposed to a fault in the input itself.
    pub fn is_limit(&self) -> bool {
        self.is_limit
    }

    /// The zero-based index of the collection row this error occurred in,
    /// if it occurred inside a collection. Row indexes reset per section.
    pub fn collection_index(&self) -> Option<usize> {
        self.collection_index
    }

    pub(crate) fn with_collection_index(mut self, index: Option<usize>) -> Self {
        self.collection_index = index;
        self
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ERROR@{}:{} {:?} {}",
            self.range.start.pos, self.range.end.pos, self.message, self.data
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.range.start)
    }
}

impl std::error::Error for Error {}
