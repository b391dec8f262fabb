use crate::lexer::token_kind::{SubKind, TokenKind};
use crate::{Error, Position, PositionRange};
use chrono::{DateTime, FixedOffset};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::fmt;

/// The decoded value of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// Structural symbols and separators carry no decoded value.
    Marker,
    Str(String),
    Number(f64),
    BigInt(BigInt),
    Decimal(Decimal),
    Bool(bool),
    Null,
    DateTime(DateTime<FixedOffset>),
    Bytes(Vec<u8>),
    /// The diagnostic carried by a [`TokenKind::Error`] token.
    Error(Box<Error>),
}

/// A token produced by the [`Lexer`][crate::Lexer].
///
/// Tokens keep the exact literal text they were scanned from, the decoded
/// value, and a [`PositionRange`] whose end is derived by walking the
/// literal's embedded newlines.
#[derive(Clone, PartialEq)]
pub struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) sub: Option<SubKind>,
    pub(crate) value: TokenValue,
    pub(crate) literal: String,
    pub(crate) range: PositionRange,
}

impl Token {
    pub(crate) fn new(
        kind: TokenKind,
        value: TokenValue,
        literal: impl Into<String>,
        start: Position,
    ) -> Self {
        let literal = literal.into();
        let range = PositionRange::of(start, &literal);
        Self {
            kind,
            sub: None,
            value,
            literal,
            range,
        }
    }

    pub(crate) fn with_sub(mut self, sub: SubKind) -> Self {
        self.sub = Some(sub);
        self
    }

    pub(crate) fn error(error: Error, literal: impl Into<String>, start: Position) -> Self {
        Self::new(
            TokenKind::Error,
            TokenValue::Error(Box::new(error)),
            literal,
            start,
        )
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn sub_kind(&self) -> Option<SubKind> {
        self.sub
    }

    pub fn value(&self) -> &TokenValue {
        &self.value
    }

    /// The exact source text this token was scanned from.
    pub fn literal(&self) -> &str {
        self.literal.as_ref()
    }

    pub fn range(&self) -> PositionRange {
        self.range
    }

    pub fn position(&self) -> Position {
        self.range.start
    }

    /// The decoded string value, for string-family tokens.
    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this token is a string whose decoded value may hold an
    /// `@variable` reference: open and quoted strings only, raw strings are
    /// always literal.
    pub fn may_hold_variable(&self) -> bool {
        matches!(self.kind, TokenKind::OpenString | TokenKind::QuotedString)
    }

    pub fn is_section_name(&self) -> bool {
        self.sub == Some(SubKind::SectionName)
    }

    pub fn is_section_schema(&self) -> bool {
        self.sub == Some(SubKind::SectionSchema)
    }

    /// The diagnostic carried by an error token.
    pub fn lex_error(&self) -> Option<&Error> {
        match &self.value {
            TokenValue::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.range.start.pos;
        let end = self.range.end.pos;
        match &self.value {
            TokenValue::Marker => write!(f, "{:?}@{}:{}", self.kind, start, end),
            TokenValue::Error(e) => {
                write!(f, "{:?}@{}:{} {:?}", self.kind, start, end, e.message())
            }
            value => write!(f, "{:?}@{}:{} {:?}", self.kind, start, end, value),
        }
    }
}
