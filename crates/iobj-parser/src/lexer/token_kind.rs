use std::fmt;

/// The kind of a [`Token`][crate::Token].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// An unquoted string, bounded by structural symbols or end of line.
    OpenString,
    /// A `"`-delimited, escape-processed string.
    QuotedString,
    /// A `'`-delimited string with no escapes (`''` encodes one `'`).
    RawString,
    /// A `b"…"` annotated string whose body is base-64 decoded.
    BinaryString,
    /// A `d"…"`, `t"…"` or `dt"…"` annotated string.
    DateTime,
    /// A numeric literal that fits a float.
    Number,
    /// A numeric literal with the `n` big-integer suffix.
    BigInt,
    /// A numeric literal with the `m` fixed-decimal suffix.
    Decimal,
    /// `T`, `true`, `F` or `false`.
    Boolean,
    /// `N` or `null`.
    Null,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `~`
    Tilde,
    /// `---` at the start of a line.
    SectionSep,
    /// A `#` comment, running to end of line.
    Comment,
    /// A lexing fault, carried in-stream so positions stay well formed.
    Error,
    Unknown,
}

impl TokenKind {
    /// Whether this token can stand alone as a value.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TokenKind::OpenString
                | TokenKind::QuotedString
                | TokenKind::RawString
                | TokenKind::BinaryString
                | TokenKind::DateTime
                | TokenKind::Number
                | TokenKind::BigInt
                | TokenKind::Decimal
                | TokenKind::Boolean
                | TokenKind::Null
        )
    }

    /// Whether this token is a single structural symbol.
    pub fn is_symbol(self) -> bool {
        matches!(
            self,
            TokenKind::Colon
                | TokenKind::Comma
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::Tilde
        )
    }

    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::OpenString => "open string",
            TokenKind::QuotedString => "string",
            TokenKind::RawString => "raw string",
            TokenKind::BinaryString => "binary string",
            TokenKind::DateTime => "date-time",
            TokenKind::Number => "number",
            TokenKind::BigInt => "big integer",
            TokenKind::Decimal => "decimal",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Tilde => "`~`",
            TokenKind::SectionSep => "`---`",
            TokenKind::Comment => "comment",
            TokenKind::Error => "error",
            TokenKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// The numeric base of a [`TokenKind::Number`]-family literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberBase {
    Decimal,
    Scientific,
    Hex,
    Octal,
    Binary,
}

/// Which reduction a date-time literal used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeVariant {
    Date,
    Time,
    DateTime,
}

/// How a string literal was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringStyle {
    Regular,
    Raw,
    Open,
}

/// Extra classification attached to some tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubKind {
    Number(NumberBase),
    DateTime(DateTimeVariant),
    String(StringStyle),
    /// The `<name>` of a `--- <name>` section header line.
    SectionName,
    /// The `$Schema` of a `--- <name>: $Schema` section header line.
    SectionSchema,
}
