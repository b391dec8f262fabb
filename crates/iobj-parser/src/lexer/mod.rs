mod cursor;
mod datetime;
mod number;
mod token;
mod token_kind;

pub use token::{Token, TokenValue};
pub use token_kind::{DateTimeVariant, NumberBase, StringStyle, SubKind, TokenKind};

use crate::{Error, Position, PositionRange};
use base64::Engine;
use cursor::Cursor;
use std::borrow::Cow;

/// Single-pass lexer for the Internet Object text format.
///
/// The lexer never fails: every scanning fault is emitted as an in-stream
/// [`TokenKind::Error`] token with a position range, and scanning resumes at
/// the next safe boundary. Carriage returns are normalized away before
/// scanning (`\r\n` collapses to `\n`, a lone `\r` becomes `\n`), so byte
/// offsets refer to the normalized text.
pub struct Lexer {
    tokens: Vec<Token>,
}

impl Lexer {
    /// Scan `input` into a token list.
    pub fn new(input: &str) -> Self {
        Self::with_limit(input, usize::MAX)
    }

    /// Scan `input`, aborting with a limit error token once `token_limit`
    /// tokens have been produced.
    pub fn with_limit(input: &str, token_limit: usize) -> Self {
        let normalized = normalize_newlines(input);
        let mut scanner = Scanner {
            c: Cursor::new(&normalized),
            tokens: Vec::new(),
            token_limit,
        };
        scanner.run();
        Self {
            tokens: scanner.tokens,
        }
    }

    /// Get a reference to the lexer's tokens.
    pub fn tokens(&self) -> &[Token] {
        self.tokens.as_slice()
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

/// Collapse `\r\n` to `\n` and turn lone `\r` into `\n`.
pub fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if !input.contains('\r') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

enum Annotation {
    Raw,
    Bytes,
    Date,
    Time,
    DateTime,
}

struct Scanner<'a> {
    c: Cursor<'a>,
    tokens: Vec<Token>,
    token_limit: usize,
}

impl Scanner<'_> {
    fn run(&mut self) {
        loop {
            self.skip_whitespace();
            if self.c.is_eof() {
                break;
            }
            if self.tokens.len() >= self.token_limit {
                let at = self.c.position();
                self.tokens.push(Token::error(
                    Error::limit("token limit reached", PositionRange::new(at, at)),
                    "",
                    at,
                ));
                break;
            }

            let start = self.c.position();
            match self.c.peek().unwrap() {
                '#' => self.comment(start),
                '-' if start.col == 1 && self.c.rest_starts_with("---") => {
                    self.section_separator(start)
                }
                '"' => self.quoted_string(start),
                '\'' => self.raw_string(start),
                '{' => self.symbol(start, TokenKind::LBrace),
                '}' => self.symbol(start, TokenKind::RBrace),
                '[' => self.symbol(start, TokenKind::LBracket),
                ']' => self.symbol(start, TokenKind::RBracket),
                ':' => self.symbol(start, TokenKind::Colon),
                ',' => self.symbol(start, TokenKind::Comma),
                '~' => self.symbol(start, TokenKind::Tilde),
                _ => self.open_or_annotated(start),
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.c.peek().is_some_and(is_whitespace) {
            self.c.bump();
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while self.c.peek().is_some_and(|c| is_whitespace(c) && c != '\n') {
            self.c.bump();
        }
    }

    fn symbol(&mut self, start: Position, kind: TokenKind) {
        let from = self.c.offset();
        self.c.bump();
        self.tokens.push(Token::new(
            kind,
            TokenValue::Marker,
            self.c.slice_from(from),
            start,
        ));
    }

    fn comment(&mut self, start: Position) {
        let from = self.c.offset();
        self.c.bump(); // '#'
        while self.c.peek().is_some_and(|c| c != '\n') {
            self.c.bump();
        }
        let literal = self.c.slice_from(from);
        let value = trim_ws(&literal[1..]).to_string();
        self.tokens
            .push(Token::new(TokenKind::Comment, TokenValue::Str(value), literal, start));
    }

    /// `---` at column one, optionally followed on the same line by a
    /// section name and a `: $Schema` reference.
    fn section_separator(&mut self, start: Position) {
        let from = self.c.offset();
        while self.c.eat('-') {}
        self.tokens.push(Token::new(
            TokenKind::SectionSep,
            TokenValue::Marker,
            self.c.slice_from(from),
            start,
        ));

        self.skip_inline_whitespace();
        match self.c.peek() {
            None | Some('\n') | Some('#') => return,
            Some(':') => {}
            Some(_) => {
                let name_start = self.c.position();
                let from = self.c.offset();
                let mut last_solid = from;
                while self
                    .c
                    .peek()
                    .is_some_and(|c| !matches!(c, ':' | '\n' | '#'))
                {
                    let solid = !is_whitespace(self.c.peek().unwrap());
                    self.c.bump();
                    if solid {
                        last_solid = self.c.offset();
                    }
                }
                let literal = self.c.slice(from, last_solid);
                if !literal.is_empty() {
                    self.tokens.push(
                        Token::new(
                            TokenKind::OpenString,
                            TokenValue::Str(literal.to_string()),
                            literal,
                            name_start,
                        )
                        .with_sub(SubKind::SectionName),
                    );
                }
            }
        }

        if self.c.peek() == Some(':') {
            let colon_at = self.c.position();
            self.c.bump();
            self.skip_inline_whitespace();
            let schema_start = self.c.position();
            let from = self.c.offset();
            let mut last_solid = from;
            while self
                .c
                .peek()
                .is_some_and(|c| !matches!(c, '\n' | '#' | ','))
            {
                let solid = !is_whitespace(self.c.peek().unwrap());
                self.c.bump();
                if solid {
                    last_solid = self.c.offset();
                }
            }
            let literal = self.c.slice(from, last_solid);
            if literal.is_empty() {
                self.tokens.push(Token::error(
                    Error::new(
                        "schema missing after `:` on section header line",
                        ":".to_string(),
                        PositionRange::of(colon_at, ":"),
                    ),
                    ":",
                    colon_at,
                ));
            } else {
                self.tokens.push(
                    Token::new(
                        TokenKind::OpenString,
                        TokenValue::Str(literal.to_string()),
                        literal,
                        schema_start,
                    )
                    .with_sub(SubKind::SectionSchema),
                );
            }
        }
    }

    fn quoted_string(&mut self, start: Position) {
        let from = self.c.offset();
        let (text, terminated) = self.string_body('"', true);
        let literal = self.c.slice_from(from);
        if !terminated {
            self.tokens.push(Token::error(
                Error::new(
                    "string not closed",
                    literal.to_string(),
                    PositionRange::of(start, literal),
                ),
                literal,
                start,
            ));
            return;
        }
        self.tokens.push(
            Token::new(TokenKind::QuotedString, TokenValue::Str(text), literal, start)
                .with_sub(SubKind::String(StringStyle::Regular)),
        );
    }

    fn raw_string(&mut self, start: Position) {
        let from = self.c.offset();
        // unterminated raw strings are tolerated: content runs to the end
        let (text, _) = self.string_body('\'', false);
        let literal = self.c.slice_from(from);
        self.tokens.push(
            Token::new(TokenKind::RawString, TokenValue::Str(text), literal, start)
                .with_sub(SubKind::String(StringStyle::Raw)),
        );
    }

    /// Scan a delimited string body, assuming the cursor sits on the opening
    /// delimiter. With `escapes`, backslash sequences are processed; without,
    /// a doubled delimiter encodes one literal delimiter.
    fn string_body(&mut self, delim: char, escapes: bool) -> (String, bool) {
        let mut buf = String::new();
        self.c.bump(); // opening delimiter
        loop {
            match self.c.peek() {
                None => return (buf, false),
                Some(c) if c == delim => {
                    self.c.bump();
                    if !escapes && self.c.peek() == Some(delim) {
                        self.c.bump();
                        buf.push(delim);
                        continue;
                    }
                    return (buf, true);
                }
                Some('\\') if escapes => {
                    self.c.bump();
                    match self.c.bump() {
                        None => return (buf, false),
                        Some('b') => buf.push('\u{0008}'),
                        Some('f') => buf.push('\u{000C}'),
                        Some('n') => buf.push('\n'),
                        Some('r') => buf.push('\r'),
                        Some('t') => buf.push('\t'),
                        // `\\`, `\/`, `\"` and any unrecognized escape all
                        // decode to the escaped character itself
                        Some(other) => buf.push(other),
                    }
                }
                Some(c) => {
                    self.c.bump();
                    buf.push(c);
                }
            }
        }
    }

    fn open_or_annotated(&mut self, start: Position) {
        if let Some((annotation, prefix_len)) = self.annotation_lookahead() {
            self.annotated_string(start, annotation, prefix_len);
        } else {
            self.open_string(start);
        }
    }

    /// An annotated string is a run of letters immediately followed by a
    /// quote; the check applies only at token start.
    fn annotation_lookahead(&self) -> Option<(Result<Annotation, String>, usize)> {
        let rest = self.c.rest();
        let prefix_len = rest
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .count();
        if prefix_len == 0 {
            return None;
        }
        if !matches!(rest[prefix_len..].chars().next(), Some('"' | '\'')) {
            return None;
        }
        let annotation = match &rest[..prefix_len] {
            "r" => Ok(Annotation::Raw),
            "b" => Ok(Annotation::Bytes),
            "d" => Ok(Annotation::Date),
            "t" => Ok(Annotation::Time),
            "dt" => Ok(Annotation::DateTime),
            other => Err(other.to_string()),
        };
        Some((annotation, prefix_len))
    }

    fn annotated_string(
        &mut self,
        start: Position,
        annotation: Result<Annotation, String>,
        prefix_len: usize,
    ) {
        let from = self.c.offset();
        for _ in 0..prefix_len {
            self.c.bump();
        }
        let delim = self.c.peek().unwrap();
        let escapes = delim == '"' && !matches!(annotation, Ok(Annotation::Raw));
        let (body, terminated) = self.string_body(delim, escapes);
        let literal = self.c.slice_from(from);

        if !terminated && delim == '"' {
            self.tokens.push(Token::error(
                Error::new(
                    "string not closed",
                    literal.to_string(),
                    PositionRange::of(start, literal),
                ),
                literal,
                start,
            ));
            return;
        }

        let token = match annotation {
            Err(prefix) => Token::error(
                Error::new(
                    format!("unsupported annotation `{prefix}`"),
                    prefix,
                    PositionRange::of(start, literal),
                ),
                literal,
                start,
            ),
            Ok(Annotation::Raw) => {
                Token::new(TokenKind::RawString, TokenValue::Str(body), literal, start)
                    .with_sub(SubKind::String(StringStyle::Raw))
            }
            Ok(Annotation::Bytes) => {
                match base64::engine::general_purpose::STANDARD.decode(trim_ws(&body)) {
                    Ok(bytes) => Token::new(
                        TokenKind::BinaryString,
                        TokenValue::Bytes(bytes),
                        literal,
                        start,
                    ),
                    Err(_) => Token::error(
                        Error::new(
                            "invalid base64 data",
                            body,
                            PositionRange::of(start, literal),
                        ),
                        literal,
                        start,
                    ),
                }
            }
            Ok(Annotation::Date) => date_time_token(
                datetime::parse_date(trim_ws(&body)),
                DateTimeVariant::Date,
                literal,
                start,
            ),
            Ok(Annotation::Time) => date_time_token(
                datetime::parse_time(trim_ws(&body)),
                DateTimeVariant::Time,
                literal,
                start,
            ),
            Ok(Annotation::DateTime) => date_time_token(
                datetime::parse_date_time(trim_ws(&body)),
                DateTimeVariant::DateTime,
                literal,
                start,
            ),
        };
        self.tokens.push(token);
    }

    fn open_string(&mut self, start: Position) {
        let from = self.c.offset();
        let mut last_solid = from;
        while let Some(c) = self.c.peek() {
            if is_open_terminator(c) {
                break;
            }
            let solid = !is_whitespace(c);
            self.c.bump();
            if solid {
                last_solid = self.c.offset();
            }
        }
        let literal = self.c.slice(from, last_solid);
        self.tokens.push(classify_open(literal, start));
    }
}

fn date_time_token(
    parsed: Result<chrono::DateTime<chrono::FixedOffset>, String>,
    variant: DateTimeVariant,
    literal: &str,
    start: Position,
) -> Token {
    match parsed {
        Ok(value) => Token::new(
            TokenKind::DateTime,
            TokenValue::DateTime(value),
            literal,
            start,
        )
        .with_sub(SubKind::DateTime(variant)),
        Err(message) => Token::error(
            Error::new(
                message,
                literal.to_string(),
                PositionRange::of(start, literal),
            ),
            literal,
            start,
        ),
    }
}

/// Decide what an open-string run actually is: a literal marker, a numeric
/// literal, or a plain open string.
fn classify_open(literal: &str, start: Position) -> Token {
    match literal {
        "T" | "true" => {
            return Token::new(TokenKind::Boolean, TokenValue::Bool(true), literal, start)
        }
        "F" | "false" => {
            return Token::new(TokenKind::Boolean, TokenValue::Bool(false), literal, start)
        }
        "N" | "null" => return Token::new(TokenKind::Null, TokenValue::Null, literal, start),
        "Inf" | "+Inf" => {
            return Token::new(
                TokenKind::Number,
                TokenValue::Number(f64::INFINITY),
                literal,
                start,
            )
        }
        "-Inf" => {
            return Token::new(
                TokenKind::Number,
                TokenValue::Number(f64::NEG_INFINITY),
                literal,
                start,
            )
        }
        "NaN" => {
            return Token::new(TokenKind::Number, TokenValue::Number(f64::NAN), literal, start)
        }
        _ => {}
    }

    if let Some((value, base)) = number::scan_number(literal) {
        let kind = match value {
            TokenValue::BigInt(_) => TokenKind::BigInt,
            TokenValue::Decimal(_) => TokenKind::Decimal,
            _ => TokenKind::Number,
        };
        return Token::new(kind, value, literal, start).with_sub(SubKind::Number(base));
    }

    Token::new(
        TokenKind::OpenString,
        TokenValue::Str(literal.to_string()),
        literal,
        start,
    )
    .with_sub(SubKind::String(StringStyle::Open))
}

/// Whitespace per the wire grammar: anything at or below U+0020 plus the
/// Unicode space separators and the BOM.
pub(crate) fn is_whitespace(c: char) -> bool {
    c <= '\u{0020}'
        || matches!(
            c,
            '\u{00A0}'
                | '\u{1680}'
                | '\u{2000}'..='\u{200A}'
                | '\u{2028}'
                | '\u{2029}'
                | '\u{202F}'
                | '\u{205F}'
                | '\u{3000}'
                | '\u{FEFF}'
        )
}

/// Characters that end an open string without being part of it.
fn is_open_terminator(c: char) -> bool {
    matches!(
        c,
        '{' | '}' | '[' | ']' | ':' | ',' | '~' | '#' | '"' | '\'' | '\n'
    )
}

pub(crate) fn trim_ws(s: &str) -> &str {
    s.trim_matches(is_whitespace)
}
