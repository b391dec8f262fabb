pub(crate) mod grammar;

use crate::ast;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::{Error, LimitTracker, PositionRange};

/// How deep nesting may go before the parser refuses to recurse further.
const DEFAULT_RECURSION_LIMIT: usize = 500;

/// Parse Internet Object documents into a typed AST.
///
/// The parser accumulates errors instead of aborting: local syntactic
/// faults become `Error` nodes in the tree and entries in
/// [`SyntaxTree::errors`], and parsing resumes at the next safe boundary
/// (the next member for objects, the next `~` row marker for collections,
/// the next `---` for sections).
///
/// ## Example
/// ```rust
/// use iobj_parser::Parser;
///
/// let input = "
/// ~ John, john@x, 25
/// ~ Jane, jane@x, 30
/// ";
/// let tree = Parser::new(input).parse();
/// assert!(tree.errors().is_empty());
/// let doc = tree.document();
/// assert_eq!(doc.sections.len(), 1);
/// ```
#[derive(Debug)]
pub struct Parser<'input> {
    input: &'input str,
    recursion_limit: usize,
    token_limit: usize,
    tokens: Vec<Token>,
    index: usize,
    errors: Vec<Error>,
    recursion: LimitTracker,
    row_context: Option<usize>,
}

impl<'input> Parser<'input> {
    /// Create a new instance of a parser given an input string.
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            token_limit: usize::MAX,
            tokens: Vec::new(),
            index: 0,
            errors: Vec::new(),
            recursion: LimitTracker::new(DEFAULT_RECURSION_LIMIT),
            row_context: None,
        }
    }

    /// Configure the recursion limit to use while parsing.
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Configure the limit on the number of tokens to parse. If an input
    /// document is too big, lexing is aborted with a limit error.
    ///
    /// By default, there is no limit.
    pub fn token_limit(mut self, limit: usize) -> Self {
        self.token_limit = limit;
        self
    }

    /// Parse the input.
    pub fn parse(mut self) -> SyntaxTree {
        self.tokens = Lexer::with_limit(self.input, self.token_limit).into_tokens();
        self.recursion = LimitTracker::new(self.recursion_limit);

        let document = grammar::document::document(&mut self);

        let mut errors = self.errors;
        errors.sort_by_key(|e| e.position());
        SyntaxTree {
            document,
            errors,
            recursion: self.recursion,
        }
    }

    // ---- token access for the grammar modules ----

    /// The next meaningful token, skipping comment trivia.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens[self.index..]
            .iter()
            .find(|t| t.kind() != TokenKind::Comment)
    }

    pub(crate) fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind())
    }

    /// The kind of the `n`-th meaningful token after the next one.
    pub(crate) fn nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens[self.index..]
            .iter()
            .filter(|t| t.kind() != TokenKind::Comment)
            .nth(n)
            .map(|t| t.kind())
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.peek().is_none()
    }

    /// Consume the next meaningful token. Lexer error tokens are recorded
    /// into the error list exactly here, so skipped regions still report.
    pub(crate) fn bump(&mut self) -> Option<Token> {
        while self.index < self.tokens.len() {
            let token = self.tokens[self.index].clone();
            self.index += 1;
            if token.kind() == TokenKind::Comment {
                continue;
            }
            if let Some(error) = token.lex_error() {
                let error = error.clone().with_collection_index(self.row_context);
                self.errors.push(error);
            }
            return Some(token);
        }
        None
    }

    // ---- error accumulation ----

    /// Record a syntax error at the next token (or at end of input).
    pub(crate) fn err(
        &mut self,
        message: impl Into<String>,
        data: impl Into<String>,
    ) -> Error {
        let range = match self.peek() {
            Some(token) => token.range(),
            None => {
                let end = self
                    .tokens
                    .last()
                    .map(|t| t.range().end)
                    .unwrap_or(crate::Position::START);
                PositionRange::new(end, end)
            }
        };
        self.err_at(range, message, data)
    }

    pub(crate) fn err_at(
        &mut self,
        range: PositionRange,
        message: impl Into<String>,
        data: impl Into<String>,
    ) -> Error {
        let error = Error::new(message, data.into(), range)
            .with_collection_index(self.row_context);
        self.errors.push(error.clone());
        error
    }

    // ---- recovery ----

    pub(crate) fn set_row_context(&mut self, index: Option<usize>) {
        self.row_context = index;
    }

    /// Skip forward to the next `~` row marker, `---`, or end of input.
    pub(crate) fn skip_to_row_boundary(&mut self) {
        while !matches!(
            self.peek_kind(),
            None | Some(TokenKind::Tilde) | Some(TokenKind::SectionSep)
        ) {
            self.bump();
        }
    }

    /// Consume a bracketed region without building nodes, balancing
    /// `open`/`close` pairs. Used once the recursion limit is hit.
    pub(crate) fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) {
        let mut depth = 1usize;
        while let Some(kind) = self.peek_kind() {
            self.bump();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Enter one level of nesting; reports and returns `false` once the
    /// recursion limit is exceeded.
    pub(crate) fn recursion_enter(&mut self) -> bool {
        self.recursion.consume();
        if self.recursion.limited() {
            let range = self
                .peek()
                .map(|t| t.range())
                .unwrap_or(PositionRange::UNKNOWN);
            let error = Error::limit("parser recursion limit reached", range);
            self.errors.push(error);
            self.recursion.release();
            false
        } else {
            true
        }
    }

    pub(crate) fn recursion_exit(&mut self) {
        self.recursion.release();
    }
}

/// The result of parsing: the document plus everything that went wrong.
#[derive(Debug)]
pub struct SyntaxTree {
    document: ast::Document,
    errors: Vec<Error>,
    recursion: LimitTracker,
}

impl SyntaxTree {
    /// Get the document root.
    pub fn document(&self) -> &ast::Document {
        &self.document
    }

    /// All accumulated lexing and parsing errors, in source order.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Recursion-limit utilization over the parse.
    pub fn recursion_limit(&self) -> LimitTracker {
        self.recursion
    }

    pub fn into_parts(self) -> (ast::Document, Vec<Error>) {
        (self.document, self.errors)
    }
}
