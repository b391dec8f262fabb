#![doc = include_str!("../README.md")]

pub mod ast;
mod error;
mod lexer;
mod limit;
mod parser;
mod position;

pub use crate::error::Error;
pub use crate::lexer::normalize_newlines;
pub use crate::lexer::{
    DateTimeVariant, Lexer, NumberBase, StringStyle, SubKind, Token, TokenKind, TokenValue,
};
pub use crate::limit::LimitTracker;
pub use crate::parser::{Parser, SyntaxTree};
pub use crate::position::{Position, PositionRange};
