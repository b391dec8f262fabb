use crate::ast;
use crate::parser::grammar::member;
use crate::parser::grammar::object::{at_section_boundary, can_start_member};
use crate::{Parser, TokenKind};

/// *Collection*:
///     CollectionRow+
///
/// *CollectionRow*:
///     "~" Members?
///
/// Every non-empty row becomes an anonymous object; a bare `~` collapses to
/// an undefined slot. On a fault inside a row the rest of the row is
/// discarded, an `Error` node takes its place, and parsing resumes at the
/// next row marker or section separator. Row indexes are zero-based and
/// reset with each collection.
pub(crate) fn collection(p: &mut Parser) -> ast::Collection {
    let mut rows = Vec::new();
    while p.at(TokenKind::Tilde) {
        let marker = p.bump().unwrap();
        p.set_row_context(Some(rows.len()));
        if at_section_boundary(p) {
            rows.push(ast::Row::Empty(marker.position()));
        } else {
            rows.push(row(p));
        }
    }
    p.set_row_context(None);
    ast::Collection { rows }
}

fn row(p: &mut Parser) -> ast::Row {
    let mut object = ast::Object::default();
    loop {
        // slot position
        let slot = match p.peek_kind() {
            Some(TokenKind::Comma) => None,
            None | Some(TokenKind::SectionSep) | Some(TokenKind::Tilde) => break,
            Some(kind) if can_start_member(kind) => Some(member::member(p)),
            Some(kind) => {
                let literal = p.peek().map(|t| t.literal().to_string()).unwrap_or_default();
                let error = p.err(format!("unexpected {kind} in collection row"), literal);
                p.skip_to_row_boundary();
                return ast::Row::Error(ast::ErrorNode { error });
            }
        };
        object.members.push(slot);

        // separator position
        match p.peek_kind() {
            Some(TokenKind::Comma) => {
                p.bump();
                if at_section_boundary(p) {
                    object.members.push(None);
                    break;
                }
            }
            None | Some(TokenKind::SectionSep) | Some(TokenKind::Tilde) => break,
            Some(kind) => {
                let literal = p.peek().map(|t| t.literal().to_string()).unwrap_or_default();
                let error = p.err(format!("expected `,`, found {kind}"), literal);
                p.skip_to_row_boundary();
                return ast::Row::Error(ast::ErrorNode { error });
            }
        }
    }
    ast::Row::Object(object)
}
