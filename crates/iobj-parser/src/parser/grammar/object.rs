use crate::ast;
use crate::parser::grammar::member;
use crate::{Parser, TokenKind};

/// *Object*:
///     "{" Members "}" | OpenObject
///
/// *Members*:
///     (Member ("," Member)*)?
///
/// Comma separators create slots: nothing between two separators (or
/// between a separator and the closing brace) is an undefined slot, so
/// `{,,,}` holds four of them.
pub(crate) fn braced_object(p: &mut Parser) -> ast::Object {
    let mut object = ast::Object {
        open_brace: p.bump(),
        ..Default::default()
    };
    if !p.recursion_enter() {
        p.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
        return object;
    }

    if p.at(TokenKind::RBrace) {
        object.close_brace = p.bump();
    } else {
        member_list(p, &mut object, true);
    }
    p.recursion_exit();
    object
}

/// The bracketless object at the top of a section, consuming members until
/// a section boundary.
pub(crate) fn open_object(p: &mut Parser) -> ast::Object {
    let mut object = ast::Object::default();
    if !at_section_boundary(p) {
        member_list(p, &mut object, false);
    }
    object
}

fn member_list(p: &mut Parser, object: &mut ast::Object, braced: bool) {
    'members: loop {
        // slot position
        let slot = loop {
            match p.peek_kind() {
                Some(TokenKind::Comma) => break None,
                Some(TokenKind::RBrace) if braced => {
                    // only reachable after junk recovery
                    object.close_brace = p.bump();
                    break 'members;
                }
                None | Some(TokenKind::SectionSep) | Some(TokenKind::Tilde) => {
                    if braced {
                        p.err("expected `}` to close the object", "}");
                    }
                    break 'members;
                }
                Some(kind) if can_start_member(kind) => break Some(member::member(p)),
                Some(kind) => {
                    let literal = peek_literal(p);
                    p.err(format!("unexpected {kind}"), literal);
                    p.bump();
                }
            }
        };
        object.members.push(slot);

        // separator position
        loop {
            match p.peek_kind() {
                Some(TokenKind::Comma) => {
                    p.bump();
                    let at_end = if braced {
                        p.at(TokenKind::RBrace)
                    } else {
                        at_section_boundary(p)
                    };
                    if at_end {
                        // trailing comma: one more undefined slot
                        object.members.push(None);
                        if braced {
                            object.close_brace = p.bump();
                        }
                        break 'members;
                    }
                    continue 'members;
                }
                Some(TokenKind::RBrace) if braced => {
                    object.close_brace = p.bump();
                    break 'members;
                }
                None | Some(TokenKind::SectionSep) | Some(TokenKind::Tilde) => {
                    if braced {
                        p.err("expected `}` to close the object", "}");
                    }
                    break 'members;
                }
                Some(kind) => {
                    let literal = peek_literal(p);
                    p.err(format!("expected `,`, found {kind}"), literal);
                    p.bump();
                }
            }
        }
    }
}

pub(crate) fn can_start_member(kind: TokenKind) -> bool {
    kind.is_scalar()
        || matches!(
            kind,
            TokenKind::LBrace | TokenKind::LBracket | TokenKind::Error
        )
}

pub(crate) fn at_section_boundary(p: &Parser) -> bool {
    matches!(
        p.peek_kind(),
        None | Some(TokenKind::SectionSep) | Some(TokenKind::Tilde)
    )
}

fn peek_literal(p: &Parser) -> String {
    p.peek().map(|t| t.literal().to_string()).unwrap_or_default()
}
