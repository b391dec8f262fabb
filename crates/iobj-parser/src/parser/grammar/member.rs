use crate::ast;
use crate::parser::grammar::{array, object};
use crate::{Parser, TokenKind};

/// *Member*:
///     (Key ":")? Value
///
/// *Key*:
///     open-string | quoted-string | number | boolean | null
pub(crate) fn member(p: &mut Parser) -> ast::Member {
    let key = if is_key_kind(p.peek_kind()) && p.nth_kind(1) == Some(TokenKind::Colon) {
        let key = p.bump();
        p.bump(); // ':'
        key
    } else {
        None
    };
    ast::Member {
        key,
        value: value(p),
    }
}

fn is_key_kind(kind: Option<TokenKind>) -> bool {
    matches!(
        kind,
        Some(
            TokenKind::OpenString
                | TokenKind::QuotedString
                | TokenKind::Number
                | TokenKind::Boolean
                | TokenKind::Null
        )
    )
}

/// *Value*:
///     Object | Array | scalar | <undefined>
///
/// Returns `None` when the value position is empty between separators; the
/// caller decides whether that is allowed where it stands.
pub(crate) fn value(p: &mut Parser) -> Option<ast::Node> {
    match p.peek_kind() {
        Some(TokenKind::LBrace) => Some(ast::Node::Object(object::braced_object(p))),
        Some(TokenKind::LBracket) => Some(ast::Node::Array(array::array(p))),
        Some(TokenKind::Error) => {
            let token = p.bump().unwrap();
            let error = token.lex_error().cloned().unwrap();
            Some(ast::Node::Error(ast::ErrorNode { error }))
        }
        Some(kind) if kind.is_scalar() => Some(ast::Node::Leaf(p.bump().unwrap())),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use crate::{ast, Parser, TokenKind, TokenValue};
    use pretty_assertions::assert_eq;

    fn members_of(input: &str) -> Vec<Option<ast::Member>> {
        let tree = Parser::new(input).parse();
        match tree.document().sections[0].body.clone() {
            Some(ast::SectionBody::Object(object)) => object.members,
            other => panic!("expected an object body, got {other:?}"),
        }
    }

    #[test]
    fn scalar_keys() {
        let members = members_of("{\"quoted key\": 1, 42: two, true: 3, null: 4}");
        let keys: Vec<_> = members
            .iter()
            .map(|m| m.as_ref().unwrap().key_text().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["quoted key", "42", "true", "null"]);
    }

    #[test]
    fn keyless_members_are_positional() {
        let members = members_of("{John, 25}");
        assert!(members.iter().all(|m| m.as_ref().unwrap().key.is_none()));
    }

    #[test]
    fn values_may_be_any_node() {
        let members = members_of("{a: {b: 1}, c: [2], d: 'raw', e: N}");
        let kinds: Vec<_> = members
            .iter()
            .map(|m| match m.as_ref().unwrap().value.as_ref().unwrap() {
                ast::Node::Object(_) => "object",
                ast::Node::Array(_) => "array",
                ast::Node::Leaf(t) if t.kind() == TokenKind::Null => "null",
                ast::Node::Leaf(_) => "leaf",
                ast::Node::Error(_) => "error",
            })
            .collect();
        assert_eq!(kinds, vec!["object", "array", "leaf", "null"]);
    }

    #[test]
    fn lexer_error_tokens_become_error_nodes() {
        let tree = Parser::new("{a: \"unclosed}").parse();
        assert!(!tree.errors().is_empty());
        match tree.document().sections[0].body.clone() {
            Some(ast::SectionBody::Object(object)) => {
                let member = object.members[0].as_ref().unwrap();
                assert!(matches!(member.value, Some(ast::Node::Error(_))));
            }
            other => panic!("expected an object body, got {other:?}"),
        }
    }

    #[test]
    fn variable_references_stay_plain_strings_in_the_ast() {
        let members = members_of("{color: @red}");
        let member = members[0].as_ref().unwrap();
        match member.value.as_ref().unwrap() {
            ast::Node::Leaf(token) => {
                assert_eq!(token.value(), &TokenValue::Str("@red".into()));
            }
            other => panic!("expected a leaf, got {other:?}"),
        }
    }
}
