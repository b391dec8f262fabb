use crate::ast;
use crate::parser::grammar::{collection, object};
use crate::{Parser, TokenKind};

/// *Section*:
///     SectionHeaderLine? Body?
///
/// The lexer has already split the `--- <name>: $Schema` header line into a
/// separator token plus optional name and schema-reference tokens.
pub(crate) fn section(p: &mut Parser) -> ast::Section {
    let separator = p.bump().unwrap(); // `---`

    let mut section = ast::Section::default();
    if p.peek().is_some_and(|t| t.is_section_name()) {
        section.name = p.bump();
    }
    if p.peek().is_some_and(|t| t.is_section_schema()) {
        section.schema = p.bump();
    }
    // a fault on the header line itself (`--- name:` with the schema
    // missing) belongs to the header, not to the body
    if p.peek().is_some_and(|t| {
        t.kind() == TokenKind::Error && t.position().row == separator.position().row
    }) {
        p.bump();
    }
    section.body = body(p);
    section
}

/// *Body*: an object (braced or open) or a collection, running to the next
/// section boundary.
pub(crate) fn body(p: &mut Parser) -> Option<ast::SectionBody> {
    match p.peek_kind() {
        None | Some(TokenKind::SectionSep) => None,
        Some(TokenKind::Tilde) => Some(ast::SectionBody::Collection(collection::collection(p))),
        Some(_) => {
            let parsed = object::open_object(p);
            if parsed.members.is_empty() {
                return None;
            }
            // a body that is exactly one braced object stands for itself
            if parsed.members.len() == 1 {
                if let Some(Some(member)) = parsed.members.first() {
                    if member.key.is_none() {
                        if let Some(ast::Node::Object(inner)) = &member.value {
                            if inner.open_brace.is_some() {
                                return Some(ast::SectionBody::Object(inner.clone()));
                            }
                        }
                    }
                }
            }
            Some(ast::SectionBody::Object(parsed))
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{ast, Parser};
    use pretty_assertions::assert_eq;
    use unindent::unindent;

    fn first_section(input: &str) -> ast::Section {
        let tree = Parser::new(input).parse();
        assert!(tree.errors().is_empty(), "{:?}", tree.errors());
        tree.document().sections[0].clone()
    }

    #[test]
    fn braced_body_unwraps_to_the_object() {
        let section = first_section("{a: 1, b: 2}");
        match section.body.unwrap() {
            ast::SectionBody::Object(object) => {
                assert!(object.open_brace.is_some());
                assert_eq!(object.members.len(), 2);
            }
            other => panic!("expected object body, got {other:?}"),
        }
    }

    #[test]
    fn open_body_keeps_its_members() {
        let section = first_section("a: 1, b: 2");
        match section.body.unwrap() {
            ast::SectionBody::Object(object) => {
                assert!(object.is_open());
                assert_eq!(object.members.len(), 2);
            }
            other => panic!("expected object body, got {other:?}"),
        }
    }

    #[test]
    fn named_section_with_schema_reference() {
        let input = unindent(
            "
            --- users: $user
            ~ John
            ",
        );
        let tree = Parser::new(&input).parse();
        assert!(tree.errors().is_empty());
        let section = &tree.document().sections[0];
        assert_eq!(section.name_text(), Some("users"));
        assert_eq!(section.schema_text(), Some("$user"));
        assert!(matches!(
            section.body,
            Some(ast::SectionBody::Collection(_))
        ));
    }

    #[test]
    fn array_body_stays_wrapped_in_an_open_object() {
        let section = first_section("[1, 2, 3]");
        match section.body.unwrap() {
            ast::SectionBody::Object(object) => {
                assert!(object.is_open());
                assert_eq!(object.members.len(), 1);
                let member = object.members[0].as_ref().unwrap();
                assert!(member.key.is_none());
                assert!(matches!(member.value, Some(ast::Node::Array(_))));
            }
            other => panic!("expected object body, got {other:?}"),
        }
    }
}
