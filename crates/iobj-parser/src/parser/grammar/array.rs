use crate::ast;
use crate::parser::grammar::member;
use crate::{Parser, TokenKind};

/// *Array*:
///     "[" (Value ("," Value)*)? "]"
///
/// Unlike objects, arrays have no undefined slots: consecutive commas and
/// trailing commas are faults. Each fault site reports once and leaves an
/// `Error` node so element ordering stays well defined.
pub(crate) fn array(p: &mut Parser) -> ast::Array {
    let mut array = ast::Array {
        open_bracket: p.bump(),
        ..Default::default()
    };
    if !p.recursion_enter() {
        p.skip_balanced(TokenKind::LBracket, TokenKind::RBracket);
        return array;
    }

    'elements: loop {
        match p.peek_kind() {
            Some(TokenKind::Comma) => {
                // empty element: swallow the whole comma run, then decide
                // whether it was interior or trailing
                let range = p.peek().unwrap().range();
                while p.at(TokenKind::Comma) {
                    p.bump();
                }
                if p.at(TokenKind::RBracket) {
                    let error = p.err_at(range, "trailing comma in array", ",");
                    array.elements.push(ast::Node::Error(ast::ErrorNode { error }));
                    array.close_bracket = p.bump();
                    break 'elements;
                }
                let error = p.err_at(range, "empty element in array", ",");
                array.elements.push(ast::Node::Error(ast::ErrorNode { error }));
                continue 'elements;
            }
            Some(TokenKind::RBracket) => {
                array.close_bracket = p.bump();
                break 'elements;
            }
            None | Some(TokenKind::SectionSep) | Some(TokenKind::Tilde) => {
                p.err("expected `]` to close the array", "]");
                break 'elements;
            }
            Some(kind) => match member::value(p) {
                Some(node) => array.elements.push(node),
                None => {
                    let literal = p.peek().map(|t| t.literal().to_string()).unwrap_or_default();
                    p.err(format!("unexpected {kind} in array"), literal);
                    p.bump();
                    continue 'elements;
                }
            },
        }

        // separator position
        loop {
            match p.peek_kind() {
                Some(TokenKind::Comma) => {
                    let range = p.peek().unwrap().range();
                    p.bump();
                    if p.at(TokenKind::RBracket) {
                        let error = p.err_at(range, "trailing comma in array", ",");
                        array.elements.push(ast::Node::Error(ast::ErrorNode { error }));
                        array.close_bracket = p.bump();
                        break 'elements;
                    }
                    continue 'elements;
                }
                Some(TokenKind::RBracket) => {
                    array.close_bracket = p.bump();
                    break 'elements;
                }
                None | Some(TokenKind::SectionSep) | Some(TokenKind::Tilde) => {
                    p.err("expected `]` to close the array", "]");
                    break 'elements;
                }
                Some(kind) => {
                    let literal = p.peek().map(|t| t.literal().to_string()).unwrap_or_default();
                    p.err(format!("expected `,` or `]`, found {kind}"), literal);
                    p.bump();
                }
            }
        }
    }

    p.recursion_exit();
    array
}

#[cfg(test)]
mod test {
    use crate::{ast, Parser};
    use pretty_assertions::assert_eq;

    fn parse_array(input: &str) -> (ast::Array, Vec<String>) {
        let tree = Parser::new(input).parse();
        let messages = tree
            .errors()
            .iter()
            .map(|e| e.message().to_string())
            .collect();
        match tree.document().sections[0].body.clone() {
            Some(ast::SectionBody::Object(object)) => {
                let member = object.members[0].as_ref().unwrap().clone();
                match member.value.unwrap() {
                    ast::Node::Array(array) => (array, messages),
                    other => panic!("expected an array, got {other:?}"),
                }
            }
            other => panic!("expected an object body, got {other:?}"),
        }
    }

    #[test]
    fn mixed_scalars() {
        let (array, errors) = parse_array("data: [1, \"hello\", true, null]");
        assert!(errors.is_empty());
        assert_eq!(array.elements.len(), 4);
    }

    #[test]
    fn nested_arrays_and_objects() {
        let (array, errors) = parse_array("m: [[1, 2], {a: 3}]");
        assert!(errors.is_empty());
        assert!(matches!(array.elements[0], ast::Node::Array(_)));
        assert!(matches!(array.elements[1], ast::Node::Object(_)));
    }

    #[test]
    fn empty_array() {
        let (array, errors) = parse_array("x: []");
        assert!(errors.is_empty());
        assert!(array.elements.is_empty());
    }

    #[test]
    fn only_commas_report_one_trailing_comma_error() {
        let (array, errors) = parse_array("x: [,,,]");
        assert_eq!(errors, vec!["trailing comma in array"]);
        assert_eq!(array.elements.len(), 1);
        assert!(matches!(array.elements[0], ast::Node::Error(_)));
        assert!(array.close_bracket.is_some());
    }

    #[test]
    fn interior_empty_element() {
        let (array, errors) = parse_array("x: [1,,2]");
        assert_eq!(errors, vec!["empty element in array"]);
        assert_eq!(array.elements.len(), 3);
        assert!(matches!(array.elements[1], ast::Node::Error(_)));
    }

    #[test]
    fn trailing_comma_after_elements() {
        let (array, errors) = parse_array("x: [1, 2,]");
        assert_eq!(errors, vec!["trailing comma in array"]);
        assert_eq!(array.elements.len(), 3);
    }

    #[test]
    fn unclosed_array_reports() {
        let (_, errors) = parse_array("x: [1, 2");
        assert_eq!(errors, vec!["expected `]` to close the array"]);
    }
}
