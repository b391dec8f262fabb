use crate::ast;
use crate::parser::grammar::section;
use crate::{Parser, TokenKind};
use std::collections::HashSet;

/// *Document*:
///     Header? Section+
///
/// The first (implicit) section is promoted to the header iff all of its
/// top-level members declare a `$Schema` or an `@variable`, or it is a
/// collection of such declarations.
pub(crate) fn document(p: &mut Parser) -> ast::Document {
    let mut sections = Vec::new();

    if !p.at(TokenKind::SectionSep) {
        // everything before the first `---`, present even for empty input
        sections.push(ast::Section {
            body: section::body(p),
            ..Default::default()
        });
    }

    while p.at(TokenKind::SectionSep) {
        sections.push(section::section(p));
    }

    let mut document = ast::Document::default();
    if sections
        .first()
        .is_some_and(|s| s.name.is_none() && is_header(s))
    {
        document.header = Some(sections.remove(0));
    }

    assign_unique_names(p, &mut sections);
    document.sections = sections;
    document
}

fn is_header(section: &ast::Section) -> bool {
    match &section.body {
        Some(ast::SectionBody::Object(object)) => {
            object.is_open() && object_declares_definitions(object)
        }
        Some(ast::SectionBody::Collection(collection)) => {
            let mut saw_object = false;
            for row in &collection.rows {
                match row {
                    ast::Row::Object(object) => {
                        if !object_declares_definitions(object) {
                            return false;
                        }
                        saw_object = true;
                    }
                    ast::Row::Empty(_) => {}
                    ast::Row::Error(_) => return false,
                }
            }
            saw_object
        }
        None => false,
    }
}

fn object_declares_definitions(object: &ast::Object) -> bool {
    if object.members.is_empty() {
        return false;
    }
    object.members.iter().all(|slot| {
        slot.as_ref().is_some_and(|member| {
            member
                .key_text()
                .is_some_and(|key| key.len() > 1 && (key.starts_with('$') || key.starts_with('@')))
        })
    })
}

/// Section names are unique within a document. Later duplicates are renamed
/// `name_2`, `name_3`, … and an error is recorded; all sections stay in
/// order.
fn assign_unique_names(p: &mut Parser, sections: &mut [ast::Section]) {
    let mut used: HashSet<String> = HashSet::new();
    for section in sections.iter_mut() {
        let Some(name) = section.name_text().map(str::to_string) else {
            continue;
        };
        if used.insert(name.clone()) {
            section.unique_name = Some(name);
            continue;
        }
        let mut suffix = 2usize;
        let mut candidate = format!("{name}_{suffix}");
        while !used.insert(candidate.clone()) {
            suffix += 1;
            candidate = format!("{name}_{suffix}");
        }
        let range = section
            .name
            .as_ref()
            .map(|t| t.range())
            .unwrap_or(crate::PositionRange::UNKNOWN);
        p.err_at(range, format!("duplicate section name `{name}`"), name);
        section.unique_name = Some(candidate);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Parser;
    use pretty_assertions::assert_eq;
    use unindent::unindent;

    #[test]
    fn empty_input_is_one_empty_section() {
        let tree = Parser::new("").parse();
        assert!(tree.errors().is_empty());
        let doc = tree.document();
        assert!(doc.header.is_none());
        assert_eq!(doc.sections.len(), 1);
        assert!(doc.sections[0].body.is_none());
    }

    #[test]
    fn whitespace_and_comments_only() {
        let tree = Parser::new("  # nothing here\n\t").parse();
        assert!(tree.errors().is_empty());
        assert_eq!(tree.document().sections.len(), 1);
        assert!(tree.document().sections[0].body.is_none());
    }

    #[test]
    fn first_section_with_definitions_becomes_the_header() {
        let input = unindent(
            "
            @color: red,
            $user: {name: string}
            ---
            ~ John
            ",
        );
        let tree = Parser::new(&input).parse();
        assert!(tree.errors().is_empty(), "{:?}", tree.errors());
        let doc = tree.document();
        assert!(doc.header.is_some());
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn header_may_be_a_collection_of_declarations() {
        let input = unindent(
            "
            ~ @r: red
            ~ @g: green
            ---
            ~ John, @r
            ",
        );
        let tree = Parser::new(&input).parse();
        assert!(tree.errors().is_empty());
        assert!(tree.document().header.is_some());
    }

    #[test]
    fn plain_data_is_not_a_header() {
        let tree = Parser::new("name: John").parse();
        let doc = tree.document();
        assert!(doc.header.is_none());
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn duplicate_sections_are_renamed() {
        let input = unindent(
            "
            --- users
            ~ a
            --- users
            ~ b
            --- users
            ~ c
            ",
        );
        let tree = Parser::new(&input).parse();
        let names: Vec<_> = tree
            .document()
            .sections
            .iter()
            .map(|s| s.unique_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["users", "users_2", "users_3"]);
        assert_eq!(tree.errors().len(), 2);
        assert!(tree.errors()[0].message().contains("duplicate section name"));
    }

    #[test]
    fn renaming_dodges_existing_suffixes() {
        let input = "--- a\n--- a_2\n--- a";
        let tree = Parser::new(input).parse();
        let names: Vec<_> = tree
            .document()
            .sections
            .iter()
            .map(|s| s.unique_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["a", "a_2", "a_3"]);
    }

    #[test]
    fn node_positions_are_ordered() {
        let input = "{a: [1, {b: 2}], c: 'x'}";
        let tree = Parser::new(input).parse();
        let range = tree.document().range();
        assert!(range.start <= range.end);
        assert_eq!(range.start.pos, 0);
        assert_eq!(range.end.pos, input.len());
    }
}
