use iobj_compiler::{parse, ErrorCategory};
use pretty_assertions::assert_eq;
use serde_json::json;
use unindent::unindent;

#[test]
fn simple_object() {
    let document = parse(r#"{name: "John", age: 30, active: true}"#);
    assert!(!document.has_errors(), "{}", document.format_errors());
    assert_eq!(
        document.to_json(),
        json!({"name": "John", "age": 30.0, "active": true})
    );
}

#[test]
fn mixed_array() {
    let document = parse(r#"{data: [1, "hello", true, null]}"#);
    assert!(!document.has_errors());
    assert_eq!(
        document.to_json(),
        json!({"data": [1.0, "hello", true, null]})
    );
}

#[test]
fn empty_input_yields_one_empty_section() {
    let document = parse("");
    assert!(!document.has_errors());
    assert_eq!(document.sections.len(), 1);
    assert_eq!(document.sections[0].name, None);
    assert_eq!(document.to_json(), json!(null));
}

#[test]
fn whitespace_and_comments_only() {
    let document = parse("  # a note\n\t\n# another\n");
    assert!(!document.has_errors());
    assert_eq!(document.sections.len(), 1);
    assert_eq!(document.to_json(), json!(null));
}

#[test]
fn braced_commas_are_undefined_slots() {
    let document = parse("{,,,}");
    assert!(!document.has_errors(), "{}", document.format_errors());
    // undefined slots are dropped from the value tree
    assert_eq!(document.to_json(), json!({}));
}

#[test]
fn open_object_commas_after_separator() {
    let document = parse("--- \n,,,");
    assert!(!document.has_errors(), "{}", document.format_errors());
    // four undefined slots in the tree, all dropped from the value
    assert_eq!(document.to_json(), json!({}));
}

#[test]
fn array_comma_runs_are_syntax_errors() {
    let document = parse("x: [,,,]");
    assert_eq!(document.errors.len(), 1);
    assert_eq!(document.errors[0].category, ErrorCategory::Syntax);
    assert!(document.errors[0].message.contains("trailing comma"));
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
    let document = parse(&input);
    let keys: Vec<_> = document.sections.iter().map(|s| s.key.clone()).collect();
    assert_eq!(keys, vec!["users", "users_2", "users_3"]);
    let duplicates: Vec<_> = document
        .errors
        .iter()
        .filter(|e| e.message.contains("duplicate section name"))
        .collect();
    assert_eq!(duplicates.len(), 2);
    assert!(duplicates.iter().all(|e| e.category == ErrorCategory::Syntax));

    let json = document.to_json();
    let map = json.as_object().unwrap();
    assert_eq!(
        map.keys().collect::<Vec<_>>(),
        vec!["users", "users_2", "users_3"]
    );
}

#[test]
fn named_sections_map_by_key() {
    let input = unindent(
        "
        --- alpha
        a: 1
        --- beta
        b: 2
        ",
    );
    let document = parse(&input);
    assert!(!document.has_errors());
    assert_eq!(
        document.to_json(),
        json!({"alpha": {"a": 1.0}, "beta": {"b": 2.0}})
    );
    assert!(document.section("beta").is_some());
}

#[test]
fn unnamed_sections_get_ordinal_keys() {
    let document = parse("--- \n1, 2\n--- \n3");
    assert!(!document.has_errors(), "{}", document.format_errors());
    assert_eq!(
        document.to_json(),
        json!({"section_1": [1.0, 2.0], "section_2": 3.0})
    );
}

#[test]
fn header_variables_reach_raw_sections() {
    let input = unindent(
        "
        ~ @color: red
        ---
        favorite: @color
        ",
    );
    let document = parse(&input);
    assert!(!document.has_errors(), "{}", document.format_errors());
    assert_eq!(document.to_json(), json!({"favorite": "red"}));
}

#[test]
fn parsing_is_deterministic() {
    let input = unindent(
        "
        ~ $user: {name: string, age: number}
        --- people: $user
        ~ John, 25
        ~ Jane, oops
        ",
    );
    let first = parse(&input);
    let second = parse(&input);
    assert_eq!(first.to_json(), second.to_json());
    assert_eq!(first.errors, second.errors);
}

#[test]
fn errors_are_ordered_by_position() {
    let input = unindent(
        "
        a: [1,,2]
        --- users
        x: \"unclosed
        ",
    );
    let document = parse(&input);
    assert!(document.errors.len() >= 2);
    for pair in document.errors.windows(2) {
        assert!(pair[0].position <= pair[1].position);
    }
}

#[test]
fn error_records_serialize_with_positions() {
    let document = parse("{a: 1");
    assert_eq!(document.errors.len(), 1);
    let error = &document.errors[0];
    assert_eq!(error.category, ErrorCategory::Syntax);
    assert!(error.to_string().starts_with("syntax error at"));

    let serialized = serde_json::to_value(error).unwrap();
    assert_eq!(serialized["category"], json!("syntax"));
    assert_eq!(serialized["position"]["row"], json!(1));
    assert!(serialized["position"]["col"].is_number());
    assert!(serialized["position"]["pos"].is_number());
}

#[test]
fn error_display_snapshot() {
    let document = parse(r#"{name: "John", name: 42}"#);
    let rendered = document
        .errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    expect_test::expect![[r#"validation error at 1:16: duplicate member `name`"#]]
        .assert_eq(&rendered);
}

#[test]
fn format_errors_points_into_the_source() {
    let document = parse("x: \"unclosed");
    let rendered = document.format_errors();
    assert!(rendered.contains("string not closed"), "{rendered}");
    assert!(rendered.contains("document.iobj"), "{rendered}");
}

#[test]
fn crlf_input_is_normalized_before_positions_are_assigned() {
    let unix = parse("a: 1\nb: 2");
    let windows = parse("a: 1\r\nb: 2");
    assert_eq!(unix.to_json(), windows.to_json());
    assert!(!windows.has_errors());
}
