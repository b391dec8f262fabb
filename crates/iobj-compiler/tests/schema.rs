use iobj_compiler::{
    compile_schema, registry, CompileError, Open, SchemaHandle, TypeValidator,
};
use pretty_assertions::assert_eq;

#[test]
fn compiles_field_lists_in_order() {
    let schema = compile_schema("$user", "{name: string, age: number, tags: [string]}").unwrap();
    assert_eq!(schema.name, "$user");
    assert_eq!(schema.names, vec!["name", "age", "tags"]);
    assert_eq!(schema.open, Open::Closed);
    assert_eq!(schema.defs["age"].validator, TypeValidator::Number);
}

#[test]
fn open_objects_compile_too() {
    // a schema body does not need braces
    let schema = compile_schema("$user", "name, age: number").unwrap();
    assert_eq!(schema.names, vec!["name", "age"]);
    assert_eq!(schema.defs["name"].type_name, "any");
}

#[test]
fn empty_schemas_accept_anything() {
    let schema = compile_schema("$any", "{}").unwrap();
    assert!(schema.names.is_empty());
    assert_eq!(schema.open, Open::Untyped);
}

#[test]
fn star_never_appears_in_names() {
    let untyped = compile_schema("$a", "{name, *}").unwrap();
    assert!(!untyped.names.iter().any(|n| n == "*"));
    assert_eq!(untyped.open, Open::Untyped);

    let typed = compile_schema("$b", "{name, *: number}").unwrap();
    assert!(!typed.names.iter().any(|n| n == "*"));
    assert!(typed.defs.contains_key("*"));
    match &typed.open {
        Open::Typed(def) => assert_eq!(def.validator, TypeValidator::Number),
        other => panic!("expected a typed open schema, got {other:?}"),
    }
}

#[test]
fn star_anywhere_but_last_is_fatal() {
    let error = compile_schema("$bad", "{*, name: string}").unwrap_err();
    assert!(matches!(error, CompileError::StarPosition { .. }));
}

#[test]
fn duplicate_members_are_fatal_and_point_at_the_first() {
    let error = compile_schema("$bad", "{name: string,\nname: number}").unwrap_err();
    match error {
        CompileError::DuplicateMember { name, first, range, .. } => {
            assert_eq!(name, "name");
            assert_eq!(first.row, 1);
            assert_eq!(range.start.row, 2);
        }
        other => panic!("expected a duplicate member error, got {other:?}"),
    }
}

#[test]
fn unknown_types_are_fatal() {
    let error = compile_schema("$bad", "{p: quaternion}").unwrap_err();
    assert!(matches!(error, CompileError::InvalidType { .. }));
}

#[test]
fn syntax_errors_are_fatal() {
    let error = compile_schema("$bad", "{name: \"unclosed}").unwrap_err();
    assert!(matches!(error, CompileError::InvalidSchema { .. }));
}

#[test]
fn non_object_bodies_are_fatal() {
    let error = compile_schema("$bad", "~ a\n~ b").unwrap_err();
    assert!(matches!(error, CompileError::InvalidSchema { .. }));
}

#[test]
fn paths_concatenate_from_the_root() {
    let schema = compile_schema("$s", "{a: {b: {c: number}}}").unwrap();
    let a = &schema.defs["a"];
    assert_eq!(a.path, "a");
    let Some(SchemaHandle::Inline(inner)) = &a.schema else {
        panic!("expected an inline nested schema");
    };
    assert_eq!(inner.defs["b"].path, "a.b");
    let Some(SchemaHandle::Inline(innermost)) = &inner.defs["b"].schema else {
        panic!("expected an inline nested schema");
    };
    assert_eq!(innermost.defs["c"].path, "a.b.c");
}

#[test]
fn deferred_references_survive_compilation() {
    let schema = compile_schema("$person", "{name: string, boss: $person}").unwrap();
    assert!(matches!(
        schema.defs["boss"].schema,
        Some(SchemaHandle::Reference { ref name, .. }) if name == "$person"
    ));
}

#[test]
fn repeated_registration_is_a_no_op() {
    let registry = registry();
    let before = registry.len();
    for _ in 0..5 {
        registry.register("string", TypeValidator::String);
        registry.register("number", TypeValidator::Number);
    }
    assert_eq!(registry.len(), before);
}

#[test]
fn compiled_schemas_share_through_nodes() {
    let schema = compile_schema("$user", "{name: string}").unwrap();
    let alias = schema.clone();
    assert!(schema.ptr_eq(&alias));
    assert_eq!(schema, alias);
}
