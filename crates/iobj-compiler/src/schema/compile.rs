//! Compilation of schema AST nodes into [`Schema`]s.

use super::{CompileError, MemberDef, Open, Pattern, Schema, SchemaHandle};
use crate::definitions::{is_schema_ref, is_variable_ref, Definitions};
use crate::node::Node;
use crate::registry::{registry, TypeValidator};
use crate::value::Value;
use iobj_parser::{ast, Token, TokenKind};
use regex::Regex;

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    optional: bool,
    nullable: bool,
}

/// Compile a schema declaration value: an object compiles to a schema, a
/// `$Name` leaf stays a deferred reference for the processor to resolve.
pub(crate) fn compile_schema_node(
    name: &str,
    node: &ast::Node,
    defs: &Definitions,
) -> Result<SchemaHandle, CompileError> {
    match node {
        ast::Node::Object(object) => {
            let schema = compile_object(name, object, defs, "")?;
            Ok(SchemaHandle::Inline(Node::new_parsed(schema, object.range())))
        }
        ast::Node::Leaf(token)
            if token.kind() == TokenKind::OpenString
                && token.string_value().is_some_and(is_schema_ref) =>
        {
            Ok(SchemaHandle::Reference {
                name: token.string_value().unwrap().to_string(),
                range: token.range(),
            })
        }
        other => Err(CompileError::InvalidSchema {
            name: name.to_string(),
            reason: "expected a schema object or a `$Name` reference".to_string(),
            range: other.range(),
        }),
    }
}

/// Compile an object AST node into a [`Schema`].
pub(crate) fn compile_object(
    name: &str,
    object: &ast::Object,
    defs: &Definitions,
    path: &str,
) -> Result<Schema, CompileError> {
    let mut schema = Schema {
        name: name.to_string(),
        path: path.to_string(),
        names: Vec::new(),
        defs: Default::default(),
        open: Open::Closed,
    };

    let last = object.members.len().saturating_sub(1);
    for (index, slot) in object.members.iter().enumerate() {
        let Some(member) = slot else {
            return Err(CompileError::EmptyMemberDef {
                path: if path.is_empty() { name.to_string() } else { path.to_string() },
                range: object.range(),
            });
        };

        let field = field_identity(name, path, member)?;
        if field.name == "*" {
            if index != last {
                return Err(CompileError::StarPosition {
                    schema: name.to_string(),
                    range: member.range(),
                });
            }
            schema.open = compile_star(name, path, member, &field, defs)?;
            if let Open::Typed(def) = &schema.open {
                schema.defs.insert("*".to_string(), (**def).clone());
            }
            continue;
        }

        let def = compile_field(name, path, &field, member, defs)?;
        if let Some(existing) = schema.defs.get(&field.name) {
            return Err(CompileError::DuplicateMember {
                name: field.name.clone(),
                schema: name.to_string(),
                first: existing.range.start,
                range: member.range(),
            });
        }
        schema.names.push(field.name.clone());
        schema.defs.insert(field.name.clone(), def);
    }

    if schema.names.is_empty() && matches!(schema.open, Open::Closed) {
        schema.open = Open::Untyped;
    }
    Ok(schema)
}

struct FieldIdentity {
    name: String,
    flags: Flags,
    /// A bare field name with no `:` — type defaults to `any`.
    keyless: bool,
}

fn field_identity(
    schema_name: &str,
    path: &str,
    member: &ast::Member,
) -> Result<FieldIdentity, CompileError> {
    if let Some(key) = &member.key {
        let raw = key.string_value().unwrap_or_else(|| key.literal());
        if raw == "*" {
            return Ok(FieldIdentity {
                name: "*".to_string(),
                flags: Flags::default(),
                keyless: false,
            });
        }
        // suffixes apply to open-string keys; quoted keys are literal
        let (name, flags) = if key.kind() == TokenKind::OpenString {
            split_suffixes(raw)
        } else {
            (raw.to_string(), Flags::default())
        };
        if name.is_empty() {
            return Err(CompileError::InvalidKey {
                path: display_path(schema_name, path),
                reason: format!("`{raw}` is not a valid field name"),
                range: key.range(),
            });
        }
        return Ok(FieldIdentity {
            name,
            flags,
            keyless: false,
        });
    }

    match &member.value {
        Some(ast::Node::Leaf(token)) if token.kind() == TokenKind::OpenString => {
            let text = token.string_value().unwrap();
            if text == "*" {
                return Ok(FieldIdentity {
                    name: "*".to_string(),
                    flags: Flags::default(),
                    keyless: true,
                });
            }
            let (name, flags) = split_suffixes(text);
            if name.is_empty() {
                return Err(CompileError::InvalidKey {
                    path: display_path(schema_name, path),
                    reason: format!("`{text}` is not a valid field name"),
                    range: token.range(),
                });
            }
            Ok(FieldIdentity {
                name,
                flags,
                keyless: true,
            })
        }
        _ => Err(CompileError::InvalidKey {
            path: display_path(schema_name, path),
            reason: "keyless schema entries must be plain field names".to_string(),
            range: member.range(),
        }),
    }
}

/// Strip `?` (optional) and `*` (nullable) suffixes, in either order.
fn split_suffixes(text: &str) -> (String, Flags) {
    let mut name = text;
    let mut flags = Flags::default();
    loop {
        if !flags.optional && name.ends_with('?') {
            flags.optional = true;
            name = &name[..name.len() - 1];
            continue;
        }
        if !flags.nullable && name.ends_with('*') {
            flags.nullable = true;
            name = &name[..name.len() - 1];
            continue;
        }
        break;
    }
    (name.to_string(), flags)
}

/// The `*` open-schema sentinel: bare `*` accepts anything, `*: type`
/// accepts extras of that type.
fn compile_star(
    schema_name: &str,
    path: &str,
    member: &ast::Member,
    field: &FieldIdentity,
    defs: &Definitions,
) -> Result<Open, CompileError> {
    if field.keyless {
        return Ok(Open::Untyped);
    }
    let Some(value) = &member.value else {
        return Err(CompileError::EmptyMemberDef {
            path: child_path(path, "*"),
            range: member.range(),
        });
    };
    let def = member_def(schema_name, "*", Flags::default(), value, defs, path)?;
    Ok(Open::Typed(Box::new(def)))
}

fn compile_field(
    schema_name: &str,
    path: &str,
    field: &FieldIdentity,
    member: &ast::Member,
    defs: &Definitions,
) -> Result<MemberDef, CompileError> {
    if field.keyless {
        let mut def = MemberDef::any(&field.name, child_path(path, &field.name));
        def.optional = field.flags.optional;
        def.nullable = field.flags.nullable;
        def.range = member.range();
        return Ok(def);
    }
    let Some(value) = &member.value else {
        return Err(CompileError::EmptyMemberDef {
            path: child_path(path, &field.name),
            range: member.range(),
        });
    };
    let mut def = member_def(schema_name, &field.name, field.flags, value, defs, path)?;
    def.range = member.range();
    Ok(def)
}

/// Compile one member-definition value: a type name, a `$Name` reference,
/// an object typedef, a nested schema, or an array typedef.
fn member_def(
    schema_name: &str,
    field_name: &str,
    flags: Flags,
    node: &ast::Node,
    defs: &Definitions,
    parent_path: &str,
) -> Result<MemberDef, CompileError> {
    let path = child_path(parent_path, field_name);
    match node {
        ast::Node::Leaf(token) => leaf_type_def(field_name, flags, token, &path),
        ast::Node::Object(object) => {
            object_member_def(schema_name, field_name, flags, object, defs, &path)
        }
        ast::Node::Array(array) => {
            array_member_def(schema_name, field_name, flags, array, defs, parent_path, &path)
        }
        ast::Node::Error(e) => Err(CompileError::InvalidSchema {
            name: schema_name.to_string(),
            reason: format!("syntax error in member definition: {}", e.error.message()),
            range: e.range(),
        }),
    }
}

fn leaf_type_def(
    field_name: &str,
    flags: Flags,
    token: &Token,
    path: &str,
) -> Result<MemberDef, CompileError> {
    if token.kind() != TokenKind::OpenString {
        return Err(CompileError::InvalidType {
            type_name: token.literal().to_string(),
            path: path.to_string(),
            range: token.range(),
        });
    }
    let text = token.string_value().unwrap();

    let mut def = MemberDef::any(field_name, path);
    def.optional = flags.optional;
    def.nullable = flags.nullable;
    def.range = token.range();

    if is_schema_ref(text) {
        def.type_name = "object".to_string();
        def.validator = TypeValidator::Object;
        def.schema = Some(SchemaHandle::Reference {
            name: text.to_string(),
            range: token.range(),
        });
        return Ok(def);
    }
    match registry().get(text) {
        Some(validator) => {
            def.type_name = text.to_string();
            def.validator = validator;
            Ok(def)
        }
        None => Err(CompileError::InvalidType {
            type_name: text.to_string(),
            path: path.to_string(),
            range: token.range(),
        }),
    }
}

enum TypeSelector<'a> {
    /// `{type: T, …}`
    Keyed(&'a ast::Member),
    /// `{T, …}` — the first positional child names the type.
    Positional,
}

fn type_selector(object: &ast::Object) -> Option<TypeSelector<'_>> {
    for member in object.defined_members() {
        if member.key_text() == Some("type") {
            return Some(TypeSelector::Keyed(member));
        }
    }
    if let Some(Some(member)) = object.members.first() {
        if member.key.is_none() {
            if let Some(ast::Node::Leaf(token)) = &member.value {
                if token.kind() == TokenKind::OpenString {
                    let text = token.string_value().unwrap();
                    if is_schema_ref(text) || registry().is_registered(text) {
                        return Some(TypeSelector::Positional);
                    }
                }
            }
        }
    }
    None
}

fn object_member_def(
    schema_name: &str,
    field_name: &str,
    flags: Flags,
    object: &ast::Object,
    defs: &Definitions,
    path: &str,
) -> Result<MemberDef, CompileError> {
    let Some(selector) = type_selector(object) else {
        // a nested object schema, compiled recursively
        let nested = compile_object(path, object, defs, path)?;
        let mut def = MemberDef::any(field_name, path);
        def.type_name = "object".to_string();
        def.validator = TypeValidator::Object;
        def.optional = flags.optional;
        def.nullable = flags.nullable;
        def.schema = Some(SchemaHandle::Inline(Node::new_parsed(
            nested,
            object.range(),
        )));
        return Ok(def);
    };

    let type_node = match &selector {
        TypeSelector::Keyed(member) => member.value.as_ref().ok_or_else(|| {
            CompileError::EmptyMemberDef {
                path: format!("{path}.type"),
                range: member.range(),
            }
        })?,
        TypeSelector::Positional => {
            object.members[0].as_ref().unwrap().value.as_ref().unwrap()
        }
    };
    let mut def = member_def(schema_name, field_name, flags, type_node, defs, parent_of(path))?;

    for (index, slot) in object.members.iter().enumerate() {
        let Some(member) = slot else {
            return Err(CompileError::EmptyMemberDef {
                path: path.to_string(),
                range: object.range(),
            });
        };
        let skip = match &selector {
            TypeSelector::Keyed(_) => member.key_text() == Some("type"),
            TypeSelector::Positional => index == 0,
        };
        if skip {
            continue;
        }
        let Some(key) = member.key_text() else {
            return Err(CompileError::InvalidSchema {
                name: schema_name.to_string(),
                reason: "unexpected positional entry in a member definition".to_string(),
                range: member.range(),
            });
        };
        let key = key.to_string();
        apply_constraint(schema_name, &mut def, &key, member, defs, path)?;
    }
    Ok(def)
}

fn array_member_def(
    schema_name: &str,
    field_name: &str,
    flags: Flags,
    array: &ast::Array,
    defs: &Definitions,
    parent_path: &str,
    path: &str,
) -> Result<MemberDef, CompileError> {
    if array.elements.len() > 1 {
        return Err(CompileError::InvalidSchema {
            name: schema_name.to_string(),
            reason: "array definitions take exactly zero or one element type".to_string(),
            range: array.range(),
        });
    }
    let of = match array.elements.first() {
        None => None,
        Some(element) => Some(Box::new(member_def(
            schema_name,
            field_name,
            Flags::default(),
            element,
            defs,
            parent_path,
        )?)),
    };

    let mut def = MemberDef::any(field_name, path);
    def.type_name = "array".to_string();
    def.validator = TypeValidator::Array;
    def.optional = flags.optional;
    def.nullable = flags.nullable;
    def.of = of;
    def.range = array.range();
    Ok(def)
}

fn apply_constraint(
    schema_name: &str,
    def: &mut MemberDef,
    key: &str,
    member: &ast::Member,
    defs: &Definitions,
    path: &str,
) -> Result<(), CompileError> {
    let Some(node) = &member.value else {
        return Err(CompileError::EmptyMemberDef {
            path: format!("{path}.{key}"),
            range: member.range(),
        });
    };
    match key {
        "default" => def.default = Some(constraint_value(schema_name, node, defs)?),
        "choices" => {
            let ast::Node::Array(array) = node else {
                return Err(invalid_constraint(schema_name, key, "takes an array", node));
            };
            let mut choices = Vec::with_capacity(array.elements.len());
            for element in &array.elements {
                choices.push(constraint_value(schema_name, element, defs)?);
            }
            def.constraints.choices = Some(choices);
        }
        "min" => def.constraints.min = Some(constraint_value(schema_name, node, defs)?),
        "max" => def.constraints.max = Some(constraint_value(schema_name, node, defs)?),
        "minLength" => {
            def.constraints.min_length = Some(usize_constraint(schema_name, key, node, defs)?)
        }
        "maxLength" => {
            def.constraints.max_length = Some(usize_constraint(schema_name, key, node, defs)?)
        }
        "minLen" => def.constraints.min_len = Some(usize_constraint(schema_name, key, node, defs)?),
        "maxLen" => def.constraints.max_len = Some(usize_constraint(schema_name, key, node, defs)?),
        "pattern" => {
            let source = match constraint_value(schema_name, node, defs)? {
                Value::String(s) => s,
                _ => return Err(invalid_constraint(schema_name, key, "takes a string", node)),
            };
            let regex = Regex::new(&source).map_err(|e| CompileError::InvalidSchema {
                name: schema_name.to_string(),
                reason: format!("invalid pattern: {e}"),
                range: node.range(),
            })?;
            def.constraints.pattern = Some(Pattern { source, regex });
        }
        "optional" => {
            def.optional = match constraint_value(schema_name, node, defs)? {
                Value::Bool(b) => b,
                _ => return Err(invalid_constraint(schema_name, key, "takes a boolean", node)),
            }
        }
        "null" => {
            def.nullable = match constraint_value(schema_name, node, defs)? {
                Value::Bool(b) => b,
                _ => return Err(invalid_constraint(schema_name, key, "takes a boolean", node)),
            }
        }
        // unrecognized constraint keys have no record field to land in
        _ => {}
    }
    Ok(())
}

fn constraint_value(
    schema_name: &str,
    node: &ast::Node,
    defs: &Definitions,
) -> Result<Value, CompileError> {
    match node {
        ast::Node::Leaf(token) => {
            if token.may_hold_variable() {
                if let Some(text) = token.string_value() {
                    if is_variable_ref(text) {
                        return defs.variable(text).cloned().map_err(|e| {
                            CompileError::InvalidSchema {
                                name: schema_name.to_string(),
                                reason: e.to_string(),
                                range: token.range(),
                            }
                        });
                    }
                }
            }
            if token.kind() == TokenKind::Error {
                return Err(CompileError::InvalidSchema {
                    name: schema_name.to_string(),
                    reason: "syntax error in constraint value".to_string(),
                    range: token.range(),
                });
            }
            Ok(Value::from_token(token))
        }
        ast::Node::Array(array) => {
            let mut items = Vec::with_capacity(array.elements.len());
            for element in &array.elements {
                items.push(constraint_value(schema_name, element, defs)?);
            }
            Ok(Value::Array(items))
        }
        other => Err(CompileError::InvalidSchema {
            name: schema_name.to_string(),
            reason: "unsupported constraint value".to_string(),
            range: other.range(),
        }),
    }
}

fn usize_constraint(
    schema_name: &str,
    key: &str,
    node: &ast::Node,
    defs: &Definitions,
) -> Result<usize, CompileError> {
    match constraint_value(schema_name, node, defs)? {
        Value::Number(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
        _ => Err(invalid_constraint(
            schema_name,
            key,
            "takes a non-negative integer",
            node,
        )),
    }
}

fn invalid_constraint(
    schema_name: &str,
    key: &str,
    reason: &str,
    node: &ast::Node,
) -> CompileError {
    CompileError::InvalidSchema {
        name: schema_name.to_string(),
        reason: format!("`{key}` {reason}"),
        range: node.range(),
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('.') {
        Some(dot) => &path[..dot],
        None => "",
    }
}

fn display_path(schema_name: &str, path: &str) -> String {
    if path.is_empty() {
        schema_name.to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Open;
    use pretty_assertions::assert_eq;

    fn compile(text: &str) -> Result<Schema, CompileError> {
        compile_with(text, &Definitions::new())
    }

    fn compile_with(text: &str, defs: &Definitions) -> Result<Schema, CompileError> {
        let tree = iobj_parser::Parser::new(text).parse();
        assert!(tree.errors().is_empty(), "syntax errors: {:?}", tree.errors());
        match tree.document().sections[0].body.clone() {
            Some(ast::SectionBody::Object(object)) => {
                compile_object("$test", &object, defs, "")
            }
            other => panic!("expected an object body, got {other:?}"),
        }
    }

    #[test]
    fn plain_type_names() {
        let schema = compile("{name: string, age: number, active: bool}").unwrap();
        assert_eq!(schema.names, vec!["name", "age", "active"]);
        assert_eq!(schema.defs["age"].validator, TypeValidator::Number);
        assert_eq!(schema.open, Open::Closed);
    }

    #[test]
    fn bare_field_names_default_to_any() {
        let schema = compile("name, age").unwrap();
        assert_eq!(schema.names, vec!["name", "age"]);
        assert_eq!(schema.defs["name"].type_name, "any");
    }

    #[test]
    fn suffixes_set_flags_and_are_stripped() {
        let schema = compile("{nick?: string, spouse*: string, pet?*: string, boss*?}").unwrap();
        assert_eq!(schema.names, vec!["nick", "spouse", "pet", "boss"]);
        assert!(schema.defs["nick"].optional && !schema.defs["nick"].nullable);
        assert!(!schema.defs["spouse"].optional && schema.defs["spouse"].nullable);
        assert!(schema.defs["pet"].optional && schema.defs["pet"].nullable);
        assert!(schema.defs["boss"].optional && schema.defs["boss"].nullable);
    }

    #[test]
    fn schema_references_are_deferred() {
        let schema = compile("{boss: $person}").unwrap();
        let def = &schema.defs["boss"];
        assert_eq!(def.type_name, "object");
        assert!(matches!(
            def.schema,
            Some(SchemaHandle::Reference { ref name, .. }) if name == "$person"
        ));
    }

    #[test]
    fn shorthand_typedef_with_constraints() {
        let schema = compile("{color: {string, choices: [red, green]}}").unwrap();
        let def = &schema.defs["color"];
        assert_eq!(def.type_name, "string");
        let choices = def.constraints.choices.as_ref().unwrap();
        assert_eq!(
            choices,
            &vec![Value::String("red".into()), Value::String("green".into())]
        );
    }

    #[test]
    fn keyed_typedef_form() {
        let schema = compile("{age: {type: number, min: 0, max: 150}}").unwrap();
        let def = &schema.defs["age"];
        assert_eq!(def.type_name, "number");
        assert_eq!(def.constraints.min, Some(Value::Number(0.0)));
        assert_eq!(def.constraints.max, Some(Value::Number(150.0)));
    }

    #[test]
    fn nested_object_schemas() {
        let schema = compile("{name: string, address: {street: string, city: string}}").unwrap();
        let def = &schema.defs["address"];
        assert_eq!(def.type_name, "object");
        match &def.schema {
            Some(SchemaHandle::Inline(nested)) => {
                assert_eq!(nested.names, vec!["street", "city"]);
                assert_eq!(nested.defs["street"].path, "address.street");
            }
            other => panic!("expected an inline schema, got {other:?}"),
        }
    }

    #[test]
    fn array_typedefs() {
        let schema = compile("{tags: [], scores: [number], friends: [$person], grid: [[number]]}")
            .unwrap();
        assert!(schema.defs["tags"].of.is_none());
        assert_eq!(
            schema.defs["scores"].of.as_ref().unwrap().validator,
            TypeValidator::Number
        );
        assert!(matches!(
            schema.defs["friends"].of.as_ref().unwrap().schema,
            Some(SchemaHandle::Reference { .. })
        ));
        let grid_inner = schema.defs["grid"].of.as_ref().unwrap();
        assert_eq!(grid_inner.validator, TypeValidator::Array);
        assert_eq!(
            grid_inner.of.as_ref().unwrap().validator,
            TypeValidator::Number
        );
    }

    #[test]
    fn array_definitions_take_at_most_one_child() {
        let error = compile("{bad: [number, string]}").unwrap_err();
        assert!(matches!(error, CompileError::InvalidSchema { .. }));
    }

    #[test]
    fn bare_star_opens_the_schema() {
        let schema = compile("{name: string, *}").unwrap();
        assert_eq!(schema.open, Open::Untyped);
        assert_eq!(schema.names, vec!["name"]);
    }

    #[test]
    fn typed_star_is_mirrored_in_defs() {
        let schema = compile("{name, *: number}").unwrap();
        match &schema.open {
            Open::Typed(def) => assert_eq!(def.validator, TypeValidator::Number),
            other => panic!("expected a typed open schema, got {other:?}"),
        }
        assert!(schema.defs.contains_key("*"));
        assert!(!schema.names.iter().any(|n| n == "*"));
    }

    #[test]
    fn star_must_come_last() {
        let error = compile("{*, name: string}").unwrap_err();
        assert!(matches!(error, CompileError::StarPosition { .. }));
    }

    #[test]
    fn empty_schemas_are_open() {
        let schema = compile("{}").unwrap();
        assert_eq!(schema.open, Open::Untyped);
        assert!(schema.names.is_empty());
    }

    #[test]
    fn duplicate_members_are_fatal() {
        let error = compile("{name: string, name: number}").unwrap_err();
        match error {
            CompileError::DuplicateMember { name, first, .. } => {
                assert_eq!(name, "name");
                assert_eq!(first.row, 1);
            }
            other => panic!("expected a duplicate member error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_types_are_fatal() {
        let error = compile("{p: quaternion}").unwrap_err();
        match error {
            CompileError::InvalidType { type_name, path, .. } => {
                assert_eq!(type_name, "quaternion");
                assert_eq!(path, "p");
            }
            other => panic!("expected an invalid type error, got {other:?}"),
        }
    }

    #[test]
    fn constraint_variables_resolve_at_compile_time() {
        let mut defs = Definitions::new();
        defs.define_variable("@r", Value::String("red".into()));
        let schema = compile_with("{color: {string, choices: [@r]}}", &defs).unwrap();
        assert_eq!(
            schema.defs["color"].constraints.choices,
            Some(vec![Value::String("red".into())])
        );
    }

    #[test]
    fn missing_constraint_variables_are_fatal() {
        let error = compile("{color: {string, choices: [@missing]}}").unwrap_err();
        match error {
            CompileError::InvalidSchema { reason, .. } => {
                assert!(reason.contains("@missing"));
            }
            other => panic!("expected an invalid schema error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_patterns_are_fatal() {
        let error = compile("{id: {string, pattern: '['}}").unwrap_err();
        assert!(matches!(error, CompileError::InvalidSchema { .. }));
    }

    #[test]
    fn paths_concatenate_from_the_root() {
        let schema = compile("{a: {b: {c: number}}}").unwrap();
        let a = &schema.defs["a"];
        match &a.schema {
            Some(SchemaHandle::Inline(inner)) => {
                let b = &inner.defs["b"];
                match &b.schema {
                    Some(SchemaHandle::Inline(innermost)) => {
                        assert_eq!(innermost.defs["c"].path, "a.b.c");
                    }
                    other => panic!("expected an inline schema, got {other:?}"),
                }
            }
            other => panic!("expected an inline schema, got {other:?}"),
        }
    }
}
