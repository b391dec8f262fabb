//! Per-type scalar validators.
//!
//! Each validator takes the data node and the compiled member definition,
//! enforces the constraints that apply to its type, and returns the
//! normalized value (or records an error and returns its placeholder).

use super::{describe_node, Processor, ValidationErrorKind};
use crate::schema::MemberDef;
use crate::value::Value;
use iobj_parser::{ast, DateTimeVariant, Token, TokenKind};

pub(super) fn string(p: &mut Processor, node: &ast::Node, def: &MemberDef) -> Value {
    let Some(token) = string_family_token(node) else {
        return invalid_type(p, node, def, "string");
    };
    let value = match p.resolve_leaf(token) {
        Ok(value) => value,
        Err(kind) => return p.error(kind, token.range()),
    };
    let Value::String(text) = &value else {
        return resolved_type_mismatch(p, token, def, "string", &value);
    };

    if !choice_allowed(def, &value) {
        return p.error(
            ValidationErrorKind::ValueNotInChoices(def.path.clone()),
            token.range(),
        );
    }
    let length = text.chars().count();
    if def.constraints.min_length.is_some_and(|min| length < min)
        || def.constraints.max_length.is_some_and(|max| length > max)
    {
        return p.error(
            ValidationErrorKind::LengthOutOfRange(def.path.clone()),
            token.range(),
        );
    }
    if let Some(pattern) = &def.constraints.pattern {
        if !pattern.regex.is_match(text) {
            return p.error(
                ValidationErrorKind::PatternMismatch(def.path.clone()),
                token.range(),
            );
        }
    }
    value
}

pub(super) fn number(p: &mut Processor, node: &ast::Node, def: &MemberDef) -> Value {
    let Some(token) = node.as_leaf() else {
        return invalid_type(p, node, def, "number");
    };
    let value = match p.resolve_leaf(token) {
        Ok(value) => value,
        Err(kind) => return p.error(kind, token.range()),
    };
    let Value::Number(n) = value else {
        return resolved_type_mismatch(p, token, def, "number", &value);
    };
    if !n.is_finite() {
        return p.error(
            ValidationErrorKind::InvalidType {
                path: def.path.clone(),
                expected: "number".to_string(),
                found: "non-finite number".to_string(),
            },
            token.range(),
        );
    }
    if !choice_allowed(def, &value) {
        return p.error(
            ValidationErrorKind::ValueNotInChoices(def.path.clone()),
            token.range(),
        );
    }
    let below = matches!(&def.constraints.min, Some(Value::Number(min)) if n < *min);
    let above = matches!(&def.constraints.max, Some(Value::Number(max)) if n > *max);
    if below || above {
        return p.error(
            ValidationErrorKind::OutOfRange(def.path.clone()),
            token.range(),
        );
    }
    value
}

pub(super) fn boolean(p: &mut Processor, node: &ast::Node, def: &MemberDef) -> Value {
    let Some(token) = node.as_leaf() else {
        return invalid_type(p, node, def, "bool");
    };
    let value = match p.resolve_leaf(token) {
        Ok(value) => value,
        Err(kind) => return p.error(kind, token.range()),
    };
    if !matches!(value, Value::Bool(_)) {
        return resolved_type_mismatch(p, token, def, "bool", &value);
    }
    if !choice_allowed(def, &value) {
        return p.error(
            ValidationErrorKind::ValueNotInChoices(def.path.clone()),
            token.range(),
        );
    }
    value
}

/// The `null` type accepts only the null literal.
pub(super) fn null(p: &mut Processor, node: &ast::Node, def: &MemberDef) -> Value {
    match node.as_leaf() {
        Some(token) if token.kind() == TokenKind::Null => Value::Null,
        _ => invalid_type(p, node, def, "null"),
    }
}

pub(super) fn date_time(
    p: &mut Processor,
    node: &ast::Node,
    def: &MemberDef,
    expected: DateTimeVariant,
) -> Value {
    let expected_name = variant_name(expected);
    let Some(token) = node.as_leaf() else {
        return invalid_type(p, node, def, expected_name);
    };
    let value = match p.resolve_leaf(token) {
        Ok(value) => value,
        Err(kind) => return p.error(kind, token.range()),
    };
    let Value::DateTime { value: when, variant } = value else {
        return resolved_type_mismatch(p, token, def, expected_name, &value);
    };
    if variant != expected {
        return p.error(
            ValidationErrorKind::InvalidType {
                path: def.path.clone(),
                expected: expected_name.to_string(),
                found: variant_name(variant).to_string(),
            },
            token.range(),
        );
    }
    let below = matches!(
        &def.constraints.min,
        Some(Value::DateTime { value: min, .. }) if when < *min
    );
    let above = matches!(
        &def.constraints.max,
        Some(Value::DateTime { value: max, .. }) if when > *max
    );
    if below || above {
        return p.error(
            ValidationErrorKind::OutOfRange(def.path.clone()),
            token.range(),
        );
    }
    Value::DateTime {
        value: when,
        variant,
    }
}

pub(super) fn binary(p: &mut Processor, node: &ast::Node, def: &MemberDef) -> Value {
    match node.as_leaf() {
        Some(token) if token.kind() == TokenKind::BinaryString => Value::from_token(token),
        _ => invalid_type(p, node, def, "binary"),
    }
}

fn string_family_token(node: &ast::Node) -> Option<&Token> {
    node.as_leaf().filter(|t| {
        matches!(
            t.kind(),
            TokenKind::OpenString | TokenKind::QuotedString | TokenKind::RawString
        )
    })
}

fn choice_allowed(def: &MemberDef, value: &Value) -> bool {
    match &def.constraints.choices {
        Some(choices) => choices.iter().any(|choice| choice.choice_eq(value)),
        None => true,
    }
}

fn invalid_type(p: &mut Processor, node: &ast::Node, def: &MemberDef, expected: &str) -> Value {
    let found = describe_node(node).to_string();
    p.error(
        ValidationErrorKind::InvalidType {
            path: def.path.clone(),
            expected: expected.to_string(),
            found,
        },
        node.range(),
    )
}

fn resolved_type_mismatch(
    p: &mut Processor,
    token: &Token,
    def: &MemberDef,
    expected: &str,
    value: &Value,
) -> Value {
    p.error(
        ValidationErrorKind::InvalidType {
            path: def.path.clone(),
            expected: expected.to_string(),
            found: value.type_name().to_string(),
        },
        token.range(),
    )
}

fn variant_name(variant: DateTimeVariant) -> &'static str {
    match variant {
        DateTimeVariant::Date => "date",
        DateTimeVariant::Time => "time",
        DateTimeVariant::DateTime => "datetime",
    }
}
