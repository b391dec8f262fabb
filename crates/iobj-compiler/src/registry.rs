//! The process-wide registry of member-type validators.

use indexmap::IndexMap;
use std::sync::{OnceLock, RwLock};

/// The behavior behind a registered type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeValidator {
    Any,
    String,
    Number,
    Bool,
    Null,
    Date,
    Time,
    DateTime,
    Object,
    Array,
    Binary,
}

const BUILTINS: &[(&str, TypeValidator)] = &[
    ("any", TypeValidator::Any),
    ("string", TypeValidator::String),
    ("number", TypeValidator::Number),
    ("bool", TypeValidator::Bool),
    ("boolean", TypeValidator::Bool),
    ("null", TypeValidator::Null),
    ("date", TypeValidator::Date),
    ("time", TypeValidator::Time),
    ("datetime", TypeValidator::DateTime),
    ("object", TypeValidator::Object),
    ("array", TypeValidator::Array),
    ("binary", TypeValidator::Binary),
];

/// Registry of type validators keyed by type name.
///
/// Process-wide: initialized once behind [`registry`], read-only
/// afterwards. Registration is idempotent, so racing initializers and
/// repeated registration are both harmless no-ops.
pub struct TypeRegistry {
    types: RwLock<IndexMap<String, TypeValidator>>,
}

static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();

/// The process-wide registry, with the built-in types loaded on first use.
pub fn registry() -> &'static TypeRegistry {
    REGISTRY.get_or_init(|| {
        let registry = TypeRegistry {
            types: RwLock::new(IndexMap::new()),
        };
        registry.register_builtins();
        registry
    })
}

impl TypeRegistry {
    fn register_builtins(&self) {
        for (name, validator) in BUILTINS {
            self.register(name, *validator);
        }
    }

    /// Register `validator` under `name`. Returns `false` (and changes
    /// nothing) when the name is already registered.
    pub fn register(&self, name: &str, validator: TypeValidator) -> bool {
        let mut types = self.types.write().unwrap();
        if types.contains_key(name) {
            return false;
        }
        types.insert(name.to_string(), validator);
        true
    }

    pub fn get(&self, name: &str) -> Option<TypeValidator> {
        self.types.read().unwrap().get(name).copied()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.types.read().unwrap().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.types.read().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.types.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Restore the registry to its built-in state. Test hook; not part of
    /// the supported API.
    #[doc(hidden)]
    pub fn reset_for_tests(&self) {
        self.types.write().unwrap().clear();
        self.register_builtins();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let registry = registry();
        let count = registry.len();
        for _ in 0..3 {
            assert!(!registry.register("string", TypeValidator::String));
        }
        assert_eq!(registry.len(), count);
        assert_eq!(registry.get("string"), Some(TypeValidator::String));
    }

    #[test]
    fn bool_and_boolean_are_aliases() {
        let registry = registry();
        assert_eq!(registry.get("bool"), registry.get("boolean"));
    }

    #[test]
    fn unknown_types_are_absent() {
        assert_eq!(registry().get("quaternion"), None);
    }
}
