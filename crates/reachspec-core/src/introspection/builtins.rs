// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Built-in type definitions for the type registry.
//!
//! **DDD Context:** Capability Introspection
//!
//! Defines the universal root `Object` and the scalar types whose inspector
//! outputs the engine classifies by shape. User types are registered on top.
//! Common spellings from JVM signatures (`java.lang.String`, `int`, `byte[]`)
//! are folded onto the canonical names here.

use super::{MethodInfo, TypeInfo, TypeKind};
use ecow::EcoString;
use std::collections::HashMap;

/// Name of the universal root type. Inspectors it declares are never used.
pub const ROOT_TYPE: &str = "Object";

/// Canonical string-like type names.
pub(super) const STRING_LIKE: &[&str] = &["String", "Bytes", "Chars"];

/// Canonical boolean type name.
pub(super) const BOOLEAN: &str = "Boolean";

/// Canonical numeric and character type names; their outputs are not scored.
pub(super) const NUMERIC: &[&str] = &[
    "Integer",
    "Long",
    "Short",
    "Byte",
    "Double",
    "Float",
    "Character",
];

/// Returns the canonical spelling of a type name.
pub fn canonical_name(name: &str) -> &str {
    match name.trim() {
        "java.lang.String" | "string" | "str" | "CharSequence" | "java.lang.CharSequence" => {
            "String"
        }
        "byte[]" | "[B" => "Bytes",
        "char[]" | "[C" => "Chars",
        "boolean" | "bool" | "java.lang.Boolean" => "Boolean",
        "int" | "java.lang.Integer" => "Integer",
        "long" | "java.lang.Long" => "Long",
        "short" | "java.lang.Short" => "Short",
        "byte" | "java.lang.Byte" => "Byte",
        "double" | "java.lang.Double" => "Double",
        "float" | "java.lang.Float" => "Float",
        "char" | "java.lang.Character" => "Character",
        "java.lang.Object" => ROOT_TYPE,
        other => other,
    }
}

/// Returns true if the given type name is a built-in type.
pub(super) fn is_builtin_type(name: &str) -> bool {
    name == ROOT_TYPE || STRING_LIKE.contains(&name) || name == BOOLEAN || NUMERIC.contains(&name)
}

/// Returns all built-in type definitions.
pub(super) fn builtin_types() -> HashMap<EcoString, TypeInfo> {
    let mut types = HashMap::new();

    let root_method = |name: &str, returns: &str| MethodInfo {
        name: name.into(),
        params: vec![],
        returns: Some(returns.into()),
        defined_in: ROOT_TYPE.into(),
    };
    types.insert(
        ROOT_TYPE.into(),
        TypeInfo {
            name: ROOT_TYPE.into(),
            supertype: None,
            kind: TypeKind::Class,
            methods: vec![
                root_method("toString", "String"),
                root_method("hashCode", "Integer"),
                root_method("getClass", "Class"),
            ],
        },
    );

    for name in STRING_LIKE
        .iter()
        .chain(std::iter::once(&BOOLEAN))
        .chain(NUMERIC)
    {
        types.insert(
            (*name).into(),
            TypeInfo {
                name: (*name).into(),
                supertype: Some(ROOT_TYPE.into()),
                kind: TypeKind::Class,
                methods: vec![],
            },
        );
    }

    types
}
