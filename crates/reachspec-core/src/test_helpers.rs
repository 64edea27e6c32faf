// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for unit tests.

use crate::introspection::{Introspector, MethodInfo, TypeInfo, TypeRegistry};
use crate::value::{Record, Value};

/// A small domain: people with addresses, an enum, and a linked node type.
pub(crate) fn fixture_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::with_builtins();
    let types = [
        TypeInfo::enumeration("Status"),
        TypeInfo::class("Region").inspector("getCode", "String"),
        TypeInfo::class("Country")
            .inspector("getName", "String")
            .inspector("getRegion", "Region"),
        TypeInfo::class("Address")
            .inspector("getCity", "java.lang.String")
            .inspector("getCountry", "Country")
            .inspector("isPrimary", "boolean"),
        TypeInfo::class("Person")
            .inspector("getName", "java.lang.String")
            .inspector("isActive", "boolean")
            .inspector("getStatus", "Status")
            .inspector("getAge", "int")
            .inspector("getAddress", "Address")
            .inspector("describe", "String")
            .method(MethodInfo {
                name: "rename".into(),
                params: vec!["java.lang.String".into()],
                returns: None,
                defined_in: "Person".into(),
            }),
        TypeInfo::class("Employee")
            .extends("Person")
            .inspector("getTitle", "String")
            .inspector("describe", "String"),
        TypeInfo::class("Flag").inspector("isValid", "boolean"),
        TypeInfo::class("Node")
            .inspector("getLabel", "String")
            .inspector("getNext", "Node"),
    ];
    for info in types {
        registry
            .register(info)
            .expect("fixture types are not built in");
    }
    registry
}

pub(crate) fn fixture_introspector() -> Introspector {
    Introspector::new(fixture_registry())
}

pub(crate) fn flag(valid: bool) -> Value {
    Record::new("Flag")
        .with("isValid", Value::Bool(valid))
        .into_value()
}

pub(crate) fn region(code: &str) -> Value {
    Record::new("Region")
        .with("getCode", Value::text(code))
        .into_value()
}

pub(crate) fn country(name: &str, region_code: &str) -> Value {
    Record::new("Country")
        .with("getName", Value::text(name))
        .with("getRegion", region(region_code))
        .into_value()
}

pub(crate) fn address(city: &str, country_value: Value) -> Value {
    Record::new("Address")
        .with("getCity", Value::text(city))
        .with("getCountry", country_value)
        .with("isPrimary", Value::Bool(true))
        .into_value()
}

/// A person with every inspector answering.
pub(crate) fn person(name: &str, active: bool, address_value: Value) -> Value {
    Record::new("Person")
        .with("getName", Value::text(name))
        .with("isActive", Value::Bool(active))
        .with("getStatus", Value::enumeration("Status", "ACTIVE"))
        .with("getAge", Value::Int(42))
        .with("getAddress", address_value)
        .with("describe", Value::text(format!("person {name}")))
        .into_value()
}

pub(crate) fn node(label: &str, next: Value) -> Value {
    Record::new("Node")
        .with("getLabel", Value::text(label))
        .with("getNext", next)
        .into_value()
}
