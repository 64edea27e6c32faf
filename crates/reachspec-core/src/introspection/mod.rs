// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Capability introspection: which inspectors apply to a runtime type.
//!
//! **DDD Context:** Capability Introspection
//!
//! There is no static schema for argument values. Instead a [`TypeRegistry`]
//! describes types (supertype and declared methods), and the [`Introspector`]
//! resolves, once per type, the ordered list of zero-argument observation
//! methods ("inspectors") visible on it. Each inspector carries a
//! [`ReturnShape`] that tells the recorder and comparator how to treat its
//! output.
//!
//! Method resolution walks the supertype chain depth-first: local methods
//! first, then inherited ones, with overrides shadowing inherited definitions.

use crate::value::{InvokeError, Value};
use ecow::EcoString;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::debug;

mod builtins;

pub use builtins::{ROOT_TYPE, canonical_name};

/// Default markers identifying mock-framework proxy types.
pub const DEFAULT_MOCK_MARKERS: &[&str] = &["EnhancerByMockito", "$MockitoMock$"];

/// A method declared on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    /// Method name (e.g., "getName").
    pub name: EcoString,
    /// Parameter type names. Inspectors have none.
    #[serde(default)]
    pub params: Vec<EcoString>,
    /// Declared return type; `None` for methods returning nothing.
    #[serde(default)]
    pub returns: Option<EcoString>,
    /// Type that declares this method. Filled in on registration.
    #[serde(default, skip_serializing)]
    pub defined_in: EcoString,
}

impl MethodInfo {
    /// Returns true if this method can serve as an inspector.
    #[must_use]
    pub fn is_inspector(&self) -> bool {
        self.params.is_empty() && self.returns.is_some()
    }
}

/// Whether a type is an ordinary class or an enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Enum,
}

/// A type known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Type name.
    pub name: EcoString,
    /// Supertype name. Defaults to the root type when omitted.
    #[serde(default)]
    pub supertype: Option<EcoString>,
    #[serde(default)]
    pub kind: TypeKind,
    /// Methods declared directly on this type.
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

impl TypeInfo {
    /// Creates a class deriving from the root type, with no methods.
    pub fn class(name: impl Into<EcoString>) -> Self {
        Self {
            name: name.into(),
            supertype: Some(ROOT_TYPE.into()),
            kind: TypeKind::Class,
            methods: Vec::new(),
        }
    }

    /// Creates an enum type.
    pub fn enumeration(name: impl Into<EcoString>) -> Self {
        Self {
            kind: TypeKind::Enum,
            ..Self::class(name)
        }
    }

    /// Sets the supertype.
    #[must_use]
    pub fn extends(mut self, supertype: impl Into<EcoString>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    /// Declares a zero-argument method returning `returns`.
    #[must_use]
    pub fn inspector(mut self, name: impl Into<EcoString>, returns: impl Into<EcoString>) -> Self {
        self.methods.push(MethodInfo {
            name: name.into(),
            params: Vec::new(),
            returns: Some(returns.into()),
            defined_in: self.name.clone(),
        });
        self
    }

    /// Declares an arbitrary method.
    #[must_use]
    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }
}

/// Error loading a type registry description.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("malformed type registry: {0}")]
    Json(#[from] serde_json::Error),

    /// A user type tried to replace a built-in one.
    #[error("type `{0}` is built in and cannot be redefined")]
    BuiltinRedefined(EcoString),
}

/// Registry of types and their declared methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    types: HashMap<EcoString, TypeInfo>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl TypeRegistry {
    /// Create a registry with only built-in types.
    #[must_use]
    pub fn with_builtins() -> Self {
        Self {
            types: builtins::builtin_types(),
        }
    }

    /// Parse a JSON array of type descriptions on top of the built-ins.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the JSON is malformed or redefines a
    /// built-in type.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let infos: Vec<TypeInfo> = serde_json::from_str(json)?;
        let mut registry = Self::with_builtins();
        for info in infos {
            registry.register(info)?;
        }
        Ok(registry)
    }

    /// Register a user type, replacing any earlier user type of the same name.
    ///
    /// Type names (own, supertype, parameter and return types) are folded
    /// onto their canonical spelling.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::BuiltinRedefined`] for built-in names.
    pub fn register(&mut self, mut info: TypeInfo) -> Result<(), RegistryError> {
        info.name = builtins::canonical_name(&info.name).into();
        if builtins::is_builtin_type(&info.name) {
            return Err(RegistryError::BuiltinRedefined(info.name));
        }
        if info.supertype.is_none() {
            info.supertype = Some(ROOT_TYPE.into());
        }
        info.supertype = info
            .supertype
            .as_deref()
            .map(|s| builtins::canonical_name(s).into());
        for method in &mut info.methods {
            method.defined_in = info.name.clone();
            method.returns = method
                .returns
                .as_deref()
                .map(|r| builtins::canonical_name(r).into());
            for param in &mut method.params {
                *param = builtins::canonical_name(param).into();
            }
        }
        self.types.insert(info.name.clone(), info);
        Ok(())
    }

    /// Look up a type by name.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(builtins::canonical_name(name))
    }

    /// Returns true if the named type is an enum.
    #[must_use]
    pub fn is_enum(&self, name: &str) -> bool {
        self.get_type(name)
            .is_some_and(|info| info.kind == TypeKind::Enum)
    }

    /// Returns an iterator over all type names in the registry.
    pub fn type_names(&self) -> impl Iterator<Item = &EcoString> {
        self.types.keys()
    }

    /// Returns the ordered supertype chain for a type (excluding the type itself).
    ///
    /// Handles cycles gracefully by tracking visited types.
    #[must_use]
    pub fn supertype_chain(&self, type_name: &str) -> Vec<EcoString> {
        let mut chain = Vec::new();
        let mut current = builtins::canonical_name(type_name).to_string();
        let mut visited = HashSet::new();
        visited.insert(current.clone());

        loop {
            let Some(info) = self.types.get(current.as_str()) else {
                break;
            };
            let Some(ref supertype) = info.supertype else {
                break;
            };
            if !visited.insert(supertype.to_string()) {
                break; // Cycle detected
            }
            chain.push(supertype.clone());
            current = supertype.to_string();
        }

        chain
    }

    /// Returns all methods available on a type (local + inherited).
    ///
    /// Local methods come first, then inherited ones. An override (same name
    /// and parameter types) hides the inherited definition.
    #[must_use]
    pub fn all_methods(&self, type_name: &str) -> Vec<MethodInfo> {
        let mut seen: HashSet<(EcoString, Vec<EcoString>)> = HashSet::new();
        let mut methods = Vec::new();

        let own = EcoString::from(builtins::canonical_name(type_name));
        let lineage = std::iter::once(own.clone()).chain(self.supertype_chain(&own));
        for name in lineage {
            let Some(info) = self.types.get(name.as_str()) else {
                break;
            };
            for method in &info.methods {
                if seen.insert((method.name.clone(), method.params.clone())) {
                    methods.push(method.clone());
                }
            }
        }

        methods
    }

    /// Find a method by name and parameter types, including inherited ones.
    #[must_use]
    pub fn find_method(&self, type_name: &str, method: &str, params: &[EcoString]) -> Option<MethodInfo> {
        self.all_methods(type_name)
            .into_iter()
            .find(|m| m.name == method && m.params == params)
    }

    /// Classifies a declared return type.
    #[must_use]
    pub fn classify(&self, return_type: &str) -> ReturnShape {
        let name = builtins::canonical_name(return_type);
        if builtins::STRING_LIKE.contains(&name) {
            ReturnShape::StringLike
        } else if name == builtins::BOOLEAN {
            ReturnShape::BoolLike
        } else if builtins::NUMERIC.contains(&name) {
            ReturnShape::NumericIgnored
        } else if self.is_enum(name) {
            ReturnShape::EnumLike
        } else {
            ReturnShape::ObjectLike
        }
    }
}

/// How an inspector's output is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnShape {
    /// Text, raw bytes or char arrays; compared by edit distance.
    StringLike,
    BoolLike,
    /// Compared by the edit distance of the constant's textual form.
    EnumLike,
    /// Numbers and characters; never scored.
    NumericIgnored,
    /// Anything else; expanded recursively up to the depth cap.
    ObjectLike,
}

/// A zero-argument observation method on a type.
///
/// Equality, ordering and hashing are structural over the declaring type,
/// the method name and its parameter types.
#[derive(Debug, Clone)]
pub struct Inspector {
    owner: EcoString,
    method: EcoString,
    params: Vec<EcoString>,
    return_type: EcoString,
    shape: ReturnShape,
}

impl Inspector {
    /// Creates an inspector declared on `owner`.
    pub fn new(
        owner: impl Into<EcoString>,
        method: impl Into<EcoString>,
        return_type: impl Into<EcoString>,
        shape: ReturnShape,
    ) -> Self {
        Self {
            owner: owner.into(),
            method: method.into(),
            params: Vec::new(),
            return_type: return_type.into(),
            shape,
        }
    }

    /// Type that declares the inspector.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Declared return type (canonical spelling).
    #[must_use]
    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    #[must_use]
    pub fn shape(&self) -> ReturnShape {
        self.shape
    }

    /// Reference in `type_name:method_name[:param_type,...]` form.
    #[must_use]
    pub fn reference(&self) -> String {
        InspectorRef {
            owner: self.owner.clone(),
            method: self.method.clone(),
            params: self.params.clone(),
        }
        .to_string()
    }

    fn key(&self) -> (&str, &str, &[EcoString]) {
        (&self.owner, &self.method, &self.params)
    }
}

impl PartialEq for Inspector {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Inspector {}

impl Hash for Inspector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Inspector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Inspector {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Inspector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}()", self.owner, self.method)
    }
}

/// An unresolved inspector reference, as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorRef {
    pub owner: EcoString,
    pub method: EcoString,
    pub params: Vec<EcoString>,
}

impl InspectorRef {
    /// Parses `type_name:method_name[:param_type,...]`.
    ///
    /// An empty parameter section (`Type:method:`) means no parameters.
    #[must_use]
    pub fn parse(reference: &str) -> Option<Self> {
        let mut parts = reference.splitn(3, ':');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let method = parts.next().filter(|s| !s.is_empty())?;
        let params = parts
            .next()
            .map(|p| {
                p.split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| EcoString::from(builtins::canonical_name(s)))
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            owner: owner.into(),
            method: method.into(),
            params,
        })
    }
}

impl fmt::Display for InspectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner, self.method)?;
        if !self.params.is_empty() {
            write!(f, ":{}", self.params.join(","))?;
        }
        Ok(())
    }
}

/// Resolves and caches the inspectors of every registered type.
#[derive(Debug, Clone)]
pub struct Introspector {
    registry: TypeRegistry,
    table: HashMap<EcoString, Vec<Inspector>>,
    mock_markers: Vec<EcoString>,
}

impl Introspector {
    /// Resolves the inspector table for every type in `registry`.
    #[must_use]
    pub fn new(registry: TypeRegistry) -> Self {
        let table = registry
            .type_names()
            .map(|name| (name.clone(), Self::resolve_inspectors(&registry, name)))
            .collect();
        Self {
            registry,
            table,
            mock_markers: DEFAULT_MOCK_MARKERS.iter().map(|m| (*m).into()).collect(),
        }
    }

    /// Replaces the mock-framework markers.
    #[must_use]
    pub fn with_mock_markers(mut self, markers: impl IntoIterator<Item = EcoString>) -> Self {
        self.mock_markers = markers.into_iter().collect();
        self
    }

    fn resolve_inspectors(registry: &TypeRegistry, type_name: &str) -> Vec<Inspector> {
        registry
            .all_methods(type_name)
            .into_iter()
            .filter(|m| m.is_inspector() && m.defined_in != ROOT_TYPE)
            .filter_map(|m| {
                let returns = m.returns?;
                let shape = registry.classify(&returns);
                Some(Inspector {
                    owner: m.defined_in,
                    method: m.name,
                    params: m.params,
                    return_type: returns,
                    shape,
                })
            })
            .collect()
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Returns the inspectors applicable to a runtime type.
    ///
    /// Mock proxy types and unknown types have none.
    #[must_use]
    pub fn inspectors_for(&self, runtime_type: &str) -> &[Inspector] {
        if self.is_mock_type(runtime_type) {
            return &[];
        }
        self.table
            .get(builtins::canonical_name(runtime_type))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Returns the inspectors applicable to a value. Only objects have any.
    #[must_use]
    pub fn inspectors_for_value(&self, value: &Value) -> &[Inspector] {
        match value {
            Value::Object(object) => self.inspectors_for(object.type_name()),
            _ => &[],
        }
    }

    /// Returns true if the runtime type name belongs to a mock proxy.
    #[must_use]
    pub fn is_mock_type(&self, runtime_type: &str) -> bool {
        self.mock_markers
            .iter()
            .any(|marker| runtime_type.contains(marker.as_str()))
    }

    /// Returns true if `text` mentions a mock proxy, ignoring case.
    #[must_use]
    pub fn contains_mock_marker(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.mock_markers
            .iter()
            .any(|marker| lowered.contains(marker.to_lowercase().as_str()))
    }

    /// Invokes `inspector` on `target`.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError`] if the target is not an object or the call fails.
    pub fn invoke(&self, target: &Value, inspector: &Inspector) -> Result<Value, InvokeError> {
        match target {
            Value::Object(object) => object.invoke(inspector.method()),
            other => Err(InvokeError::NotUnderstood {
                type_name: other.runtime_type().unwrap_or("null").into(),
                method: inspector.method.clone(),
            }),
        }
    }

    /// Stops offering `inspector` for `runtime_type`.
    ///
    /// Returns true if it was active.
    pub fn deactivate(&mut self, runtime_type: &str, inspector: &Inspector) -> bool {
        let Some(inspectors) = self.table.get_mut(builtins::canonical_name(runtime_type)) else {
            return false;
        };
        let before = inspectors.len();
        inspectors.retain(|i| i != inspector);
        let removed = inspectors.len() != before;
        if removed {
            debug!(runtime_type, inspector = %inspector, "Deactivated inspector");
        }
        removed
    }

    /// Resolves a persisted reference back to an inspector.
    #[must_use]
    pub fn resolve(&self, reference: &InspectorRef) -> Option<Inspector> {
        let method = self
            .registry
            .find_method(&reference.owner, &reference.method, &reference.params)?;
        if !method.is_inspector() || method.defined_in != reference.owner {
            return None;
        }
        let returns = method.returns?;
        Some(Inspector {
            owner: method.defined_in,
            method: method.name,
            params: method.params,
            shape: self.registry.classify(&returns),
            return_type: returns,
        })
    }
}
