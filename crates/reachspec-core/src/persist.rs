// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! JSON persistence for reaching specs.
//!
//! **DDD Context:** Persistence
//!
//! Inspectors are written as `type_name:method_name[:param_type,...]` and
//! resolved back through the [`Introspector`] when loading. A reference that
//! no longer resolves, or a partition size that does not match the loaded
//! expectations, is an error.

use crate::introspection::{Inspector, InspectorRef, Introspector};
use crate::spec::{ExpectedText, NestedSpec, ReachingSpec};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// Failure saving or loading a spec.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("malformed spec document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to access spec file '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported spec document version {0}")]
    UnsupportedVersion(u32),

    #[error("inspector reference `{0}` does not resolve")]
    UnresolvedInspector(String),

    #[error("argument {index}: partition size {recorded} does not match expectations worth {computed}")]
    InconsistentWeights {
        index: usize,
        recorded: usize,
        computed: usize,
    },
}

/// Serialized form of a [`ReachingSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecDocument {
    pub version: u32,
    pub arguments: Vec<ArgumentDocument>,
}

/// Serialized expectations for one argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentDocument {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_null: bool,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub string_values: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bool_inspectors: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub enum_inspectors: BTreeMap<String, String>,
    /// `null` for an inspector that returned null.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub string_inspectors: BTreeMap<String, Option<BTreeSet<String>>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub nested_inspectors: BTreeMap<String, NestedDocument>,
    pub partition_size: usize,
}

/// Serialized [`NestedSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedDocument {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub go_deeper: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_null: bool,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub string_values: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, NestedDocument>,
}

impl SpecDocument {
    /// Builds the document for `spec`.
    #[must_use]
    pub fn from_spec(spec: &ReachingSpec) -> Self {
        let arguments = (0..spec.arg_count())
            .map(|i| ArgumentDocument {
                is_null: spec.arg_is_null[i],
                string_values: spec.arg_string_value[i].clone(),
                bool_inspectors: keyed(&spec.arg_bool_inspectors[i], |v| *v),
                enum_inspectors: keyed(&spec.arg_enum_inspectors[i], Clone::clone),
                string_inspectors: keyed(&spec.arg_string_inspectors[i], |expected| match expected {
                    ExpectedText::Null => None,
                    ExpectedText::Values(values) => Some(values.clone()),
                }),
                nested_inspectors: keyed(&spec.nested_inspectors[i], nested_document),
                partition_size: spec.partition_sizes[i],
            })
            .collect();
        Self {
            version: FORMAT_VERSION,
            arguments,
        }
    }

    /// Rebuilds the spec, resolving inspector references.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] for unknown versions, unresolvable inspectors
    /// or partition sizes that do not match the expectations.
    pub fn into_spec(self, introspector: &Introspector) -> Result<ReachingSpec, PersistError> {
        if self.version != FORMAT_VERSION {
            return Err(PersistError::UnsupportedVersion(self.version));
        }
        let mut spec = ReachingSpec::new();
        spec.ensure_slots(self.arguments.len());

        for (i, argument) in self.arguments.into_iter().enumerate() {
            spec.arg_is_null[i] = argument.is_null;
            spec.arg_string_value[i] = argument.string_values;
            spec.arg_bool_inspectors[i] = resolve_keys(introspector, argument.bool_inspectors, Ok)?;
            spec.arg_enum_inspectors[i] = resolve_keys(introspector, argument.enum_inspectors, Ok)?;
            spec.arg_string_inspectors[i] =
                resolve_keys(introspector, argument.string_inspectors, |values| {
                    Ok(values.map_or(ExpectedText::Null, ExpectedText::Values))
                })?;
            spec.nested_inspectors[i] = resolve_keys(introspector, argument.nested_inspectors, |doc| {
                nested_spec(introspector, doc)
            })?;
            spec.partition_sizes[i] = argument.partition_size;

            let computed = spec.slot_weight(i);
            if computed != argument.partition_size {
                return Err(PersistError::InconsistentWeights {
                    index: i,
                    recorded: argument.partition_size,
                    computed,
                });
            }
        }
        Ok(spec)
    }
}

fn keyed<V, T>(map: &BTreeMap<Inspector, V>, convert: impl Fn(&V) -> T) -> BTreeMap<String, T> {
    map.iter()
        .map(|(inspector, value)| (inspector.reference(), convert(value)))
        .collect()
}

fn nested_document(nested: &NestedSpec) -> NestedDocument {
    NestedDocument {
        go_deeper: nested.go_deeper,
        is_null: nested.is_null,
        string_values: nested.string_values.clone(),
        children: keyed(&nested.children, nested_document),
    }
}

fn nested_spec(introspector: &Introspector, doc: NestedDocument) -> Result<NestedSpec, PersistError> {
    Ok(NestedSpec {
        go_deeper: doc.go_deeper,
        is_null: doc.is_null,
        string_values: doc.string_values,
        children: resolve_keys(introspector, doc.children, |child| nested_spec(introspector, child))?,
    })
}

fn resolve_keys<V, T>(
    introspector: &Introspector,
    map: BTreeMap<String, V>,
    mut convert: impl FnMut(V) -> Result<T, PersistError>,
) -> Result<BTreeMap<Inspector, T>, PersistError> {
    map.into_iter()
        .map(|(reference, value)| {
            let inspector = InspectorRef::parse(&reference)
                .and_then(|parsed| introspector.resolve(&parsed))
                .ok_or_else(|| PersistError::UnresolvedInspector(reference.clone()))?;
            Ok((inspector, convert(value)?))
        })
        .collect()
}

/// Serializes `spec` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PersistError::Json`] if serialization fails.
pub fn to_json(spec: &ReachingSpec) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(&SpecDocument::from_spec(spec))?)
}

/// Parses a spec written by [`to_json`].
///
/// # Errors
///
/// Returns [`PersistError`] if the text is malformed or does not resolve.
pub fn from_json(text: &str, introspector: &Introspector) -> Result<ReachingSpec, PersistError> {
    let document: SpecDocument = serde_json::from_str(text)?;
    document.into_spec(introspector)
}

/// Writes `spec` to `path`.
///
/// # Errors
///
/// Returns [`PersistError`] if serialization or the write fails.
pub fn save(spec: &ReachingSpec, path: &Path) -> Result<(), PersistError> {
    let json = to_json(spec)?;
    fs::write(path, json).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), args = spec.arg_count(), "Saved reaching spec");
    Ok(())
}

/// Reads a spec from `path`.
///
/// # Errors
///
/// Returns [`PersistError`] if the file cannot be read or parsed.
pub fn load(path: &Path, introspector: &Introspector) -> Result<ReachingSpec, PersistError> {
    let text = fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_json(&text, introspector)
}
