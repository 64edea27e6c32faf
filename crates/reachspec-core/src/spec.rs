// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The reaching specification model.
//!
//! **DDD Context:** Specification Model
//!
//! A [`ReachingSpec`] records, per formal argument of the target call, what
//! the arguments looked like when the target was first reached:
//!
//! - whether the argument was null
//! - the literal text of string-like arguments
//! - boolean, enum and string inspector outputs of object arguments
//! - a bounded [`NestedSpec`] tree for object-like inspector outputs
//!
//! `partition_sizes[i]` counts the points argument `i` can earn when scored,
//! so the sum over all arguments bounds what the comparator can award.

use crate::error::ScoreError;
use crate::introspection::Inspector;
use std::collections::{BTreeMap, BTreeSet};

/// Expected output of a string-like inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedText {
    /// The inspector returned null.
    Null,
    /// The inspector returned one of these texts.
    Values(BTreeSet<String>),
}

impl ExpectedText {
    /// Expected text holding a single value.
    pub fn single(text: impl Into<String>) -> Self {
        Self::Values(BTreeSet::from([text.into()]))
    }

    /// Points this expectation is worth: one for null, otherwise one for
    /// presence plus one for the text similarity.
    #[must_use]
    pub fn weight(&self) -> usize {
        match self {
            Self::Null => 1,
            Self::Values(_) => 2,
        }
    }

    /// Returns true if `actual` satisfies this expectation exactly.
    #[must_use]
    pub fn matches(&self, actual: Option<&str>) -> bool {
        match (self, actual) {
            (Self::Null, None) => true,
            (Self::Values(values), Some(text)) => values.contains(text),
            _ => false,
        }
    }

    fn merge(&mut self, other: &Self) {
        let Self::Values(theirs) = other else {
            return;
        };
        match self {
            Self::Values(mine) => mine.extend(theirs.iter().cloned()),
            Self::Null => *self = Self::Values(theirs.clone()),
        }
    }
}

/// Expectation for the value returned by an object-like inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedSpec {
    /// Children were recorded for this node.
    pub go_deeper: bool,
    /// The inspector returned null.
    pub is_null: bool,
    /// Expected texts; only on string leaves.
    pub string_values: BTreeSet<String>,
    /// Child expectations; only when `go_deeper`.
    pub children: BTreeMap<Inspector, NestedSpec>,
}

impl NestedSpec {
    /// Leaf for an inspector that returned null.
    #[must_use]
    pub fn null_leaf() -> Self {
        Self {
            is_null: true,
            ..Self::default()
        }
    }

    /// Leaf for a string-like output.
    pub fn string_leaf(text: impl Into<String>) -> Self {
        Self {
            string_values: BTreeSet::from([text.into()]),
            ..Self::default()
        }
    }

    /// Node whose children were expanded.
    #[must_use]
    pub fn expanded(children: BTreeMap<Inspector, NestedSpec>) -> Self {
        Self {
            go_deeper: true,
            children,
            ..Self::default()
        }
    }

    /// Node that is not expanded; carries no expectations.
    #[must_use]
    pub fn capped() -> Self {
        Self::default()
    }

    /// Points this node can earn.
    #[must_use]
    pub fn weight(&self) -> usize {
        if self.is_null {
            1
        } else if self.go_deeper {
            self.children.values().map(NestedSpec::weight).sum()
        } else if !self.string_values.is_empty() {
            2
        } else {
            0
        }
    }

    /// Depth of the deepest expanded node below this one (0 for a leaf).
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.go_deeper {
            1 + self.children.values().map(NestedSpec::depth).max().unwrap_or(0)
        } else {
            0
        }
    }
}

/// Recorded expectation for every formal argument of a target call.
///
/// All per-argument vectors always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachingSpec {
    pub(crate) arg_is_null: Vec<bool>,
    pub(crate) arg_string_value: Vec<BTreeSet<String>>,
    pub(crate) arg_bool_inspectors: Vec<BTreeMap<Inspector, bool>>,
    pub(crate) arg_enum_inspectors: Vec<BTreeMap<Inspector, String>>,
    pub(crate) arg_string_inspectors: Vec<BTreeMap<Inspector, ExpectedText>>,
    pub(crate) nested_inspectors: Vec<BTreeMap<Inspector, NestedSpec>>,
    pub(crate) partition_sizes: Vec<usize>,
}

impl ReachingSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of argument slots.
    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.partition_sizes.len()
    }

    /// Sum of partition sizes; the most points a comparison can award.
    #[must_use]
    pub fn total_possible(&self) -> usize {
        self.partition_sizes.iter().sum()
    }

    /// Returns true if any argument has at least one inspector expectation.
    #[must_use]
    pub fn is_known(&self) -> bool {
        (0..self.arg_count()).any(|i| {
            !self.arg_bool_inspectors[i].is_empty()
                || !self.arg_enum_inspectors[i].is_empty()
                || !self.arg_string_inspectors[i].is_empty()
                || !self.nested_inspectors[i].is_empty()
        })
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partition_sizes.is_empty()
    }

    /// Grows every per-argument vector to at least `count` empty slots.
    pub fn ensure_slots(&mut self, count: usize) {
        if self.arg_count() >= count {
            return;
        }
        self.arg_is_null.resize(count, false);
        self.arg_string_value.resize_with(count, BTreeSet::new);
        self.arg_bool_inspectors.resize_with(count, BTreeMap::new);
        self.arg_enum_inspectors.resize_with(count, BTreeMap::new);
        self.arg_string_inspectors.resize_with(count, BTreeMap::new);
        self.nested_inspectors.resize_with(count, BTreeMap::new);
        self.partition_sizes.resize(count, 0);
    }

    /// Clears every recorded expectation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn partition_sizes(&self) -> &[usize] {
        &self.partition_sizes
    }

    #[must_use]
    pub fn arg_is_null(&self, index: usize) -> bool {
        self.arg_is_null.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn string_values(&self, index: usize) -> Option<&BTreeSet<String>> {
        self.arg_string_value.get(index)
    }

    #[must_use]
    pub fn bool_inspectors(&self, index: usize) -> Option<&BTreeMap<Inspector, bool>> {
        self.arg_bool_inspectors.get(index)
    }

    #[must_use]
    pub fn enum_inspectors(&self, index: usize) -> Option<&BTreeMap<Inspector, String>> {
        self.arg_enum_inspectors.get(index)
    }

    #[must_use]
    pub fn string_inspectors(&self, index: usize) -> Option<&BTreeMap<Inspector, ExpectedText>> {
        self.arg_string_inspectors.get(index)
    }

    #[must_use]
    pub fn nested_inspectors(&self, index: usize) -> Option<&BTreeMap<Inspector, NestedSpec>> {
        self.nested_inspectors.get(index)
    }

    /// Recomputes the weight of argument `index` from its expectations.
    ///
    /// Matches `partition_sizes[index]` for any spec built by the recorder.
    #[must_use]
    pub fn slot_weight(&self, index: usize) -> usize {
        if index >= self.arg_count() {
            return 0;
        }
        if self.arg_is_null[index] {
            return 1;
        }
        usize::from(!self.arg_string_value[index].is_empty())
            + self.arg_bool_inspectors[index].len()
            + self.arg_enum_inspectors[index].len()
            + self.arg_string_inspectors[index]
                .values()
                .map(ExpectedText::weight)
                .sum::<usize>()
            + self.nested_inspectors[index]
                .values()
                .map(NestedSpec::weight)
                .sum::<usize>()
    }

    /// Returns true if every partition size equals its recomputed weight.
    #[must_use]
    pub fn weights_consistent(&self) -> bool {
        (0..self.arg_count()).all(|i| self.partition_sizes[i] == self.slot_weight(i))
    }

    /// Folds another recording of the same call into this one.
    ///
    /// Literal and string inspector sets are unioned, boolean and enum
    /// expectations that disagree are dropped, and an argument stays null
    /// only if it was null in both. Partition sizes are recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::ArityMismatch`] if both specs have slots and
    /// their argument counts differ.
    pub fn merge(&mut self, other: &ReachingSpec) -> Result<(), ScoreError> {
        if self.is_empty() {
            *self = other.clone();
            return Ok(());
        }
        if other.is_empty() {
            return Ok(());
        }
        if self.arg_count() != other.arg_count() {
            return Err(ScoreError::ArityMismatch {
                expected: self.arg_count(),
                actual: other.arg_count(),
            });
        }

        for i in 0..self.arg_count() {
            if self.arg_is_null[i] && !other.arg_is_null[i] {
                self.arg_is_null[i] = false;
            }
            self.arg_string_value[i].extend(other.arg_string_value[i].iter().cloned());

            let mine = std::mem::take(&mut self.arg_bool_inspectors[i]);
            self.arg_bool_inspectors[i] = merge_agreeing(mine, &other.arg_bool_inspectors[i]);
            let mine = std::mem::take(&mut self.arg_enum_inspectors[i]);
            self.arg_enum_inspectors[i] = merge_agreeing(mine, &other.arg_enum_inspectors[i]);

            for (inspector, expected) in &other.arg_string_inspectors[i] {
                self.arg_string_inspectors[i]
                    .entry(inspector.clone())
                    .and_modify(|mine| mine.merge(expected))
                    .or_insert_with(|| expected.clone());
            }

            for (inspector, nested) in &other.nested_inspectors[i] {
                self.nested_inspectors[i]
                    .entry(inspector.clone())
                    .or_insert_with(|| nested.clone());
            }

            self.partition_sizes[i] = self.slot_weight(i);
        }
        Ok(())
    }
}

/// Keeps entries of `mine` that `theirs` does not contradict, plus entries
/// only `theirs` has.
fn merge_agreeing<V: Clone + PartialEq>(
    mine: BTreeMap<Inspector, V>,
    theirs: &BTreeMap<Inspector, V>,
) -> BTreeMap<Inspector, V> {
    let mut merged: BTreeMap<Inspector, V> = theirs
        .iter()
        .filter(|(inspector, _)| !mine.contains_key(*inspector))
        .map(|(inspector, value)| (inspector.clone(), value.clone()))
        .collect();
    merged.extend(
        mine.into_iter()
            .filter(|(inspector, value)| theirs.get(inspector).is_none_or(|v| v == value)),
    );
    merged
}
