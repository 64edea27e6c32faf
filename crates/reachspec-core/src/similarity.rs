// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! String similarity primitives.
//!
//! **DDD Context:** Scoring (Shared Kernel)
//!
//! All comparisons are over Unicode scalar values, so a multi-byte character
//! counts as one edit.

/// Levenshtein distance between `a` and `b`, counted in characters.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    // Two rolling rows of the DP table.
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, &ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Normalized similarity `1 - distance / max(len a, len b)`.
///
/// Two empty strings are identical (1.0).
#[allow(clippy::cast_precision_loss)]
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

/// Best similarity of `actual` against any of `expected`; 0.0 for an empty set.
pub fn best_similarity<'a, I>(expected: I, actual: &str) -> f64
where
    I: IntoIterator<Item = &'a String>,
{
    expected
        .into_iter()
        .map(|candidate| edit_similarity(candidate, actual))
        .fold(0.0, f64::max)
}
