//! Difference merge engine for Strata.
//!
//! Collection-valued properties are stored as sequences of add/remove diff
//! items, recorded along an override chain. The caller collects the items
//! most-base-first; this engine folds them into the final materialized
//! sequence and maps each survivor through a caller-supplied resolver (the
//! workspace resolves object pointers to live objects; scalars pass
//! through).
//!
//! # Ordering trade-off
//!
//! The accumulator starts as an ordered list. The first removal is served
//! by the list directly (removing every occurrence of the value). The
//! second removal converts the list into a hash set once, and all further
//! adds/removes run against the set. If conversion happens, **the final
//! order is unspecified** — removal-heavy diffs trade ordering for
//! amortized cost, and that loss is part of the contract. Sequences with
//! fewer than two removals keep their order exactly.

use std::collections::HashSet;

use strata_types::{DiffAction, DiffItem, Value};

enum Accumulator {
    Ordered(Vec<Value>),
    Unordered(HashSet<Value>),
}

/// Fold a diff sequence and resolve each surviving value.
///
/// `items` must already be ordered most-base-first; the engine preserves
/// that order (subject to the conversion trade-off above) and never
/// reorders on its own. The resolver maps each survivor to the caller's
/// materialized type; its first error aborts the merge.
pub fn merge_items<T, E, F>(
    items: impl IntoIterator<Item = DiffItem>,
    resolve: F,
) -> Result<Vec<T>, E>
where
    F: FnMut(Value) -> Result<T, E>,
{
    let mut acc = Accumulator::Ordered(Vec::new());
    let mut removals = 0usize;

    for item in items {
        match (&mut acc, item.action) {
            (Accumulator::Ordered(list), DiffAction::Add) => list.push(item.value),
            (Accumulator::Ordered(list), DiffAction::Remove) => {
                removals += 1;
                if removals < 2 {
                    list.retain(|v| *v != item.value);
                } else {
                    let mut set: HashSet<Value> = list.drain(..).collect();
                    set.remove(&item.value);
                    acc = Accumulator::Unordered(set);
                }
            }
            (Accumulator::Unordered(set), DiffAction::Add) => {
                set.insert(item.value);
            }
            (Accumulator::Unordered(set), DiffAction::Remove) => {
                set.remove(&item.value);
            }
        }
    }

    let survivors: Vec<Value> = match acc {
        Accumulator::Ordered(list) => list,
        Accumulator::Unordered(set) => set.into_iter().collect(),
    };
    survivors.into_iter().map(resolve).collect()
}

/// Convenience variant that materializes plain [`Value`]s without
/// reference resolution.
pub fn merge_values(items: impl IntoIterator<Item = DiffItem>) -> Vec<Value> {
    match merge_items(items, Ok::<_, std::convert::Infallible>) {
        Ok(values) => values,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn add(s: &str) -> DiffItem {
        DiffItem::add(Value::scalar(s))
    }

    fn remove(s: &str) -> DiffItem {
        DiffItem::remove(Value::scalar(s))
    }

    fn scalars(values: &[Value]) -> Vec<&str> {
        values.iter().filter_map(|v| v.as_scalar()).collect()
    }

    #[test]
    fn pure_adds_keep_order() {
        let merged = merge_values(vec![add("a"), add("b"), add("c")]);
        assert_eq!(scalars(&merged), vec!["a", "b", "c"]);
    }

    #[test]
    fn pure_adds_keep_duplicates() {
        let merged = merge_values(vec![add("a"), add("a"), add("b")]);
        assert_eq!(scalars(&merged), vec!["a", "a", "b"]);
    }

    #[test]
    fn single_remove_keeps_order() {
        let merged = merge_values(vec![add("a"), add("b"), add("c"), remove("b")]);
        assert_eq!(scalars(&merged), vec!["a", "c"]);
    }

    #[test]
    fn single_remove_of_absent_value_is_harmless() {
        let merged = merge_values(vec![add("a"), remove("zzz")]);
        assert_eq!(scalars(&merged), vec!["a"]);
    }

    #[test]
    fn two_removes_switch_to_set_semantics() {
        // [Add a, Add b, Remove a, Remove c, Add d] => membership {b, d}
        let merged = merge_values(vec![
            add("a"),
            add("b"),
            remove("a"),
            remove("c"),
            add("d"),
        ]);
        let mut names = scalars(&merged);
        names.sort_unstable();
        assert_eq!(names, vec!["b", "d"]);
    }

    #[test]
    fn adds_after_conversion_land_in_set() {
        let merged = merge_values(vec![
            add("a"),
            remove("a"),
            remove("a"),
            add("x"),
            add("x"),
        ]);
        let mut names = scalars(&merged);
        names.sort_unstable();
        // Set semantics: the duplicate add collapses.
        assert_eq!(names, vec!["x"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(merge_values(vec![]).is_empty());
    }

    #[test]
    fn resolver_maps_survivors() {
        let merged: Vec<String> = merge_items(vec![add("a"), add("b")], |v| {
            Ok::<_, std::convert::Infallible>(v.as_scalar().unwrap().to_uppercase())
        })
        .unwrap();
        assert_eq!(merged, vec!["A", "B"]);
    }

    #[test]
    fn resolver_error_aborts() {
        let result: Result<Vec<String>, &str> =
            merge_items(vec![add("a"), add("b")], |_| Err("refused"));
        assert_eq!(result, Err("refused"));
    }

    proptest! {
        /// Final membership always equals simulating the diff against a
        /// mathematical set, whatever mode the engine ends up in.
        #[test]
        fn membership_matches_set_simulation(
            ops in proptest::collection::vec((any::<bool>(), 0u8..6), 0..40)
        ) {
            let items: Vec<DiffItem> = ops
                .iter()
                .map(|(is_add, v)| {
                    let value = Value::scalar(v.to_string());
                    if *is_add { DiffItem::add(value) } else { DiffItem::remove(value) }
                })
                .collect();

            let mut expected: HashSet<String> = HashSet::new();
            for (is_add, v) in &ops {
                if *is_add {
                    expected.insert(v.to_string());
                } else {
                    expected.remove(&v.to_string());
                }
            }

            let merged = merge_values(items);
            let actual: HashSet<String> = merged
                .iter()
                .map(|v| v.as_scalar().unwrap().to_string())
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
