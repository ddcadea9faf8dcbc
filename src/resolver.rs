//! One-level candidate enumeration over a [`DataValue`] tree.

use crate::DataValue;
use std::cmp::Ordering;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// A direct child of the node at some prefix, keyed by its full dotted path from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub key: String,
    pub value: &'a DataValue,
}

/// Walks `path` one dotted segment at a time. The empty path is the root itself.
pub fn resolve<'a>(root: &'a DataValue, path: &str) -> Option<&'a DataValue> {
    if path.is_empty() {
        return Some(root);
    }
    path.split('.').try_fold(root, |node, segment| node.child(segment))
}

fn qualify(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

pub fn is_excluded(key: &str, filters: &[String]) -> bool {
    filters.iter().any(|filter| key.starts_with(filter.as_str()))
}

/// Direct children of the node at `prefix`, minus anything under an exclusion filter.
/// Unresolvable prefixes and primitive nodes yield an empty list. The order is whatever the
/// node stores; use [`sorted_children_at`] for display order.
pub fn children_at<'a>(root: &'a DataValue, prefix: &str, filters: &[String]) -> Vec<Candidate<'a>> {
    let Some(node) = resolve(root, prefix) else {
        return Vec::new();
    };

    node.children()
        .into_iter()
        .map(|(segment, value)| Candidate {
            key: qualify(prefix, &segment),
            value,
        })
        .filter(|candidate| !is_excluded(&candidate.key, filters))
        .collect()
}

pub fn sorted_children_at<'a>(
    root: &'a DataValue,
    prefix: &str,
    filters: &[String],
) -> Vec<Candidate<'a>> {
    let mut candidates = children_at(root, prefix, filters);
    sort_candidates(&mut candidates);
    candidates
}

/// Primitive-valued entries first, then object-valued ones; keys collated within each group.
pub fn sort_candidates(candidates: &mut [Candidate<'_>]) {
    candidates.sort_by(compare_candidates);
}

fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.value
        .sorts_as_object()
        .cmp(&b.value.sorts_as_object())
        .then_with(|| collate(&a.key, &b.key))
}

/// Base letters only: decomposed, accents dropped, lowercased.
fn fold(key: &str) -> String {
    key.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Ordering by base letter, ignoring case and accents. Ties go unaccented before accented,
/// then lowercase before uppercase.
pub fn collate(a: &str, b: &str) -> Ordering {
    fold(a)
        .cmp(&fold(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

/// Appends a dot when `key` names something with children, so the next level lists at once.
/// Keys that do not resolve are returned unchanged.
pub fn key_with_trailing_dot(root: &DataValue, key: &str) -> String {
    match resolve(root, key) {
        Some(value) if value.has_children() => format!("{key}."),
        _ => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{children_at, collate, key_with_trailing_dot, resolve, sorted_children_at};
    use crate::DataValue;
    use pretty_assertions::assert_eq;
    use std::cmp::Ordering;

    fn keys(root: &DataValue, prefix: &str, filters: &[String]) -> Vec<String> {
        sorted_children_at(root, prefix, filters)
            .into_iter()
            .map(|c| c.key)
            .collect()
    }

    #[test]
    fn resolve_walks_dotted_segments() {
        let v = DataValue::parse_json5("{ a: { b: { c: 5 } } }").unwrap();
        assert_eq!(resolve(&v, ""), Some(&v));
        assert!(resolve(&v, "a.b").and_then(|n| n.get("c")).is_some());
        assert_eq!(resolve(&v, "a.x"), None);
        assert_eq!(resolve(&v, "a."), None);
    }

    #[test]
    fn children_of_primitive_or_missing_prefix_are_empty() {
        let v = DataValue::parse_json5("{ a: 1, s: 'text', n: null }").unwrap();
        assert!(children_at(&v, "a", &[]).is_empty());
        assert!(children_at(&v, "s", &[]).is_empty());
        assert!(children_at(&v, "n", &[]).is_empty());
        assert!(children_at(&v, "missing.deeper", &[]).is_empty());
    }

    #[test]
    fn children_are_qualified_with_the_prefix() {
        let v = DataValue::parse_json5("{ a: { b: 1, c: 'x' } }").unwrap();
        let found = sorted_children_at(&v, "a", &[]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].key, "a.b");
        assert_eq!(found[1].key, "a.c");
        assert_eq!(found[1].value, &DataValue::String("x".into()));
    }

    #[test]
    fn exclusion_filters_drop_matching_prefixes() {
        let v = DataValue::parse_json5("{ a: { secret: 1, secretive: 2, open: 3 } }").unwrap();
        let filters = vec!["a.secret".to_string()];
        assert_eq!(keys(&v, "a", &filters), vec!["a.open"]);
    }

    #[test]
    fn primitives_sort_before_objects_regardless_of_source_order() {
        let v = DataValue::parse_json5(
            "{ zeta: { }, beta: [1], alpha: { }, omega: 1, delta: 'd', nothing: null }",
        )
        .unwrap();
        assert_eq!(
            keys(&v, "", &[]),
            vec!["delta", "omega", "alpha", "beta", "nothing", "zeta"]
        );
    }

    #[test]
    fn arrays_list_their_indices() {
        let v = DataValue::parse_json5("{ items: [{ name: 'x' }, 2] }").unwrap();
        assert_eq!(keys(&v, "items", &[]), vec!["items.1", "items.0"]);
        assert_eq!(keys(&v, "items.0", &[]), vec!["items.0.name"]);
    }

    #[test]
    fn collate_ignores_case_first() {
        assert_eq!(collate("Beta", "alpha"), Ordering::Greater);
        assert_eq!(collate("a.b", "a.B"), Ordering::Less);
        assert_eq!(collate("hp", "hp"), Ordering::Equal);
    }

    #[test]
    fn accented_keys_sort_by_base_letter() {
        let v = DataValue::parse_json5("{ fig: 1, Zed: 2, 'éclair': 3, eclair: 4, 'Éclat': 5 }")
            .unwrap();
        assert_eq!(
            keys(&v, "", &[]),
            vec!["eclair", "éclair", "Éclat", "fig", "Zed"]
        );
        assert_eq!(collate("e\u{301}t\u{e9}", "été"), Ordering::Less);
    }

    #[test]
    fn trailing_dot_only_for_nodes_with_children() {
        let v = DataValue::parse_json5("{ a: { b: 1 }, n: null, list: [] }").unwrap();
        assert_eq!(key_with_trailing_dot(&v, "a"), "a.");
        assert_eq!(key_with_trailing_dot(&v, "a.b"), "a.b");
        assert_eq!(key_with_trailing_dot(&v, "n"), "n");
        assert_eq!(key_with_trailing_dot(&v, "list"), "list.");
        assert_eq!(key_with_trailing_dot(&v, "nope"), "nope");
    }
}
