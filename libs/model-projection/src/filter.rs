use std::collections::HashSet;

use crate::record::Record;

/// Set of field or key names allowed to survive a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(HashSet<String>);

impl AllowList {
    pub fn new() -> Self {
        Self(HashSet::new())
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for AllowList {
    fn from(names: [S; N]) -> Self {
        names.into_iter().collect()
    }
}

impl<S: Into<String>> From<Vec<S>> for AllowList {
    fn from(names: Vec<S>) -> Self {
        names.into_iter().collect()
    }
}

impl From<&[&str]> for AllowList {
    fn from(names: &[&str]) -> Self {
        names.iter().copied().collect()
    }
}

/// Reset every `Option` field whose internal name is not allowed.
///
/// Shallow: nested records are not visited. Non-`Option` fields are never
/// touched, allowed or not. Mutates in place; callers must hold exclusive
/// access (the `&mut` borrow enforces it).
pub fn filter_fields<R: Record + ?Sized>(record: &mut R, allow: &AllowList) {
    for info in record.field_table() {
        if !info.nilable || allow.contains(info.name) {
            continue;
        }
        if record.clear_field(info.name) {
            tracing::debug!(
                record = record.record_name(),
                field = info.name,
                "cleared field outside allow list"
            );
        }
    }
}

/// Drop every key that is not allowed, and every `null` value even when
/// its key is allowed. Shallow: nested objects are kept as they are.
pub fn filter_map_fields(
    map: &mut serde_json::Map<String, serde_json::Value>,
    allow: &AllowList,
) {
    map.retain(|key, value| {
        let keep = allow.contains(key) && !value.is_null();
        if !keep {
            tracing::debug!(key = %key, "dropped map entry");
        }
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn map_keeps_allowed_non_null_entries() {
        let mut map = object(json!({"field1": 1, "field2": "val", "field3": null}));
        filter_map_fields(&mut map, &AllowList::from(["field1", "field3"]));
        assert_eq!(map, object(json!({"field1": 1})));
    }

    #[test]
    fn map_filter_is_shallow() {
        let mut map = object(json!({"nested": {"inner": null, "other": 1}, "skip": 2}));
        filter_map_fields(&mut map, &AllowList::from(["nested"]));
        assert_eq!(map, object(json!({"nested": {"inner": null, "other": 1}})));
    }

    #[test]
    fn empty_allow_list_clears_map() {
        let mut map = object(json!({"a": 1, "b": false}));
        filter_map_fields(&mut map, &AllowList::new());
        assert!(map.is_empty());
    }

    #[test]
    fn allow_list_set_semantics() {
        let allow: AllowList = vec!["a", "b", "a"].into();
        assert_eq!(allow.len(), 2);
        assert!(allow.contains("a"));
        assert!(!allow.contains("c"));

        let names: &[&str] = &["x"];
        assert!(AllowList::from(names).contains("x"));
    }
}
