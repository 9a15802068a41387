use std::fmt;
use std::sync::Arc;

use crate::error::ProjectionError;
use crate::record::Record;
use crate::value::Value;

type Computation = Result<(String, Value), ProjectionError>;
type ComputeFn = dyn Fn(&dyn Record) -> Computation + Send + Sync;

/// Caller-supplied derived field: `(record) -> (wire name, value)`.
#[derive(Clone)]
pub struct Computed(Arc<ComputeFn>);

impl Computed {
    pub fn call(&self, record: &dyn Record) -> Computation {
        (self.0)(record)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Computed(..)")
    }
}

/// One instruction of a projection spec.
#[derive(Debug, Clone)]
pub enum FieldSpec {
    /// Internal field name, copied under its wire name.
    Leaf(String),
    /// Derived entry; bypasses naming metadata.
    Computed(Computed),
    /// Internal field name of a sub-record (or sequence of them) and the
    /// spec applied to it.
    Nested(String, Spec),
}

impl FieldSpec {
    pub fn leaf(name: impl Into<String>) -> Self {
        FieldSpec::Leaf(name.into())
    }

    pub fn nested(name: impl Into<String>, spec: impl Into<Spec>) -> Self {
        FieldSpec::Nested(name.into(), spec.into())
    }

    /// Computed entry over a concrete record type.
    ///
    /// Applying the spec to any other record type fails with
    /// `ProjectionError::RecordMismatch`.
    pub fn computed<T, F, K, V>(f: F) -> Self
    where
        T: Record,
        F: Fn(&T) -> (K, V) + Send + Sync + 'static,
        K: Into<String>,
        V: Into<Value>,
    {
        let compute: Arc<ComputeFn> = Arc::new(move |record: &dyn Record| -> Computation {
            let typed = record.as_any().downcast_ref::<T>().ok_or_else(|| {
                ProjectionError::RecordMismatch {
                    expected: std::any::type_name::<T>(),
                    found: record.record_name(),
                }
            })?;
            let (name, value) = f(typed);
            Ok((name.into(), value.into()))
        });
        FieldSpec::Computed(Computed(compute))
    }

    /// Computed entry over any record.
    pub fn computed_dyn<F, K, V>(f: F) -> Self
    where
        F: Fn(&dyn Record) -> (K, V) + Send + Sync + 'static,
        K: Into<String>,
        V: Into<Value>,
    {
        let compute: Arc<ComputeFn> = Arc::new(move |record: &dyn Record| -> Computation {
            let (name, value) = f(record);
            Ok((name.into(), value.into()))
        });
        FieldSpec::Computed(Computed(compute))
    }

    /// Parse one element of the declarative grammar:
    /// a string, or a single-key object whose value is a spec array.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ProjectionError> {
        match value {
            serde_json::Value::String(name) => Ok(FieldSpec::Leaf(name.clone())),
            serde_json::Value::Object(map) if map.len() == 1 => {
                let (name, child) = map
                    .iter()
                    .next()
                    .ok_or_else(|| ProjectionError::UnknownSpecEntry(value.to_string()))?;
                let child = Spec::from_json(child).map_err(|e| match e {
                    ProjectionError::UnknownSpecEntry(entry) => {
                        ProjectionError::UnknownSpecEntry(format!("{name}: {entry}"))
                    }
                    other => other,
                })?;
                Ok(FieldSpec::Nested(name.clone(), child))
            }
            other => Err(ProjectionError::UnknownSpecEntry(other.to_string())),
        }
    }
}

impl From<&str> for FieldSpec {
    fn from(name: &str) -> Self {
        FieldSpec::Leaf(name.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(name: String) -> Self {
        FieldSpec::Leaf(name)
    }
}

/// Ordered list of field specs describing one view of a record type.
#[derive(Debug, Clone, Default)]
pub struct Spec {
    entries: Vec<FieldSpec>,
}

impl Spec {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.entries.push(FieldSpec::leaf(name));
        self
    }

    pub fn nested(mut self, name: impl Into<String>, spec: impl Into<Spec>) -> Self {
        self.entries.push(FieldSpec::nested(name, spec));
        self
    }

    pub fn computed<T, F, K, V>(mut self, f: F) -> Self
    where
        T: Record,
        F: Fn(&T) -> (K, V) + Send + Sync + 'static,
        K: Into<String>,
        V: Into<Value>,
    {
        self.entries.push(FieldSpec::computed(f));
        self
    }

    pub fn computed_dyn<F, K, V>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Record) -> (K, V) + Send + Sync + 'static,
        K: Into<String>,
        V: Into<Value>,
    {
        self.entries.push(FieldSpec::computed_dyn(f));
        self
    }

    pub fn push(&mut self, entry: impl Into<FieldSpec>) {
        self.entries.push(entry.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.entries.iter()
    }

    /// Parse a spec array, e.g. `["id", {"owner": ["name"]}]`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ProjectionError> {
        let items = value
            .as_array()
            .ok_or_else(|| ProjectionError::UnknownSpecEntry(value.to_string()))?;
        items.iter().map(FieldSpec::from_json).collect()
    }
}

impl From<Vec<FieldSpec>> for Spec {
    fn from(entries: Vec<FieldSpec>) -> Self {
        Self { entries }
    }
}

impl<const N: usize> From<[&str; N]> for Spec {
    fn from(names: [&str; N]) -> Self {
        names.into_iter().map(FieldSpec::from).collect()
    }
}

impl FromIterator<FieldSpec> for Spec {
    fn from_iter<I: IntoIterator<Item = FieldSpec>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Spec {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'de> serde::Deserialize<'de> for Spec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
        Spec::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shape(spec: &Spec) -> Vec<String> {
        spec.iter()
            .map(|e| match e {
                FieldSpec::Leaf(n) => n.clone(),
                FieldSpec::Computed(_) => "<computed>".to_string(),
                FieldSpec::Nested(n, child) => format!("{n}{:?}", shape(child)),
            })
            .collect()
    }

    #[test]
    fn builder_keeps_order() {
        let spec = Spec::new()
            .field("a")
            .computed_dyn(|_| ("c", 1))
            .nested("b", ["x", "y"]);
        assert_eq!(shape(&spec), vec!["a", "<computed>", "b[\"x\", \"y\"]"]);
    }

    #[test]
    fn parses_declarative_spec() {
        let spec = Spec::from_json(&json!(["id", {"owner": ["name", {"team": ["title"]}]}])).unwrap();
        assert_eq!(
            shape(&spec),
            vec!["id", "owner[\"name\", \"team[\\\"title\\\"]\"]"]
        );
    }

    #[test]
    fn rejects_unknown_entries() {
        for bad in [
            json!([42]),
            json!([null]),
            json!([{"a": ["x"], "b": ["y"]}]),
            json!([{}]),
            json!("id"),
        ] {
            assert!(
                matches!(Spec::from_json(&bad), Err(ProjectionError::UnknownSpecEntry(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn nested_error_names_parent() {
        let err = Spec::from_json(&json!([{"owner": [true]}])).unwrap_err();
        assert_eq!(err, ProjectionError::UnknownSpecEntry("owner: true".into()));
    }

    #[test]
    fn deserializes_through_serde() {
        let spec: Spec = serde_json::from_str(r#"["a", {"b": []}]"#).unwrap();
        assert_eq!(spec.len(), 2);
        assert!(serde_json::from_str::<Spec>("[1]").is_err());
    }
}
