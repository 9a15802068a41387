use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};

/// Projected value.
///
/// Strategy by kind:
/// - Scalars (Int64, UInt64, Float64, Bool): copied by value
/// - String: owned copy, no aliasing into the source record
/// - Array, Map: collections of leaf values, converted element by element
/// - Record, Records: output of a nested spec entry
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    String(String),

    Array(Vec<Value>),
    /// Keyed collection of leaf values (dictionaries are leaves, never nested).
    Map(BTreeMap<String, Value>),

    /// Single projected sub-record.
    Record(Projection),
    /// Projected sequence of sub-records, in source order.
    Records(Vec<Projection>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record(&self) -> Option<&Projection> {
        match self {
            Value::Record(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[Projection]> {
        match self {
            Value::Records(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Wire-name → value map produced for one record.
///
/// Keeps spec order for display and serialization. Equality ignores order.
/// Inserting an existing wire name replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    entries: Vec<(String, Value)>,
}

impl Projection {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_json(self) -> serde_json::Value {
        self.into()
    }
}

impl PartialEq for Projection {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Projection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut p = Projection::new();
        for (k, v) in iter {
            p.insert(k, v);
        }
        p
    }
}

impl IntoIterator for Projection {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ---------------------------------------------------------------------------
// serde / serde_json
// ---------------------------------------------------------------------------

impl serde::Serialize for Projection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int64(n) => serializer.serialize_i64(*n),
            Value::UInt64(n) => serializer.serialize_u64(*n),
            Value::Float64(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Record(p) => p.serialize(serializer),
            Value::Records(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<Projection> for serde_json::Value {
    fn from(p: Projection) -> Self {
        serde_json::Value::Object(p.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int64(n) => n.into(),
            Value::UInt64(n) => n.into(),
            // NaN and infinities have no JSON form.
            Value::Float64(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => items.into_iter().map(serde_json::Value::from).collect(),
            Value::Map(entries) => serde_json::Value::Object(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
            Value::Record(p) => p.into(),
            Value::Records(items) => items.into_iter().map(serde_json::Value::from).collect(),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    n.as_f64().map(Value::Float64).unwrap_or(Value::Null)
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Into<Value> for literals returned by computed fields
// ---------------------------------------------------------------------------

macro_rules! value_from {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )*
    };
}

value_from!(Int64 as i64: i8, i16, i32, i64, isize);
value_from!(UInt64 as u64: u8, u16, u32, u64, usize);
value_from!(Float64 as f64: f32, f64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Projection> for Value {
    fn from(v: Projection) -> Self {
        Value::Record(v)
    }
}

impl From<Vec<Projection>> for Value {
    fn from(v: Vec<Projection>) -> Self {
        Value::Records(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// ToValue: leaf field reads
// ---------------------------------------------------------------------------

/// Copy of a leaf field's current value.
///
/// Implemented for every type a derived record may expose as a leaf.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

macro_rules! to_value_copy {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

to_value_copy!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::from(self)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Arc<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Rc<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for VecDeque<T> {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ToValue::to_value).collect())
    }
}

impl<K: AsRef<str>, V: ToValue, S> ToValue for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.to_value()))
                .collect(),
        )
    }
}

impl<K: AsRef<str>, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.to_value()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_replaces_existing_key() {
        let mut p = Projection::new();
        p.insert("a", 1);
        p.insert("b", 2);
        p.insert("a", "x");
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("a"), Some(&Value::String("x".into())));
        assert_eq!(p.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn equality_ignores_order() {
        let a: Projection = [("x", 1), ("y", 2)].into_iter().collect();
        let b: Projection = [("y", 2), ("x", 1)].into_iter().collect();
        let c: Projection = [("x", 1)].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(c, a);
    }

    #[test]
    fn serializes_in_insertion_order() {
        let mut p = Projection::new();
        p.insert("zeta", true);
        p.insert("alpha", Value::Null);
        assert_eq!(
            serde_json::to_string(&p).unwrap(),
            r#"{"zeta":true,"alpha":null}"#
        );
    }

    #[test]
    fn converts_to_json_tree() {
        let mut inner = Projection::new();
        inner.insert("ok", true);
        let mut p = Projection::new();
        p.insert("name", "foo");
        p.insert("tags", vec!["a", "b"].to_value());
        p.insert("one", inner.clone());
        p.insert("many", vec![inner, Projection::new()]);
        p.insert("nan", f64::NAN);
        assert_eq!(
            p.into_json(),
            json!({
                "name": "foo",
                "tags": ["a", "b"],
                "one": {"ok": true},
                "many": [{"ok": true}, {}],
                "nan": null,
            })
        );
    }

    #[test]
    fn byte_vectors_project_as_arrays() {
        assert_eq!(
            vec![1u8, 2].to_value(),
            Value::Array(vec![Value::UInt64(1), Value::UInt64(2)])
        );
    }

    #[test]
    fn leaf_conversions() {
        assert_eq!(Some(42u8).to_value(), Value::UInt64(42));
        assert_eq!(None::<i32>.to_value(), Value::Null);
        assert_eq!(Box::new(-3i16).to_value(), Value::Int64(-3));
        assert_eq!('x'.to_value(), Value::String("x".into()));

        let mut m = HashMap::new();
        m.insert("k".to_string(), 1.5f64);
        assert_eq!(
            m.to_value(),
            Value::Map(BTreeMap::from([("k".to_string(), Value::Float64(1.5))]))
        );

        assert_eq!(
            json!({"n": 1, "s": [null]}).to_value(),
            Value::Map(BTreeMap::from([
                ("n".to_string(), Value::Int64(1)),
                ("s".to_string(), Value::Array(vec![Value::Null])),
            ]))
        );
    }
}
