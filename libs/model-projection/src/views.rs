use crate::error::ProjectionError;
use crate::project::serialize;
use crate::record::AsRecord;
use crate::spec::Spec;
use crate::value::Projection;

/// Named projection specs ("views"), typically loaded from configuration.
///
/// ```json
/// {
///     "summary": ["id", "name"],
///     "detail": ["id", "name", {"owner": ["name", "email"]}]
/// }
/// ```
///
/// Computed entries cannot be expressed in JSON; add them after loading
/// through `get_mut(..).push(..)`.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    views: Vec<(String, Spec)>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self { views: Vec::new() }
    }

    /// Register `spec` under `name`, replacing an existing view of that name.
    pub fn set(&mut self, name: impl Into<String>, spec: Spec) {
        let name = name.into();
        if let Some(entry) = self.views.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = spec;
        } else {
            self.views.push((name, spec));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Spec> {
        self.views.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Spec> {
        self.views
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Project `record` through the view called `view`.
    pub fn project<H: AsRecord>(&self, view: &str, record: H) -> Result<Projection, ProjectionError> {
        let spec = self
            .get(view)
            .ok_or_else(|| ProjectionError::UnknownView(view.to_string()))?;
        serialize(record, spec)
    }

    /// Build from a JSON object mapping view names to spec arrays.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ProjectionError> {
        let views = value
            .as_object()
            .ok_or_else(|| ProjectionError::UnknownSpecEntry(value.to_string()))?;
        let mut registry = ViewRegistry::new();
        for (name, spec) in views {
            let spec = Spec::from_json(spec).map_err(|e| match e {
                ProjectionError::UnknownSpecEntry(entry) => {
                    ProjectionError::UnknownSpecEntry(format!("view {name}: {entry}"))
                }
                other => other,
            })?;
            registry.set(name.clone(), spec);
        }
        Ok(registry)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl<'de> serde::Deserialize<'de> for ViewRegistry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
        ViewRegistry::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::FieldSpec;

    #[test]
    fn loads_views_from_json() {
        let registry = ViewRegistry::from_json_str(
            r#"{"summary": ["id"], "detail": ["id", {"owner": ["name"]}]}"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("summary").map(Spec::len), Some(1));
        assert_eq!(registry.get("detail").map(Spec::len), Some(2));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn rejects_malformed_views() {
        assert!(ViewRegistry::from_json_str(r#"["id"]"#).is_err());
        let err = ViewRegistry::from_json(&serde_json::json!({"summary": [1]})).unwrap_err();
        assert_eq!(err, ProjectionError::UnknownSpecEntry("view summary: 1".into()));
    }

    #[test]
    fn set_replaces_and_keeps_order() {
        let mut registry = ViewRegistry::new();
        registry.set("b", Spec::from(["x"]));
        registry.set("a", Spec::new());
        registry.set("b", Spec::from(["x", "y"]));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(registry.get("b").map(Spec::len), Some(2));
    }

    #[test]
    fn computed_entries_added_after_loading() {
        let mut registry = ViewRegistry::from_json_str(r#"{"v": ["id"]}"#).unwrap();
        registry
            .get_mut("v")
            .unwrap()
            .push(FieldSpec::computed_dyn(|_| ("kind", "record")));
        assert_eq!(registry.get("v").map(Spec::len), Some(2));
    }

    #[test]
    fn unknown_view_is_an_error() {
        let registry = ViewRegistry::new();
        let err = registry.project("nope", None::<&dyn crate::Record>).unwrap_err();
        assert_eq!(err, ProjectionError::UnknownView("nope".into()));
    }
}
