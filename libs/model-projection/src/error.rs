/// Contract violation detected while projecting or parsing a spec.
///
/// These describe a mismatch between a spec and the record type it is
/// applied to, not a transient condition. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    /// A projected field has no `#[json(name = "...")]` metadata.
    #[error("Field \"{field}\" has no json tag")]
    MissingWireName { field: String },

    /// A nested spec entry targets a field that is not a record,
    /// pointer to a record, or sequence of records.
    #[error("field \"{field}\" of type `{kind}` cannot be projected as a nested record")]
    UnsupportedNestedKind { field: String, kind: &'static str },

    /// A declarative spec element is neither a field name nor a nested mapping.
    #[error("unknown field spec entry: {0}")]
    UnknownSpecEntry(String),

    #[error("record `{record}` has no field \"{field}\"")]
    UnknownField { record: &'static str, field: String },

    #[error("view \"{0}\" is not registered")]
    UnknownView(String),

    /// A typed computed entry was applied to a record of another type.
    #[error("computed field expects `{expected}`, got `{found}`")]
    RecordMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl ProjectionError {
    /// Prefix the offending field with its parent field path.
    ///
    /// Produces `parent.child` for field-carrying variants; other variants
    /// are returned unchanged.
    pub fn with_context(self, parent: &str) -> Self {
        match self {
            ProjectionError::MissingWireName { field } => ProjectionError::MissingWireName {
                field: format!("{parent}.{field}"),
            },
            ProjectionError::UnsupportedNestedKind { field, kind } => {
                ProjectionError::UnsupportedNestedKind {
                    field: format!("{parent}.{field}"),
                    kind,
                }
            }
            ProjectionError::UnknownField { record, field } => ProjectionError::UnknownField {
                record,
                field: format!("{parent}.{field}"),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_wire_name_message() {
        let e = ProjectionError::MissingWireName {
            field: "field1".into(),
        };
        assert_eq!(e.to_string(), "Field \"field1\" has no json tag");
    }

    #[test]
    fn context_nests_field_path() {
        let e = ProjectionError::MissingWireName {
            field: "inner".into(),
        }
        .with_context("outer")
        .with_context("root");
        assert_eq!(e.to_string(), "Field \"root.outer.inner\" has no json tag");
    }

    #[test]
    fn context_keeps_spec_errors() {
        let e = ProjectionError::UnknownSpecEntry("42".into()).with_context("outer");
        assert_eq!(e, ProjectionError::UnknownSpecEntry("42".into()));
    }
}
