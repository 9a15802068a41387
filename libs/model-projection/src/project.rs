use crate::error::ProjectionError;
use crate::record::{AsRecord, FieldInfo, FieldRef, NestedRef, Record};
use crate::spec::{FieldSpec, Spec};
use crate::value::{Projection, Value};

/// Project one record through `spec`.
///
/// An absent record (`None`, `Option<Box<_>>::None`, ...) yields an empty
/// projection. Every other failure is a spec/record mismatch and aborts
/// the whole call.
pub fn serialize<H: AsRecord>(record: H, spec: &Spec) -> Result<Projection, ProjectionError> {
    project(record.as_record(), spec)
}

/// Project each record independently. Output order and length match the input.
pub fn serialize_list<I>(records: I, spec: &Spec) -> Result<Vec<Projection>, ProjectionError>
where
    I: IntoIterator,
    I::Item: AsRecord,
{
    records
        .into_iter()
        .map(|record| serialize(record, spec))
        .collect()
}

/// Project every field that carries a wire name, descending into nested
/// fields the same way. Fields without a wire name are skipped.
pub fn serialize_all<H: AsRecord>(record: H) -> Result<Projection, ProjectionError> {
    project_all(record.as_record())
}

fn project(record: Option<&dyn Record>, spec: &Spec) -> Result<Projection, ProjectionError> {
    let mut result = Projection::new();
    let Some(record) = record else {
        return Ok(result);
    };

    tracing::trace!(
        record = record.record_name(),
        entries = spec.len(),
        "projecting record"
    );

    for entry in spec {
        match entry {
            FieldSpec::Leaf(name) => {
                let (info, field) = lookup(record, name)?;
                let wire = wire_name(info)?;
                result.insert(wire, leaf_value(name, field)?);
            }
            FieldSpec::Computed(computed) => {
                let (wire, value) = computed.call(record)?;
                result.insert(wire, value);
            }
            FieldSpec::Nested(name, child) => {
                let (info, field) = lookup(record, name)?;
                let wire = wire_name(info)?;
                let FieldRef::Nested(nested) = field else {
                    return Err(ProjectionError::UnsupportedNestedKind {
                        field: name.clone(),
                        kind: info.type_name,
                    });
                };
                let value = resolve(nested, |sub| project(sub, child))
                    .map_err(|e| e.with_context(name))?;
                result.insert(wire, value);
            }
        }
    }
    Ok(result)
}

fn project_all(record: Option<&dyn Record>) -> Result<Projection, ProjectionError> {
    let mut result = Projection::new();
    let Some(record) = record else {
        return Ok(result);
    };

    for info in record.field_table() {
        let Some(wire) = info.wire_name else {
            continue;
        };
        let (_, field) = lookup(record, info.name)?;
        result.insert(wire, leaf_value(info.name, field)?);
    }
    Ok(result)
}

fn lookup<'r>(
    record: &'r dyn Record,
    name: &str,
) -> Result<(&'static FieldInfo, FieldRef<'r>), ProjectionError> {
    let unknown = || ProjectionError::UnknownField {
        record: record.record_name(),
        field: name.to_string(),
    };
    let info = record.field_info(name).ok_or_else(unknown)?;
    let field = record.read_field(name).ok_or_else(unknown)?;
    Ok((info, field))
}

fn wire_name(info: &FieldInfo) -> Result<&'static str, ProjectionError> {
    info.wire_name.ok_or_else(|| ProjectionError::MissingWireName {
        field: info.name.to_string(),
    })
}

/// Leaf copy. A nested field named as a leaf is copied whole.
fn leaf_value(name: &str, field: FieldRef<'_>) -> Result<Value, ProjectionError> {
    match field {
        FieldRef::Value(value) => Ok(value),
        FieldRef::Nested(nested) => resolve(nested, project_all).map_err(|e| e.with_context(name)),
    }
}

fn resolve<F>(nested: NestedRef<'_>, project_one: F) -> Result<Value, ProjectionError>
where
    F: Fn(Option<&dyn Record>) -> Result<Projection, ProjectionError>,
{
    match nested {
        NestedRef::Record(record) => Ok(Value::Record(project_one(Some(record))?)),
        NestedRef::Pointer(record) => Ok(Value::Record(project_one(record)?)),
        NestedRef::Sequence(items) => {
            let projected = items
                .into_iter()
                .map(&project_one)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Records(projected))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use serde_json::json;

    #[derive(crate::Record)]
    struct Leaf {
        #[json(name = "v")]
        v: u32,
    }

    /// Hand-written record: one tagged leaf, one untagged nested pointer.
    struct Manual {
        leaf: Box<Leaf>,
    }

    impl Record for Manual {
        fn record_name(&self) -> &'static str {
            "Manual"
        }

        fn field_table(&self) -> &'static [FieldInfo] {
            const FIELDS: &[FieldInfo] = &[
                FieldInfo {
                    name: "tagged",
                    wire_name: Some("t"),
                    type_name: "Box<Leaf>",
                    nilable: false,
                    nested: true,
                },
                FieldInfo {
                    name: "untagged",
                    wire_name: None,
                    type_name: "Box<Leaf>",
                    nilable: false,
                    nested: true,
                },
            ];
            FIELDS
        }

        fn read_field(&self, name: &str) -> Option<FieldRef<'_>> {
            match name {
                "tagged" | "untagged" => Some(FieldRef::Nested(crate::NestedField::nested(
                    &self.leaf,
                ))),
                _ => None,
            }
        }

        fn clear_field(&mut self, _name: &str) -> bool {
            false
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl AsRecord for Manual {
        fn as_record(&self) -> Option<&dyn Record> {
            Some(self)
        }
    }

    fn manual() -> Manual {
        Manual {
            leaf: Box::new(Leaf { v: 3 }),
        }
    }

    #[test]
    fn hand_written_record() {
        let spec = Spec::new().nested("tagged", ["v"]);
        assert_eq!(
            serialize(&manual(), &spec).unwrap().into_json(),
            json!({"t": {"v": 3}})
        );
    }

    #[test]
    fn nested_entry_checks_wire_name_first() {
        let spec = Spec::new().nested("untagged", ["v"]);
        assert_eq!(
            serialize(&manual(), &spec).unwrap_err(),
            ProjectionError::MissingWireName {
                field: "untagged".into()
            }
        );
    }

    #[test]
    fn nested_entry_on_leaf_field() {
        let spec = Spec::new().nested("v", ["x"]);
        assert_eq!(
            serialize(&Leaf { v: 1 }, &spec).unwrap_err(),
            ProjectionError::UnsupportedNestedKind {
                field: "v".into(),
                kind: "u32",
            }
        );
    }

    #[test]
    fn dyn_record_handle() {
        let leaf = Leaf { v: 9 };
        let record: &dyn Record = &leaf;
        assert_eq!(
            serialize(record, &Spec::from(["v"])).unwrap().into_json(),
            json!({"v": 9})
        );
        assert_eq!(serialize_all(record).unwrap().into_json(), json!({"v": 9}));
    }
}
