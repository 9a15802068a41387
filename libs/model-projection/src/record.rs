use std::any::Any;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use crate::value::Value;

/// Static description of one record field.
///
/// Generated once per record type by `#[derive(Record)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Internal (Rust) field name, as used in specs.
    pub name: &'static str,
    /// External key from `#[json(name = "...")]`. `None` → not projectable.
    pub wire_name: Option<&'static str>,
    /// Declared type, as written in the struct.
    pub type_name: &'static str,
    /// Declared as `Option<_>` or marked `#[json(nilable)]`; the only fields
    /// `filter_fields` may clear.
    pub nilable: bool,
    /// Marked `#[json(nested)]`; read through `NestedField`.
    pub nested: bool,
}

/// Current content of a field, as seen by the projection engine.
pub enum FieldRef<'a> {
    Value(Value),
    Nested(NestedRef<'a>),
}

/// Sub-record(s) reachable through a nested field.
pub enum NestedRef<'a> {
    /// Record embedded by value.
    Record(&'a dyn Record),
    /// Pointer to a record; `None` when absent.
    Pointer(Option<&'a dyn Record>),
    /// Fixed- or variable-length sequence of (possibly absent) records.
    Sequence(Vec<Option<&'a dyn Record>>),
}

/// Structured value with a fixed set of named fields.
///
/// Derive it with `#[derive(Record)]`; hand-written impls must keep
/// `field_table` and `read_field` consistent, and also implement
/// `AsRecord` (to be passed to `serialize`) and `NestedField` (to be
/// embedded by value in another record's nested field).
pub trait Record: Any {
    /// Type name for diagnostics.
    fn record_name(&self) -> &'static str;

    fn field_table(&self) -> &'static [FieldInfo];

    /// `None` if the record declares no field called `name`.
    fn read_field(&self, name: &str) -> Option<FieldRef<'_>>;

    /// Reset a nilable field to `None`. Returns `true` if a value was
    /// removed; unknown and non-nilable fields are left untouched.
    fn clear_field(&mut self, name: &str) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn field_info(&self, name: &str) -> Option<&'static FieldInfo> {
        self.field_table().iter().find(|f| f.name == name)
    }
}

/// Handle that may or may not point at a record.
pub trait AsRecord {
    fn as_record(&self) -> Option<&dyn Record>;
}

impl AsRecord for dyn Record {
    fn as_record(&self) -> Option<&dyn Record> {
        Some(self)
    }
}

impl<P: AsRecord + ?Sized> AsRecord for &P {
    fn as_record(&self) -> Option<&dyn Record> {
        (**self).as_record()
    }
}

impl<P: AsRecord + ?Sized> AsRecord for &mut P {
    fn as_record(&self) -> Option<&dyn Record> {
        (**self).as_record()
    }
}

impl<P: AsRecord + ?Sized> AsRecord for Box<P> {
    fn as_record(&self) -> Option<&dyn Record> {
        (**self).as_record()
    }
}

impl<P: AsRecord + ?Sized> AsRecord for Arc<P> {
    fn as_record(&self) -> Option<&dyn Record> {
        (**self).as_record()
    }
}

impl<P: AsRecord + ?Sized> AsRecord for Rc<P> {
    fn as_record(&self) -> Option<&dyn Record> {
        (**self).as_record()
    }
}

impl<P: AsRecord> AsRecord for Option<P> {
    fn as_record(&self) -> Option<&dyn Record> {
        self.as_ref().and_then(AsRecord::as_record)
    }
}

/// Field type that a nested spec entry may descend into.
///
/// Derived records implement it as the value-record kind. Dictionaries
/// and primitives never implement it.
pub trait NestedField {
    fn nested(&self) -> NestedRef<'_>;
}

macro_rules! nested_pointer {
    ($($ptr:ident),*) => {
        $(
            impl<P: AsRecord + ?Sized> NestedField for $ptr<P> {
                fn nested(&self) -> NestedRef<'_> {
                    NestedRef::Pointer(self.as_record())
                }
            }
        )*
    };
}

nested_pointer!(Box, Arc, Rc);

impl<P: AsRecord + ?Sized> NestedField for &P {
    fn nested(&self) -> NestedRef<'_> {
        NestedRef::Pointer(self.as_record())
    }
}

impl<P: AsRecord> NestedField for Option<P> {
    fn nested(&self) -> NestedRef<'_> {
        NestedRef::Pointer(self.as_record())
    }
}

fn sequence<'a, P: AsRecord + 'a>(items: impl Iterator<Item = &'a P>) -> NestedRef<'a> {
    NestedRef::Sequence(items.map(AsRecord::as_record).collect())
}

impl<P: AsRecord> NestedField for Vec<P> {
    fn nested(&self) -> NestedRef<'_> {
        sequence(self.iter())
    }
}

impl<P: AsRecord, const N: usize> NestedField for [P; N] {
    fn nested(&self) -> NestedRef<'_> {
        sequence(self.iter())
    }
}

impl<P: AsRecord> NestedField for VecDeque<P> {
    fn nested(&self) -> NestedRef<'_> {
        sequence(self.iter())
    }
}
