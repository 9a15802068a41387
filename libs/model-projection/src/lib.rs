//! Whitelist-driven projection of typed records into generic key-value trees.

// Lets `#[derive(Record)]` output (which names `::model_projection`) resolve
// inside this crate's own tests.
extern crate self as model_projection;

pub use model_projection_derive::Record;
pub mod error;
pub mod filter;
pub mod project;
pub mod record;
pub mod spec;
pub mod value;
pub mod views;

pub use error::ProjectionError;
pub use filter::{filter_fields, filter_map_fields, AllowList};
pub use project::{serialize, serialize_all, serialize_list};
pub use record::{AsRecord, FieldInfo, FieldRef, NestedField, NestedRef, Record};
pub use spec::{Computed, FieldSpec, Spec};
pub use value::{Projection, ToValue, Value};
pub use views::ViewRegistry;
