pub mod schema;
pub mod types;

pub use schema::{Schema, SchemaProvider, SchemaVer, SchemaWriter};
pub use types::{FieldDef, FieldType};
