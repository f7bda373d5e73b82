pub mod config;
pub mod error;
pub mod field_schema;
pub mod path;
pub mod recipient;
pub mod value;

pub use config::Config;
pub use error::*;
pub use field_schema::{DirectoryDocument, FieldSchema, SchemaEntry};
pub use path::FieldPath;
pub use recipient::{Recipient, RecipientId, Record};
pub use value::{FieldKind, FieldValue};
