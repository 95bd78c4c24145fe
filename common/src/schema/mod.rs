pub mod inspector;

pub use inspector::{inspect_schema, render_schema, DatabaseSchema, TableSchema};
