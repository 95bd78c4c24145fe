pub mod executor;
pub mod value;

pub use executor::{execute_query, ExecutionPolicy, QueryOutcome};
pub use value::{format_row, ResultRow, SqlValue};
