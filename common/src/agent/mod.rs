pub mod prompt;
pub mod parser;
pub mod corrector;
pub mod executor;

pub use prompt::build_sql_prompt;
pub use parser::extract_sql;
pub use corrector::correct_query;
pub use executor::generate_sql;
