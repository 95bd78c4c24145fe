/// question and answer shown to the model as the worked example
pub const EXAMPLE_QUESTION: &str = "How many entries are in the students table?";
pub const EXAMPLE_SQL: &str = "SELECT COUNT(*) FROM students;";

/// compose the single instruction sent to the model.
///
/// `schema_text` is the listing produced by [`crate::schema::render_schema`].
pub fn build_sql_prompt(question: &str, schema_text: &str) -> String {
    let schema_text = if schema_text.trim().is_empty() {
        "(the database has no tables)"
    } else {
        schema_text
    };

    format!(
        "You are an expert in converting English questions to SQL query.\n\
         The SQL database has the following tables and columns:\n\n\
         {}\n\n\
         The SQL query should match the schema and should not include any invalid table or column names.\n\
         Ensure that the query does not start or end with backticks (```).\n\n\
         Example:\n\
         Question: {}\n\
         SQL command: {}\n\n\
         Now, for the given question: \"{}\", please generate a valid SQL query.",
        schema_text,
        EXAMPLE_QUESTION,
        EXAMPLE_SQL,
        question.trim()
    )
}
