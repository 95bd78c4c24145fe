use crate::agent::parser::extract_sql;
use crate::agent::prompt::build_sql_prompt;
use crate::error::Result;
use crate::llm::TextGenerator;
use crate::schema::{render_schema, DatabaseSchema};

/// ask the model for a query answering `question` and strip fence artifacts.
///
/// exactly one generator call is made. failures propagate to the caller.
#[tracing::instrument(skip(generator, schema), fields(llm.model = %generator.model_name(), question_len = question.len()))]
pub async fn generate_sql(
    generator: &dyn TextGenerator,
    question: &str,
    schema: &DatabaseSchema,
) -> Result<String> {
    let prompt = build_sql_prompt(question, &render_schema(schema));
    tracing::debug!(prompt_len = prompt.len(), "prompt built");

    let output = generator.generate(&prompt).await?;
    let sql = extract_sql(&output)?;

    tracing::info!(sql_len = sql.len(), "sql generated");
    Ok(sql)
}
