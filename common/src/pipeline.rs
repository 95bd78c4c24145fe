use crate::agent::{correct_query, generate_sql};
use crate::error::{Result, SqlGenError};
use crate::llm::TextGenerator;
use crate::schema::inspect_schema;
use crate::sql::{execute_query, ExecutionPolicy, QueryOutcome};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a valid question.";

/// an uploaded database as received from the form
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// what the user sees after a submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub generated_sql: String,
    pub corrected_sql: String,
    pub outcome: QueryOutcome,
}

/// reject empty or whitespace-only questions
pub fn validate_question(question: &str) -> Result<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(SqlGenError::Validation(EMPTY_QUESTION_MESSAGE.to_string()));
    }
    Ok(question)
}

/// the upload must be present and carry a `.db` file name. a zero-byte file is
/// accepted, sqlite reads it as a database with no tables.
pub fn validate_upload(upload: Option<&Upload>) -> Result<&Upload> {
    let upload = upload.ok_or_else(|| {
        SqlGenError::Upload("Please upload a SQLite database (.db) file.".to_string())
    })?;

    let is_db = Path::new(&upload.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("db"))
        .unwrap_or(false);
    if !is_db {
        return Err(SqlGenError::Upload(format!(
            "unsupported file '{}': expected a .db file",
            upload.file_name
        )));
    }

    Ok(upload)
}

/// upload -> schema -> prompt -> model -> correction -> execution
pub struct Pipeline {
    generator: Arc<dyn TextGenerator>,
    database_path: PathBuf,
    policy: ExecutionPolicy,
    // every submission writes the same file
    submission_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        database_path: impl Into<PathBuf>,
        policy: ExecutionPolicy,
    ) -> Self {
        Self {
            generator,
            database_path: database_path.into(),
            policy,
            submission_lock: Mutex::new(()),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    /// validate inputs, then run every stage in order.
    ///
    /// validation happens before anything is written or sent.
    #[tracing::instrument(skip_all, fields(question_len = question.len()))]
    pub async fn run(&self, question: &str, upload: Option<&Upload>) -> Result<PipelineReport> {
        let question = validate_question(question)?;
        let upload = validate_upload(upload)?;

        let _guard = self.submission_lock.lock().await;

        self.persist_upload(upload).await?;

        let path = self.database_path.clone();
        let schema = tokio::task::spawn_blocking(move || inspect_schema(&path))
            .await
            .map_err(|e| SqlGenError::Task(e.to_string()))??;
        if schema.is_empty() {
            tracing::warn!("uploaded database has no tables");
        }

        let generated_sql = generate_sql(self.generator.as_ref(), question, &schema).await?;

        let corrected_sql = correct_query(&generated_sql, &schema);
        if corrected_sql != generated_sql {
            tracing::info!("query casing corrected against schema");
        }

        let sql = corrected_sql.clone();
        let path = self.database_path.clone();
        let policy = self.policy;
        let outcome = tokio::task::spawn_blocking(move || execute_query(&sql, &path, policy))
            .await
            .map_err(|e| SqlGenError::Task(e.to_string()))?;

        Ok(PipelineReport {
            generated_sql,
            corrected_sql,
            outcome,
        })
    }

    #[tracing::instrument(skip_all, fields(file = %upload.file_name, bytes = upload.bytes.len()))]
    async fn persist_upload(&self, upload: &Upload) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.database_path, &upload.bytes).await?;
        tracing::info!(path = %self.database_path.display(), "stored uploaded database");
        Ok(())
    }
}
