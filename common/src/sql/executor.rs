use crate::error::{Result, SqlGenError};
use crate::sql::value::{ResultRow, SqlValue};
use rusqlite::{Batch, Connection, OpenFlags, Statement};
use serde::Serialize;
use std::path::Path;

/// which statements the executor is willing to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// open the database read-only and reject statements that would write
    #[default]
    ReadOnly,
    /// run any single statement inside a transaction and commit it
    AllowWrites,
}

/// rows on success, a message on failure. never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<ResultRow>,
    },
    Failed {
        message: String,
    },
}

impl QueryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed { .. })
    }

    pub fn rows(&self) -> Option<&[ResultRow]> {
        match self {
            QueryOutcome::Rows { rows, .. } => Some(rows),
            QueryOutcome::Failed { .. } => None,
        }
    }
}

/// run `sql` as a single statement against the database at `path`.
///
/// every failure is folded into [`QueryOutcome::Failed`].
#[tracing::instrument(skip(sql, path), fields(db = %path.display(), sql_len = sql.len()))]
pub fn execute_query(sql: &str, path: &Path, policy: ExecutionPolicy) -> QueryOutcome {
    match run_statement(sql, path, policy) {
        Ok((columns, rows)) => {
            tracing::info!(rows = rows.len(), columns = columns.len(), "query executed");
            QueryOutcome::Rows { columns, rows }
        }
        Err(e) => {
            tracing::warn!("query failed: {}", e);
            let message = match e {
                SqlGenError::Sqlite(inner) => inner.to_string(),
                other => other.to_string(),
            };
            QueryOutcome::Failed { message }
        }
    }
}

fn run_statement(
    sql: &str,
    path: &Path,
    policy: ExecutionPolicy,
) -> Result<(Vec<String>, Vec<ResultRow>)> {
    match policy {
        ExecutionPolicy::ReadOnly => {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            let mut stmt = prepare_single(&conn, sql)?;
            if !stmt.readonly() {
                return Err(SqlGenError::Validation(
                    "only read-only statements are allowed (start the server with --allow-writes to run it)"
                        .to_string(),
                ));
            }
            fetch_all(&mut stmt)
        }
        ExecutionPolicy::AllowWrites => {
            let mut conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            let tx = conn.transaction()?;
            let result = {
                let mut stmt = prepare_single(&tx, sql)?;
                fetch_all(&mut stmt)?
            };
            tx.commit()?;
            Ok(result)
        }
    }
}

/// prepare exactly one statement; empty and comment-only tails are fine
fn prepare_single<'c>(conn: &'c Connection, sql: &str) -> Result<Statement<'c>> {
    let mut batch = Batch::new(conn, sql);
    let stmt = batch
        .next()?
        .ok_or_else(|| SqlGenError::Validation("the query contains no statement".to_string()))?;
    if batch.next()?.is_some() {
        return Err(SqlGenError::Validation(
            "You can only execute one statement at a time.".to_string(),
        ));
    }
    Ok(stmt)
}

fn fetch_all(stmt: &mut Statement<'_>) -> Result<(Vec<String>, Vec<ResultRow>)> {
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = stmt.column_count();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(SqlValue::from(row.get_ref(i)?));
        }
        out.push(values);
    }

    Ok((columns, out))
}
