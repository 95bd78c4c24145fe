use crate::error::{Result, SqlGenError};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::Path;

/// a single table and its columns in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

/// table name to ordered column names, in the order sqlite reports tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseSchema {
    pub tables: Vec<TableSchema>,
}

impl DatabaseSchema {
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

const TABLE_NAMES_SQL: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
     ORDER BY name";

const TABLE_COLUMNS_SQL: &str = "SELECT name FROM pragma_table_info(?1) ORDER BY cid";

#[tracing::instrument(skip(path), fields(db = %path.display()))]
pub fn inspect_schema(path: &Path) -> Result<DatabaseSchema> {
    if !path.is_file() {
        return Err(SqlGenError::Schema(format!(
            "database file not found: {}",
            path.display()
        )));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    let table_names: Vec<String> = {
        let mut stmt = conn.prepare(TABLE_NAMES_SQL)?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        names
    };

    let mut tables = Vec::with_capacity(table_names.len());
    let mut stmt = conn.prepare(TABLE_COLUMNS_SQL)?;
    for name in table_names {
        let columns = stmt
            .query_map([&name], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        tables.push(TableSchema { name, columns });
    }

    let schema = DatabaseSchema::new(tables);
    tracing::info!(
        tables = schema.tables.len(),
        columns = schema.column_count(),
        "inspected database schema"
    );

    Ok(schema)
}

/// render the schema as one `Table T: c1, c2` line per table
pub fn render_schema(schema: &DatabaseSchema) -> String {
    schema
        .tables
        .iter()
        .map(|t| format!("Table {}: {}", t.name, t.columns.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_db(dir: &tempfile::TempDir, ddl: &str) -> std::path::PathBuf {
        let path = dir.path().join("test.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(ddl).unwrap();
        path
    }

    #[test]
    fn test_inspect_schema_orders_tables_and_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(
            &dir,
            "CREATE TABLE Students (Id INTEGER PRIMARY KEY, Name TEXT, Grade INTEGER);
             CREATE TABLE classes (class_id INTEGER, Title TEXT);",
        );

        let schema = inspect_schema(&path).unwrap();

        assert_eq!(
            schema.tables,
            vec![
                TableSchema {
                    name: "Students".to_string(),
                    columns: vec!["Id".into(), "Name".into(), "Grade".into()],
                },
                TableSchema {
                    name: "classes".to_string(),
                    columns: vec!["class_id".into(), "Title".into()],
                },
            ]
        );
    }

    #[test]
    fn test_inspect_schema_skips_internal_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(
            &dir,
            "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, v TEXT);
             INSERT INTO t (v) VALUES ('x');",
        );

        let schema = inspect_schema(&path).unwrap();
        assert_eq!(schema.tables.len(), 1);
        assert!(schema.table("sqlite_sequence").is_none());
    }

    #[test]
    fn test_inspect_schema_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = inspect_schema(&dir.path().join("nope.db"));
        assert!(matches!(result, Err(SqlGenError::Schema(_))));
    }

    #[test]
    fn test_inspect_schema_not_a_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.db");
        std::fs::write(&path, b"this is definitely not a sqlite file, just some text").unwrap();

        let result = inspect_schema(&path);
        assert!(matches!(result, Err(SqlGenError::Sqlite(_))));
    }

    #[test]
    fn test_render_schema() {
        let schema = DatabaseSchema::new(vec![
            TableSchema {
                name: "students".to_string(),
                columns: vec!["id".into(), "name".into()],
            },
            TableSchema {
                name: "teachers".to_string(),
                columns: vec!["id".into()],
            },
        ]);

        assert_eq!(
            render_schema(&schema),
            "Table students: id, name\nTable teachers: id"
        );
    }
}
