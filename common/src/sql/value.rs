use rusqlite::types::ValueRef;
use serde::Serialize;
use std::fmt;

/// one cell of a result row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(v) => SqlValue::Integer(v),
            ValueRef::Real(v) => SqlValue::Real(v),
            ValueRef::Text(v) => SqlValue::Text(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => SqlValue::Blob(v.to_vec()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("None"),
            SqlValue::Integer(v) => write!(f, "{}", v),
            // debug keeps the trailing .0 on whole numbers
            SqlValue::Real(v) => write!(f, "{:?}", v),
            SqlValue::Text(v) => write!(f, "'{}'", v.replace('\'', "\\'")),
            SqlValue::Blob(v) => write!(f, "<blob {} bytes>", v.len()),
        }
    }
}

pub type ResultRow = Vec<SqlValue>;

/// render a row as a tuple, e.g. `(1, 'Alice')`. a single cell keeps the
/// trailing comma: `('Alice',)`
pub fn format_row(row: &[SqlValue]) -> String {
    let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
    match cells.as_slice() {
        [only] => format!("({},)", only),
        _ => format!("({})", cells.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row() {
        let row = vec![
            SqlValue::Integer(1),
            SqlValue::Text("Alice".to_string()),
            SqlValue::Real(3.0),
            SqlValue::Null,
            SqlValue::Blob(vec![0, 1, 2]),
        ];
        assert_eq!(format_row(&row), "(1, 'Alice', 3.0, None, <blob 3 bytes>)");
    }

    #[test]
    fn test_format_single_cell_row() {
        assert_eq!(format_row(&[SqlValue::Text("Alice".to_string())]), "('Alice',)");
        assert_eq!(format_row(&[SqlValue::Integer(3)]), "(3,)");
        assert_eq!(format_row(&[]), "()");
    }

    #[test]
    fn test_text_quotes_are_escaped() {
        assert_eq!(SqlValue::Text("it's".to_string()).to_string(), "'it\\'s'");
    }

    #[test]
    fn test_serialize_untagged() {
        let row = vec![SqlValue::Integer(7), SqlValue::Text("x".into()), SqlValue::Null];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"[7,"x",null]"#);
    }
}
