use crate::schema::DatabaseSchema;
use std::collections::HashMap;

/// lowercased name to canonical name. table names win over column names and
/// earlier entries win over later ones.
fn canonical_names(schema: &DatabaseSchema) -> HashMap<String, &str> {
    let mut names = HashMap::new();

    for table in &schema.tables {
        names
            .entry(table.name.to_lowercase())
            .or_insert(table.name.as_str());
    }

    for table in &schema.tables {
        for column in &table.columns {
            names
                .entry(column.to_lowercase())
                .or_insert(column.as_str());
        }
    }

    names
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit() || b == b'$'
}

/// index just past the closing quote, honoring doubled-quote escapes.
/// returns `bytes.len()` when the quote is never closed.
fn quoted_end(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut j = start + 1;
    while j < bytes.len() {
        if bytes[j] == quote {
            if bytes.get(j + 1) == Some(&quote) {
                j += 2;
                continue;
            }
            return j + 1;
        }
        j += 1;
    }
    bytes.len()
}

fn find_from(bytes: &[u8], start: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(start..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + start)
}

/// rewrite table and column names in `query` to the exact case used by the
/// database.
///
/// only whole identifiers are considered: bare words and the bodies of
/// `"..."`, `` `...` `` and `[...]` quoted identifiers. string literals and
/// comments pass through untouched, as does every other byte.
#[tracing::instrument(skip_all, fields(query_len = query.len()))]
pub fn correct_query(query: &str, schema: &DatabaseSchema) -> String {
    let names = canonical_names(schema);
    if names.is_empty() {
        return query.to_string();
    }

    let bytes = query.as_bytes();
    let mut out = String::with_capacity(query.len());
    let mut rewrites = 0usize;
    let mut i = 0;

    let mut push_ident = |out: &mut String, word: &str| match names.get(&word.to_lowercase()) {
        Some(canonical) => {
            if *canonical != word {
                rewrites += 1;
            }
            out.push_str(canonical);
        }
        None => out.push_str(word),
    };

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\'' => {
                let end = quoted_end(bytes, i, b'\'');
                out.push_str(&query[i..end]);
                i = end;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                let end = find_from(bytes, i, b"\n").unwrap_or(bytes.len());
                out.push_str(&query[i..end]);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = find_from(bytes, i + 2, b"*/")
                    .map(|p| p + 2)
                    .unwrap_or(bytes.len());
                out.push_str(&query[i..end]);
                i = end;
            }
            b'"' | b'`' | b'[' => {
                let close = if b == b'[' { b']' } else { b };
                let end = if b == b'[' {
                    find_from(bytes, i + 1, b"]")
                        .map(|p| p + 1)
                        .unwrap_or(bytes.len())
                } else {
                    quoted_end(bytes, i, b)
                };

                let closed = end >= i + 2 && bytes[end - 1] == close;
                let body = if closed { &query[i + 1..end - 1] } else { "" };
                let escaped = b != b'[' && body.as_bytes().contains(&close);

                if closed && !body.is_empty() && !escaped {
                    out.push(b as char);
                    push_ident(&mut out, body);
                    out.push(close as char);
                } else {
                    out.push_str(&query[i..end]);
                }
                i = end;
            }
            b if is_ident_start(b) => {
                let mut end = i + 1;
                while end < bytes.len() && is_ident_char(bytes[end]) {
                    end += 1;
                }
                push_ident(&mut out, &query[i..end]);
                i = end;
            }
            b if b.is_ascii_digit() => {
                // numeric literals such as 1e5 or 0x1f are not identifiers
                let mut end = i + 1;
                while end < bytes.len() && (is_ident_char(bytes[end]) || bytes[end] == b'.') {
                    end += 1;
                }
                out.push_str(&query[i..end]);
                i = end;
            }
            _ => {
                out.push(b as char);
                i += 1;
            }
        }
    }

    tracing::debug!(rewrites, "corrected identifier casing");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableSchema;
    use pretty_assertions::assert_eq;

    fn schema(tables: &[(&str, &[&str])]) -> DatabaseSchema {
        DatabaseSchema::new(
            tables
                .iter()
                .map(|(name, columns)| TableSchema {
                    name: name.to_string(),
                    columns: columns.iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_correct_table_case() {
        let schema = schema(&[("students", &["id", "name"])]);
        assert_eq!(
            correct_query("SELECT COUNT(*) FROM STUDENTS;", &schema),
            "SELECT COUNT(*) FROM students;"
        );
    }

    #[test]
    fn test_correct_mixed_case_canonical_names() {
        let schema = schema(&[("Orders", &["OrderID", "CustomerName"])]);
        assert_eq!(
            correct_query(
                "select orderid, CUSTOMERNAME from orders where ORDERS.orderId > 10",
                &schema
            ),
            "select OrderID, CustomerName from Orders where Orders.OrderID > 10"
        );
    }

    #[test]
    fn test_correct_leaves_canonical_tokens_unchanged() {
        let schema = schema(&[("Orders", &["OrderID", "CustomerName"])]);
        let query = "SELECT OrderID, CustomerName FROM Orders ORDER BY OrderID DESC;";
        assert_eq!(correct_query(query, &schema), query);
    }

    #[test]
    fn test_correct_is_idempotent() {
        let schema = schema(&[
            ("Students", &["Id", "Name", "ClassId"]),
            ("classes", &["ClassId", "Title"]),
        ]);
        let queries = [
            "SELECT name FROM STUDENTS s JOIN CLASSES c ON s.classid = c.CLASSID",
            "select \"NAME\", [title] from students, classes -- students\n",
            "SELECT COUNT(*) FROM students WHERE name = 'STUDENTS'",
        ];

        for query in queries {
            let once = correct_query(query, &schema);
            let twice = correct_query(&once, &schema);
            assert_eq!(once, twice, "not idempotent for {:?}", query);
        }
    }

    #[test]
    fn test_correct_does_not_clobber_substrings() {
        let schema = schema(&[
            ("students", &["id", "name"]),
            ("enrollments", &["student_id", "course_id", "Identifier"]),
        ]);
        assert_eq!(
            correct_query(
                "SELECT ID, STUDENT_ID, identifier FROM ENROLLMENTS e JOIN students s ON s.id = e.student_id",
                &schema
            ),
            "SELECT id, student_id, Identifier FROM enrollments e JOIN students s ON s.id = e.student_id"
        );
    }

    #[test]
    fn test_correct_skips_string_literals_and_comments() {
        let schema = schema(&[("students", &["name"])]);
        assert_eq!(
            correct_query(
                "SELECT NAME FROM STUDENTS WHERE NAME = 'STUDENTS it''s NAME' /* STUDENTS */ -- NAME",
                &schema
            ),
            "SELECT name FROM students WHERE name = 'STUDENTS it''s NAME' /* STUDENTS */ -- NAME"
        );
    }

    #[test]
    fn test_correct_quoted_identifiers() {
        let schema = schema(&[("Students", &["FullName"])]);
        assert_eq!(
            correct_query("SELECT \"fullname\", `FULLNAME` FROM [students]", &schema),
            "SELECT \"FullName\", `FullName` FROM [Students]"
        );
    }

    #[test]
    fn test_correct_table_wins_over_column() {
        let schema = schema(&[("Items", &["id"]), ("Orders", &["items"])]);
        assert_eq!(
            correct_query("SELECT ITEMS FROM ITEMS", &schema),
            "SELECT Items FROM Items"
        );
    }

    #[test]
    fn test_correct_preserves_unknown_tokens_and_unicode() {
        let schema = schema(&[("students", &["name"])]);
        assert_eq!(
            correct_query("SELECT NAME AS naïve, 1e5 FROM Students WHERE x = 'é'", &schema),
            "SELECT name AS naïve, 1e5 FROM students WHERE x = 'é'"
        );
    }

    #[test]
    fn test_correct_empty_schema_is_noop() {
        let schema = DatabaseSchema::default();
        assert_eq!(correct_query("SELECT 1", &schema), "SELECT 1");
    }
}
