use crate::error::{Result, SqlGenError};
use once_cell::sync::Lazy;
use regex::Regex;

// a fenced block anywhere in the text. only a language tag we know counts as an
// info string, so `SELECT` on the fence line stays part of the query.
static FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:(?i:sqlite3|sqlite|sql)?[ \t]*\r?\n)?(.*?)```").unwrap()
});

// an opening fence that was never closed
static LEADING_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^```(?:(?i:sqlite3|sqlite|sql)?[ \t]*\r?\n)?").unwrap()
});

/// strip markdown code fences and surrounding whitespace from model output
pub fn extract_sql(text: &str) -> Result<String> {
    let text = text.trim();

    match FENCE_REGEX.captures(text).and_then(|c| c.get(1)) {
        Some(body) => finish(body.as_str()),
        None => {
            let unfenced = LEADING_FENCE_REGEX.replace(text, "");
            finish(unfenced.trim_end_matches('`'))
        }
    }
}

fn finish(sql: &str) -> Result<String> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(SqlGenError::Model("model returned empty output".to_string()));
    }
    Ok(sql.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sql_plain() {
        let result = extract_sql("  SELECT * FROM students;\n").unwrap();
        assert_eq!(result, "SELECT * FROM students;");
    }

    #[test]
    fn test_extract_sql_with_fence() {
        let result = extract_sql("```sql\nSELECT 1;\n```").unwrap();
        assert_eq!(result, "SELECT 1;");
    }

    #[test]
    fn test_extract_sql_bare_fence() {
        let result = extract_sql("```\nSELECT 1;\n```").unwrap();
        assert_eq!(result, "SELECT 1;");
    }

    #[test]
    fn test_extract_sql_inline_fence() {
        let result = extract_sql("```SELECT name FROM students;```").unwrap();
        assert_eq!(result, "SELECT name FROM students;");
    }

    #[test]
    fn test_extract_sql_keeps_keyword_on_fence_line() {
        let result = extract_sql("```SELECT\n  name\nFROM students;```").unwrap();
        assert_eq!(result, "SELECT\n  name\nFROM students;");
    }

    #[test]
    fn test_extract_sql_uppercase_info_string() {
        let result = extract_sql("```SQLite\nSELECT 1;\n```").unwrap();
        assert_eq!(result, "SELECT 1;");
    }

    #[test]
    fn test_extract_sql_fence_after_preamble() {
        let input = "Here is your query:\n```sql\nSELECT COUNT(*) FROM students;\n```\nHope it helps.";
        let result = extract_sql(input).unwrap();
        assert_eq!(result, "SELECT COUNT(*) FROM students;");
    }

    #[test]
    fn test_extract_sql_unclosed_fence() {
        let result = extract_sql("```sql\nSELECT 1;").unwrap();
        assert_eq!(result, "SELECT 1;");
    }

    #[test]
    fn test_extract_sql_empty_fails() {
        assert!(extract_sql("").is_err());
        assert!(extract_sql("```sql\n```").is_err());
    }
}
