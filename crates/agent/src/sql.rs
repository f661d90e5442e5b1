//! Extraction and read-only checking of model-generated SQL.
//!
//! The model answers the structured retrieval prompt with a query. Before it
//! reaches the database it must be exactly one `SELECT` (or `WITH ... SELECT`)
//! statement with no data-modifying keyword outside string literals. The
//! executor additionally runs it inside a read-only transaction.

use ragchat_core::error::{Error, StateError};

/// Data- and schema-modifying keywords. Utility commands such as `COPY` or
/// `SET` are already excluded by the leading `SELECT`/`WITH` check, and
/// their names are common column names, so they are not listed here.
const FORBIDDEN: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "MERGE", "DROP", "ALTER", "CREATE", "TRUNCATE", "GRANT",
    "REVOKE", "INTO",
];

/// Pull the SQL statement out of a model answer.
///
/// Accepts a bare statement or the first fenced code block (with or without
/// a language tag). Trailing semicolons are removed.
pub fn extract_sql(answer: &str) -> Result<String, Error> {
    let body = fenced_block(answer).unwrap_or(answer);
    let sql = body.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace());

    if sql.is_empty() {
        return Err(StateError::MalformedPayload("model answer contains no query".into()).into());
    }
    Ok(sql.to_string())
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let rest = &text[start..];
    // Skip the language tag line, if any
    let body_start = match rest.find('\n') {
        Some(nl) if !rest[..nl].trim().contains(' ') => nl + 1,
        _ => 0,
    };
    let rest = &rest[body_start..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Reject anything but a single read-only statement.
pub fn ensure_read_only(sql: &str) -> Result<(), Error> {
    let code = strip_literals_and_comments(sql);

    if code.contains(';') {
        return Err(Error::validation(
            "generated query must be a single statement",
        ));
    }

    let words: Vec<String> = code
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_uppercase())
        .collect();

    match words.first().map(String::as_str) {
        Some("SELECT") | Some("WITH") => {}
        _ => {
            return Err(Error::validation(
                "generated query must start with SELECT or WITH",
            ));
        }
    }

    if let Some(word) = words.iter().find(|w| FORBIDDEN.contains(&w.as_str())) {
        return Err(Error::validation(format!(
            "generated query is not read-only ({word})"
        )));
    }

    Ok(())
}

/// Replace quoted literals, quoted identifiers and comments with spaces so
/// that keyword and separator checks only see SQL code.
fn strip_literals_and_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                // Doubled quotes inside a literal are an escaped quote
                loop {
                    match chars.next() {
                        Some(q) if q == c => {
                            if chars.peek() == Some(&c) {
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        Some(_) => {}
                        None => break,
                    }
                }
                out.push(' ');
            }
            '-' if chars.peek() == Some(&'-') => {
                for n in chars.by_ref() {
                    if n == '\n' {
                        break;
                    }
                }
                out.push(' ');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                out.push(' ');
            }
            other => out.push(other),
        }
    }

    out
}
