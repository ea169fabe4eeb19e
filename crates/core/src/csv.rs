//! Minimal CSV reader for recipient imports.
//!
//! Handles quoted fields with `""` escapes and skips blank lines. Quoted
//! fields may not span lines.

use crate::error::CoreError;

/// A parsed CSV document: one header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse CSV text into a header row and data rows.
///
/// Rows are kept as-is even when they have fewer or more cells than the
/// header; the column mapping decides what is read from each.
pub fn parse_csv(text: &str) -> Result<CsvTable, CoreError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let header_line = lines
        .next()
        .ok_or_else(|| CoreError::InvalidInput("CSV is empty".to_string()))?;
    let headers: Vec<String> = parse_csv_line(header_line)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CoreError::InvalidInput("CSV header row is empty".to_string()));
    }

    let rows = lines.map(parse_csv_line).collect();
    Ok(CsvTable { headers, rows })
}

fn parse_csv_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            result.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    result.push(current);
    result
}
