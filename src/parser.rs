// 🏗️ Row Parser - CSV file → raw import rows
//
// Input layout (header on line 1 is skipped):
//   title,type,value,category
//   coffee,outcome,4.50,food
//
// Fields are trimmed. Rows missing a title, type or value are dropped
// silently. Short rows read their missing trailing fields as empty and long
// rows have their extra fields ignored.

use crate::error::{ImportError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// CORE TYPES
// ============================================================================

/// One data row of the import file, before any store lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub title: String,

    /// Type column exactly as written
    #[serde(rename = "type")]
    pub transaction_type: String,

    /// Value column as written (trimmed), parsed later
    pub value: String,

    /// Category title; may be empty
    pub category: String,
}

impl RawTransaction {
    /// Build a row from a CSV record, or `None` when the row must be dropped
    pub fn from_record(record: &StringRecord) -> Option<Self> {
        let field = |index: usize| record.get(index).unwrap_or("").trim().to_string();

        let title = field(0);
        let transaction_type = field(1);
        let value = field(2);
        let category = field(3);

        if title.is_empty() || transaction_type.is_empty() || value.is_empty() {
            return None;
        }

        Some(RawTransaction {
            title,
            transaction_type,
            value,
            category,
        })
    }

    /// Numeric amount of this row (NaN when not numeric)
    pub fn amount(&self) -> f64 {
        parse_value(&self.value)
    }
}

/// Rows kept by the parser, plus the category titles they reference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    /// Valid rows, in file order
    pub rows: Vec<RawTransaction>,

    /// Category title of every kept row (duplicates and empty titles included)
    pub category_titles: Vec<String>,

    /// Number of data rows dropped for a missing title, type or value
    pub skipped: usize,
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse an amount without validating it
///
/// Only plain decimal/exponent notation counts as a number. Anything else,
/// including `inf`/`nan` spellings and values that overflow, yields `f64::NAN`.
pub fn parse_value(raw: &str) -> f64 {
    let raw = raw.trim();
    let numeric_chars = raw
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));

    if !numeric_chars {
        return f64::NAN;
    }

    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(f64::NAN)
}

/// Parse CSV text into rows
///
/// The whole input is consumed before returning. Physical line 1 is the
/// header, even when blank. A dropped row never contributes a category title.
pub fn parse_csv_bytes(bytes: &[u8]) -> std::result::Result<ParsedFile, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let mut parsed = ParsedFile::default();

    for result in reader.records() {
        let record = result?;

        // The reader skips blank lines, so only a record that starts on
        // line 1 is the header
        if record.position().map(|p| p.line()) == Some(1) {
            continue;
        }

        match RawTransaction::from_record(&record) {
            Some(row) => {
                parsed.category_titles.push(row.category.clone());
                parsed.rows.push(row);
            }
            None => {
                parsed.skipped += 1;
                tracing::debug!(
                    line = record.position().map(|p| p.line()),
                    "skipping row with empty title, type or value"
                );
            }
        }
    }

    Ok(parsed)
}

/// Read and parse an import file
pub fn parse_csv(path: &Path) -> Result<ParsedFile> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::InputAccess {
        path: path.to_path_buf(),
        source,
    })?;

    parse_csv_bytes(&bytes).map_err(|source| ImportError::MalformedInput {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> ParsedFile {
        parse_csv_bytes(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_skips_header() {
        let parsed = parse("title,type,value,category\ncoffee,outcome,4.50,food\n");

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].title, "coffee");
        assert_eq!(parsed.rows[0].transaction_type, "outcome");
        assert_eq!(parsed.rows[0].value, "4.50");
        assert_eq!(parsed.rows[0].category, "food");
    }

    #[test]
    fn test_parse_trims_fields() {
        let parsed = parse("title, type, value, category\n  Loan , income , 1500 ,  Others \n");

        assert_eq!(
            parsed.rows[0],
            RawTransaction {
                title: "Loan".to_string(),
                transaction_type: "income".to_string(),
                value: "1500".to_string(),
                category: "Others".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_drops_incomplete_rows() {
        let parsed = parse(
            "title,type,value,category\n\
             ,outcome,10,food\n\
             rent,,900,housing\n\
             gift,income,   ,misc\n\
             coffee,outcome,4.50,food\n",
        );

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 3);
        assert_eq!(parsed.rows[0].title, "coffee");
    }

    #[test]
    fn test_dropped_rows_do_not_contribute_categories() {
        let parsed = parse("title,type,value,category\n,outcome,10,food\nsalary,income,2000,\n");

        assert_eq!(parsed.category_titles, vec!["".to_string()]);
    }

    #[test]
    fn test_parse_allows_empty_category() {
        let parsed = parse("title,type,value,category\nsalary,income,2000,\n");

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].category, "");
    }

    #[test]
    fn test_parse_short_and_long_rows() {
        let parsed = parse(
            "title,type,value,category\n\
             salary,income,2000\n\
             coffee,outcome,4.50,food,extra,columns\n\
             stub,outcome\n",
        );

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].category, "");
        assert_eq!(parsed.rows[1].category, "food");
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_parse_keeps_category_order_and_duplicates() {
        let parsed = parse(
            "title,type,value,category\n\
             a,outcome,1,food\n\
             b,outcome,2,fun\n\
             c,outcome,3,food\n",
        );

        assert_eq!(parsed.category_titles, vec!["food", "fun", "food"]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let parsed = parse("title,type,value,category\n\"Rent, March\",outcome,900,\"Housing\"\n");

        assert_eq!(parsed.rows[0].title, "Rent, March");
        assert_eq!(parsed.rows[0].category, "Housing");
    }

    #[test]
    fn test_parse_header_only() {
        let parsed = parse("title,type,value,category\n");

        assert!(parsed.rows.is_empty());
        assert!(parsed.category_titles.is_empty());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("120.50"), 120.5);
        assert_eq!(parse_value("-3"), -3.0);
        assert_eq!(parse_value("1e3"), 1000.0);
        assert!(parse_value("abc").is_nan());
        assert!(parse_value("$12").is_nan());
    }

    #[test]
    fn test_parse_value_rejects_non_finite_spellings() {
        assert!(parse_value("inf").is_nan());
        assert!(parse_value("infinity").is_nan());
        assert!(parse_value("-Infinity").is_nan());
        assert!(parse_value("NaN").is_nan());
        assert!(parse_value("1e999").is_nan());
        assert_eq!(parse_value("+2.5E2"), 250.0);
    }

    #[test]
    fn test_blank_first_line_is_the_header() {
        let parsed = parse("\ncoffee,outcome,4.5,food\nsalary,income,2000,\n");

        let titles: Vec<&str> = parsed.rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["coffee", "salary"]);
    }

    #[test]
    fn test_multiline_quoted_header_is_skipped() {
        let parsed = parse("\"ti\ntle\",type,value,category\ncoffee,outcome,4.5,food\n");

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].title, "coffee");
    }

    #[test]
    fn test_parse_csv_missing_file() {
        let result = parse_csv(Path::new("/definitely/not/here.csv"));

        assert!(matches!(result, Err(ImportError::InputAccess { .. })));
    }

    #[test]
    fn test_parse_csv_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"title,type,value,category\ncaf\xe9,outcome,3,food\n")
            .unwrap();

        let result = parse_csv(file.path());

        assert!(matches!(result, Err(ImportError::MalformedInput { .. })));
    }

    #[test]
    fn test_parse_csv_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"title,type,value,category\ncoffee,outcome,4.50,food\nsalary,income,2000,\n")
            .unwrap();

        let parsed = parse_csv(file.path()).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].amount(), 2000.0);
    }
}
