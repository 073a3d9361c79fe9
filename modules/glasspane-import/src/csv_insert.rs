//! Render a CSV file as one multi-row `INSERT` statement.
//!
//! Values are quoted literally (embedded quotes doubled), empty cells become
//! `NULL`. Nothing else is sanitised, so the output is meant for a human to
//! review before running it.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use glasspane_common::GlasspaneError;

const INDENT: &str = "                  ";

/// Render the CSV at `path` as an `INSERT INTO table` statement.
pub fn render_insert_file(path: &Path, table: &str) -> Result<String, GlasspaneError> {
    if !path.is_file() {
        return Err(GlasspaneError::InvalidInput(format!(
            "file doesn't exist: {}",
            path.display()
        )));
    }
    let file = File::open(path)
        .map_err(|e| GlasspaneError::InvalidInput(format!("{}: {e}", path.display())))?;
    render_insert(file, table)
}

/// Render CSV from any reader. The first record is the header row.
pub fn render_insert<R: Read>(reader: R, table: &str) -> Result<String, GlasspaneError> {
    let table = table.trim();
    if table.is_empty() {
        return Err(GlasspaneError::InvalidInput("table name is empty".into()));
    }

    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| GlasspaneError::Csv(e.to_string()))?
        .iter()
        .map(|c| c.trim().to_lowercase())
        .collect();
    if columns.iter().all(String::is_empty) {
        return Err(GlasspaneError::Csv("missing header row".into()));
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| GlasspaneError::Csv(e.to_string()))?;
        let values: Vec<String> = record.iter().map(sql_literal).collect();
        rows.push(format!("({})", values.join(", ")));
    }
    if rows.is_empty() {
        return Err(GlasspaneError::Csv("no data rows after the header".into()));
    }

    Ok(format!(
        "INSERT INTO       {table}\n{INDENT}( {} )\nVALUES            {};",
        columns.join(", "),
        rows.join(&format!(",\n{INDENT}"))
    ))
}

fn sql_literal(value: &str) -> String {
    if value.is_empty() {
        "NULL".to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_columns_lowercased_and_nulls_for_empty_cells() {
        let csv = "Name,Founded,City\nGreen Party,1980,\nRed Cross,,Geneva\n";

        let sql = render_insert(csv.as_bytes(), "organization").unwrap();

        assert_eq!(
            sql,
            "INSERT INTO       organization\n\
             \x20                 ( name, founded, city )\n\
             VALUES            ('Green Party', '1980', NULL),\n\
             \x20                 ('Red Cross', NULL, 'Geneva');"
        );
    }

    #[test]
    fn quotes_inside_values_are_doubled() {
        let sql = render_insert("name\nO'Brien\n".as_bytes(), "person").unwrap();
        assert!(sql.ends_with("VALUES            ('O''Brien');"));
    }

    #[test]
    fn quoted_csv_fields_keep_commas() {
        let sql = render_insert("name,loc\n\"Smith, Alex\",Berlin\n".as_bytes(), "t").unwrap();
        assert!(sql.contains("('Smith, Alex', 'Berlin')"));
    }

    #[test]
    fn header_only_is_rejected() {
        let err = render_insert("a,b\n".as_bytes(), "t").unwrap_err();
        assert!(matches!(err, GlasspaneError::Csv(_)));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = render_insert("".as_bytes(), "t").unwrap_err();
        assert!(matches!(err, GlasspaneError::Csv(_)));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = render_insert("a,b\n1,2,3\n".as_bytes(), "t").unwrap_err();
        assert!(matches!(err, GlasspaneError::Csv(_)));
    }

    #[test]
    fn blank_table_name_is_rejected() {
        let err = render_insert("a\n1\n".as_bytes(), "  ").unwrap_err();
        assert!(matches!(err, GlasspaneError::InvalidInput(_)));
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let err = render_insert_file(Path::new("/nonexistent/glasspane.csv"), "t").unwrap_err();
        assert!(err.to_string().contains("doesn't exist"));
    }
}
