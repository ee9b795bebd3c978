//! A module for rendering the SQL statements that create and bulk-load the
//! table matching a file's inference results.

use std::path::Path;

use crate::schema::{ColumnInfo, ColumnType, ParsingResults};

/// Renders DROP/CREATE/COPY statements for one SQL dialect.
///
/// Implementations consume [`ParsingResults`] and nothing else; executing
/// the statements is the loader's job.
pub trait DdlRenderer {
    fn drop_table(&self, table: &str) -> String;
    fn create_table(&self, table: &str, results: &ParsingResults) -> String;
    fn copy_into(&self, table: &str, source_file: &Path) -> String;
}

/// The MonetDB dialect. Keeps the session's separator and quote so the
/// `COPY INTO` delimiters match the file that was analyzed.
#[derive(Debug, Clone, Copy)]
pub struct MonetDbRenderer {
    separator: char,
    quote: char,
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

impl MonetDbRenderer {
    pub fn new(separator: char, quote: char) -> Self {
        MonetDbRenderer { separator, quote }
    }

    fn column_definition(&self, column: &ColumnInfo) -> String {
        let sql_type = match column.column_type() {
            ColumnType::String => {
                // All-null columns still need a well-formed width.
                let width = column.max_length().max(1);
                if column.min_length() == Some(column.max_length()) {
                    format!("CHAR({})", width)
                } else {
                    format!("VARCHAR({})", width)
                }
            }
            ColumnType::Float => {
                let before = column.digits_before_decimal_point();
                let after = column.digits_after_decimal_point();
                match (before, after) {
                    (Some(b), Some(a)) => format!("FLOAT({})", b + a),
                    // Scientific-only columns never report digit counts.
                    _ => "DOUBLE".to_string(),
                }
            }
            ColumnType::Decimal => {
                let before = column.digits_before_decimal_point().unwrap_or(0);
                let after = column.digits_after_decimal_point().unwrap_or(0);
                format!("DECIMAL({}, {})", before + after, after)
            }
            ColumnType::Int => integer_type(column).to_string(),
            ColumnType::TimeStamp => "TIMESTAMP".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Bool => "BOOLEAN".to_string(),
        };
        let nullability = if column.is_null() { "" } else { " NOT NULL" };
        format!(
            "{} {}{}",
            quote_identifier(column.name().trim()),
            sql_type,
            nullability
        )
    }
}

/// The narrowest signed integer type containing the observed value range.
fn integer_type(column: &ColumnInfo) -> &'static str {
    let min = column.min_value().unwrap_or(f64::MIN);
    let max = column.max_value().unwrap_or(f64::MAX);
    let fits = |lo: f64, hi: f64| min >= lo && max <= hi;
    if fits(i8::MIN as f64, i8::MAX as f64) {
        "TINYINT"
    } else if fits(i16::MIN as f64, i16::MAX as f64) {
        "SMALLINT"
    } else if fits(i32::MIN as f64, i32::MAX as f64) {
        "INT"
    } else {
        "BIGINT"
    }
}

impl DdlRenderer for MonetDbRenderer {
    fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {};", quote_identifier(table))
    }

    fn create_table(&self, table: &str, results: &ParsingResults) -> String {
        let definitions: Vec<String> = results
            .columns()
            .iter()
            .map(|column| self.column_definition(column))
            .collect();
        format!(
            "CREATE TABLE {} ({});",
            quote_identifier(table),
            definitions.join(", ")
        )
    }

    fn copy_into(&self, table: &str, source_file: &Path) -> String {
        // OFFSET 2 skips the header line; BEST EFFORT diverts rejected
        // records to sys.rejects instead of aborting the load.
        format!(
            "COPY OFFSET 2 INTO {} FROM {} USING DELIMITERS {}, {}, {} NULL AS '' BEST EFFORT;",
            quote_identifier(table),
            quote_literal(&source_file.display().to_string()),
            quote_literal(&self.separator.to_string()),
            quote_literal("\\n"),
            quote_literal(&self.quote.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParsingResults;

    fn results_for(tokens: &[(&str, &[&str])]) -> ParsingResults {
        let mut results = ParsingResults::new();
        for (name, _) in tokens {
            results.add_column(name);
        }
        for (index, (_, column_tokens)) in tokens.iter().enumerate() {
            for token in *column_tokens {
                results.column_mut(index).analyze_token(token);
            }
        }
        results
    }

    #[test]
    fn drop_table_quotes_the_identifier() {
        let renderer = MonetDbRenderer::new(',', '"');
        assert_eq!(
            renderer.drop_table("trips"),
            "DROP TABLE IF EXISTS \"trips\";"
        );
    }

    #[test]
    fn create_table_maps_every_type() {
        let renderer = MonetDbRenderer::new(',', '"');
        let results = results_for(&[
            ("tag", &["ab", "xyz"][..]),
            ("code", &["ab", "cd"][..]),
            ("small", &["1", "120"][..]),
            ("wide", &["1", "70000"][..]),
            ("price", &["12.50", "-3.75"][..]),
            ("ratio", &["1.5e3"][..]),
            ("day", &["2021-05-01"][..]),
            ("at", &["2021-05-01 10:20:30"][..]),
            ("tod", &["10:20:30"][..]),
            ("ok", &["true", "false"][..]),
        ]);
        let sql = renderer.create_table("t", &results);
        assert!(sql.starts_with("CREATE TABLE \"t\" ("));
        assert!(sql.contains("\"tag\" VARCHAR(3) NOT NULL"));
        assert!(sql.contains("\"code\" CHAR(2) NOT NULL"));
        assert!(sql.contains("\"small\" TINYINT NOT NULL"));
        assert!(sql.contains("\"wide\" INT NOT NULL"));
        assert!(sql.contains("\"price\" DECIMAL(4, 2) NOT NULL"));
        assert!(sql.contains("\"ratio\" DOUBLE NOT NULL"));
        assert!(sql.contains("\"day\" DATE NOT NULL"));
        assert!(sql.contains("\"at\" TIMESTAMP NOT NULL"));
        assert!(sql.contains("\"tod\" TIME NOT NULL"));
        assert!(sql.contains("\"ok\" BOOLEAN NOT NULL"));
    }

    #[test]
    fn nullable_columns_omit_not_null() {
        let renderer = MonetDbRenderer::new(',', '"');
        let results = results_for(&[("a", &["1", ""][..]), ("b", &[""][..])]);
        let sql = renderer.create_table("t", &results);
        assert!(sql.contains("\"a\" TINYINT,"));
        // Never analyzed: conservative nullable string of width 1. The
        // only seen length is 0, so min and max agree and the width is
        // fixed.
        assert!(sql.ends_with("\"b\" CHAR(1));"));
    }

    #[test]
    fn integer_widths_follow_the_value_range() {
        let renderer = MonetDbRenderer::new(',', '"');
        let results = results_for(&[
            ("a", &["-789", "1200"][..]),
            ("b", &["3000000000"][..]),
            ("c", &["127", "-128"][..]),
        ]);
        let sql = renderer.create_table("t", &results);
        assert!(sql.contains("\"a\" SMALLINT"));
        assert!(sql.contains("\"b\" BIGINT"));
        assert!(sql.contains("\"c\" TINYINT"));
    }

    #[test]
    fn copy_into_uses_the_session_delimiters() {
        let renderer = MonetDbRenderer::new('\t', '\'');
        let sql = renderer.copy_into("t", Path::new("/data/in.tsv"));
        assert_eq!(
            sql,
            "COPY OFFSET 2 INTO \"t\" FROM '/data/in.tsv' USING DELIMITERS '\t', '\\n', '''' NULL AS '' BEST EFFORT;"
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let renderer = MonetDbRenderer::new(',', '"');
        assert_eq!(
            renderer.drop_table("odd\"name"),
            "DROP TABLE IF EXISTS \"odd\"\"name\";"
        );
    }
}
