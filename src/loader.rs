//! A module for executing rendered statements against a database and for
//! the parse-then-load pipeline that ties everything together.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::ddl::DdlRenderer;
use crate::error::{BulkLoadError, LoadError};
use crate::reader::CsvFileParser;
use crate::schema::ParsingResults;

/// Executes a batch of SQL statements, returning the number of records the
/// server rejected when the backend can report it.
pub trait Loader {
    fn load(&self, statements: &[String]) -> Result<Option<u64>, LoadError>;
}

/// Runs statements through the `mclient` command-line client.
///
/// The statements are written to a temporary `.sql` script and the client
/// is invoked once, so the whole batch shares a session. The client has no
/// channel for a reject count; `load` reports `None`.
#[derive(Debug, Clone)]
pub struct MclientLoader {
    database: String,
    host: String,
    port: u16,
}

impl MclientLoader {
    pub fn new(database: &str, host: &str, port: u16) -> Self {
        MclientLoader {
            database: database.to_string(),
            host: host.to_string(),
            port,
        }
    }
}

impl Loader for MclientLoader {
    fn load(&self, statements: &[String]) -> Result<Option<u64>, LoadError> {
        let mut script = tempfile::Builder::new()
            .prefix("csvload")
            .suffix(".sql")
            .tempfile()?;
        for statement in statements {
            debug!("executing: {}", statement);
            writeln!(script, "{}", statement)?;
        }
        script.flush()?;

        let output = Command::new("mclient")
            .arg("-d")
            .arg(&self.database)
            .arg("-h")
            .arg(&self.host)
            .arg("-p")
            .arg(self.port.to_string())
            .arg(script.path())
            .output()
            .map_err(|e| LoadError::ClientLaunch {
                client: "mclient".to_string(),
                source: e,
            })?;
        if !output.status.success() {
            return Err(LoadError::ClientFailed {
                client: "mclient".to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        info!("mclient executed {} statements", statements.len());
        Ok(None)
    }
}

/// The full pipeline: parse the file, render DROP/CREATE/COPY for the
/// inferred schema, execute them.
pub struct BulkLoader<R, L> {
    input_file: PathBuf,
    renderer: R,
    loader: L,
}

/// The default table name: the input file's stem, trimmed.
pub fn table_name_for(input_file: &Path) -> String {
    input_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .unwrap_or_default()
}

impl<R: DdlRenderer, L: Loader> BulkLoader<R, L> {
    pub fn new<P: Into<PathBuf>>(input_file: P, renderer: R, loader: L) -> Self {
        BulkLoader {
            input_file: input_file.into(),
            renderer,
            loader,
        }
    }

    /// Renders the statement batch for already-computed results.
    pub fn statements(&self, table: &str, results: &ParsingResults) -> Vec<String> {
        vec![
            self.renderer.drop_table(table),
            self.renderer.create_table(table, results),
            self.renderer.copy_into(table, &self.input_file),
        ]
    }

    /// Parses the file and bulk-loads it, returning the reject count when
    /// the backend reports one.
    pub fn bulk_load(
        &self,
        separator: char,
        quote: char,
        escape: char,
        num_threads: usize,
        table: Option<&str>,
    ) -> Result<Option<u64>, BulkLoadError> {
        let results =
            CsvFileParser::new(&self.input_file).parse(separator, quote, escape, num_threads)?;
        let table = match table {
            Some(table) => table.to_string(),
            None => table_name_for(&self.input_file),
        };
        info!(
            "loading {} data lines into table {:?}",
            results.num_lines(),
            table
        );
        let rejected = self.loader.load(&self.statements(&table, &results))?;
        Ok(rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::MonetDbRenderer;
    use std::cell::RefCell;

    struct RecordingLoader {
        seen: RefCell<Vec<String>>,
    }

    impl Loader for RecordingLoader {
        fn load(&self, statements: &[String]) -> Result<Option<u64>, LoadError> {
            self.seen.borrow_mut().extend_from_slice(statements);
            Ok(Some(0))
        }
    }

    #[test]
    fn table_name_defaults_to_the_file_stem() {
        assert_eq!(table_name_for(Path::new("/data/trips 2021.csv")), "trips 2021");
        assert_eq!(table_name_for(Path::new("plain")), "plain");
    }

    #[test]
    fn bulk_load_renders_drop_create_copy_in_order() {
        let mut fixture = tempfile::Builder::new()
            .prefix("cities")
            .suffix(".csv")
            .tempfile()
            .unwrap();
        fixture.write_all(b"name,population\nlondon,9000000\n").unwrap();
        fixture.flush().unwrap();

        let loader = BulkLoader::new(
            fixture.path(),
            MonetDbRenderer::new(',', '"'),
            RecordingLoader {
                seen: RefCell::new(Vec::new()),
            },
        );
        let rejected = loader.bulk_load(',', '"', '\\', 1, Some("cities")).unwrap();
        assert_eq!(rejected, Some(0));

        let seen = loader.loader.seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], "DROP TABLE IF EXISTS \"cities\";");
        assert!(seen[1].contains("\"population\" INT NOT NULL"));
        assert!(seen[2].starts_with("COPY OFFSET 2 INTO \"cities\" FROM "));
    }
}
