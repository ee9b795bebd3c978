//! Error types surfaced by the parser and the bulk-loading pipeline.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while parsing an input file.
///
/// The first three variants are pre-flight failures raised before any
/// analyzer thread is spawned. `DecodeError` is raised after all analyzer
/// threads have been joined; its line and column are one-based and the line
/// count includes the header.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotARegularFile(PathBuf),

    #[error("file is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("cannot open {}: {source}", .path.display())]
    OpenFailed { path: PathBuf, source: io::Error },

    #[error("character set conversion error! line: {line}, column: {column}.")]
    DecodeError { line: u64, column: u64 },
}

/// Errors raised while executing rendered statements against the database.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not write the SQL script: {0}")]
    Script(#[from] io::Error),

    #[error("could not launch {client}: {source}")]
    ClientLaunch { client: String, source: io::Error },

    #[error("{client} exited with {status}: {stderr}")]
    ClientFailed {
        client: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Either side of the parse-then-load pipeline can fail.
#[derive(Error, Debug)]
pub enum BulkLoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_reports_the_failure_site() {
        let e = ParseError::DecodeError {
            line: 111,
            column: 144,
        };
        assert_eq!(
            e.to_string(),
            "character set conversion error! line: 111, column: 144."
        );
    }
}
