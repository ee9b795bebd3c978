//! A module for streaming a delimited file once and inferring its schema
//! on the way through.
//!
//! One reader thread decodes the file line by line and rotates batches of
//! lines through the [`BufferPool`](crate::pool::BufferPool); `K` analyzer
//! threads tokenize the batches and fold every token into per-column
//! [`ColumnInfo`](crate::schema::ColumnInfo) state. Each analyzer works on
//! a private copy of the shared [`ParsingResults`] per buffer and merges it
//! back under a write lock, so the hot tokenization loop never holds a
//! shared lock. The merge is commutative and associative, which makes the
//! final result independent of how buffers were interleaved across threads.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str;
use std::sync::RwLock;

use log::{debug, trace, warn};

use crate::error::ParseError;
use crate::parsers::Tokenizer;
use crate::pool::{BufferPool, LINES_PER_BUFFER};
use crate::schema::ParsingResults;

/// A parser bound to one input file.
///
/// `parse` may be called repeatedly; every call streams the file once and
/// returns a fresh [`ParsingResults`].
#[derive(Debug, Clone)]
pub struct CsvFileParser {
    source_file: PathBuf,
}

impl CsvFileParser {
    pub fn new<P: Into<PathBuf>>(source_file: P) -> Self {
        CsvFileParser {
            source_file: source_file.into(),
        }
    }

    /// Streams the whole file and returns the merged inference results.
    ///
    /// `num_threads = 0` means one analyzer per hardware thread. The first
    /// line is the header; every later line is a data line. Lines whose
    /// token count differs from the header's are counted as malformed but
    /// still analyzed as far as their tokens go.
    pub fn parse(
        &self,
        separator: char,
        quote: char,
        escape: char,
        num_threads: usize,
    ) -> Result<ParsingResults, ParseError> {
        let metadata = match fs::metadata(&self.source_file) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ParseError::FileNotFound(self.source_file.clone()))
            }
            Err(e) => {
                return Err(ParseError::OpenFailed {
                    path: self.source_file.clone(),
                    source: e,
                })
            }
        };
        if !metadata.is_file() {
            return Err(ParseError::NotARegularFile(self.source_file.clone()));
        }
        if metadata.len() == 0 {
            return Err(ParseError::EmptyFile(self.source_file.clone()));
        }

        let num_threads = if num_threads == 0 {
            num_cpus::get()
        } else {
            num_threads
        };
        debug!(
            "parsing {} with {} analyzer threads, {} lines per buffer",
            self.source_file.display(),
            num_threads,
            LINES_PER_BUFFER
        );

        let tokenizer = Tokenizer::new(escape, separator, quote);
        let pool = BufferPool::new(num_threads);
        let shared = RwLock::new(ParsingResults::new());

        let outcome = crossbeam::thread::scope(|scope| {
            for _ in 0..num_threads {
                scope.spawn(|_| analyze_buffers(&pool, &shared, &tokenizer));
            }
            // The reader runs on this thread; when it returns it has set a
            // termination flag, so the scope's implicit joins cannot hang.
            run_reader(&self.source_file, &pool, &shared, &tokenizer)
        })
        .unwrap();
        outcome?;

        let results = shared.into_inner().unwrap();
        debug!(
            "parsed {} data lines ({} malformed) into {} columns",
            results.num_lines(),
            results.num_malformed_lines(),
            results.columns().len()
        );
        Ok(results)
    }
}

/// The single producer: decodes lines, registers the header, fills and
/// publishes buffers, and signals termination in every exit path.
fn run_reader(
    path: &Path,
    pool: &BufferPool,
    shared: &RwLock<ParsingResults>,
    tokenizer: &Tokenizer,
) -> Result<(), ParseError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            pool.finish();
            return Err(ParseError::OpenFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let result = fill_buffers(BufReader::new(file), pool, shared, tokenizer);
    match &result {
        Err(ParseError::DecodeError { line, column }) => {
            warn!("decode failure at line {}, column {}", line, column);
            pool.abort();
        }
        _ => pool.finish(),
    }
    result
}

fn fill_buffers(
    mut reader: BufReader<File>,
    pool: &BufferPool,
    shared: &RwLock<ParsingResults>,
    tokenizer: &Tokenizer,
) -> Result<(), ParseError> {
    let mut raw = Vec::new();
    let mut lines_read: u64 = 0;

    // Header pass: the columns must be registered before the first buffer
    // is published, so every analyzer snapshot sees the full column list.
    let header = match next_line(&mut reader, &mut raw, lines_read)? {
        Some(header) => header,
        None => return Ok(()),
    };
    lines_read += 1;
    {
        let mut results = shared.write().unwrap();
        for name in tokenizer.tokenize(&header) {
            results.add_column(name.trim());
        }
        debug!("header registered {} columns", results.columns().len());
    }

    let mut fill = pool.reader_slot();
    while let Some(line) = next_line(&mut reader, &mut raw, lines_read)? {
        lines_read += 1;
        let mut buffer = pool.buffer(fill);
        buffer.add_line(line);
        let ready = buffer.len() == LINES_PER_BUFFER;
        drop(buffer);
        if ready {
            pool.publish_full(fill);
            fill = pool.acquire_empty();
        }
    }

    // A final partial batch still counts.
    if !pool.buffer(fill).is_empty() {
        pool.publish_full(fill);
    }
    trace!("reader finished after {} lines", lines_read);
    Ok(())
}

/// Reads and decodes one logical line. Returns `Ok(None)` at end of input.
/// Any mid-stream failure (invalid bytes under the codec, or an I/O error)
/// is reported as a decode error at the current position: line numbers
/// count completed lines plus one (the header included), the column is the
/// length of the decoded prefix of the failing line plus one.
fn next_line(
    reader: &mut BufReader<File>,
    raw: &mut Vec<u8>,
    lines_done: u64,
) -> Result<Option<String>, ParseError> {
    raw.clear();
    let bytes_read = match reader.read_until(b'\n', raw) {
        Ok(n) => n,
        Err(e) => {
            warn!("read failed mid-stream: {}", e);
            return Err(decode_error_at(raw, lines_done));
        }
    };
    if bytes_read == 0 {
        return Ok(None);
    }
    if raw.last() == Some(&b'\n') {
        raw.pop();
    }
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    match str::from_utf8(raw) {
        Ok(line) => Ok(Some(line.to_string())),
        Err(_) => Err(decode_error_at(raw, lines_done)),
    }
}

fn decode_error_at(raw: &[u8], lines_done: u64) -> ParseError {
    let valid_prefix = match str::from_utf8(raw) {
        Ok(line) => line,
        Err(e) => str::from_utf8(&raw[..e.valid_up_to()]).unwrap(),
    };
    ParseError::DecodeError {
        line: lines_done + 1,
        column: valid_prefix.chars().count() as u64 + 1,
    }
}

/// One consumer: drains full buffers until the pool reports termination.
fn analyze_buffers(pool: &BufferPool, shared: &RwLock<ParsingResults>, tokenizer: &Tokenizer) {
    while let Some(index) = pool.next_full() {
        let mut results = shared.read().unwrap().snapshot();
        let column_count = results.columns().len();
        {
            let buffer = pool.buffer(index);
            trace!("analyzing buffer {} ({} lines)", index, buffer.len());
            for line in buffer.lines() {
                let tokens = tokenizer.tokenize(line);
                if tokens.len() != column_count {
                    results.count_malformed_line();
                }
                for (column, token) in tokens.iter().enumerate().take(column_count) {
                    results.column_mut(column).analyze_token(token);
                }
                results.count_line();
            }
        }
        shared.write().unwrap().update(&results);
        pool.buffer(index).clear();
        pool.release_empty(index);
    }
}
