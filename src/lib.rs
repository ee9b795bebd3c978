//! # csvload
//! `csvload` reads a delimited text file (CSV and friends), infers a
//! per-column SQL schema by streaming every token through a type-narrowing
//! state machine, and emits the MonetDB statements that create a matching
//! table and bulk-load the file into it.
//!
//! The parser was built for files too large to hold in RAM: the file is
//! read exactly once, nothing but per-column summaries is kept, and the
//! token analysis is spread over a pool of analyzer threads fed by a single
//! reader through a fixed set of rotating line buffers.
//!
//! # Usage
//! ## Loading a file
//! ```text
//! csvload trips.csv -d demo
//! ```
//! parses `trips.csv`, creates the table `trips` in the database `demo`
//! and bulk-loads the file into it via the `mclient` client. Use
//! `--dry-run` to print the inferred schema and the SQL instead of
//! executing anything.
//!
//! The command line arguments are summarized in the below table
//!
//! | argument | value type | default | description |
//! |:-:|:-:|:-:|---|
//! | \<file\> | path | required | the delimited input file |
//! | -s | \<char\> | `,` | field separator |
//! | -q | \<char\> | `"` | quote character |
//! | -e | \<char\> | `\` | escape character |
//! | -j | \<uint\> | 0 | analyzer threads, 0 = hardware parallelism |
//! | --table | \<string\> | file stem | target table name |
//! | -d | \<string\> | `demo` | database name |
//! | --host | \<string\> | `127.0.0.1` | database host |
//! | -p | \<uint\> | 50000 | database port |
//! | --dry-run | flag | off | print schema and SQL, execute nothing |
//!
//! ## As a library
//! [`CsvFileParser`](reader::CsvFileParser) is the parsing façade;
//! [`ParsingResults`](schema::ParsingResults) is what it returns. The
//! MonetDB statement rendering ([`ddl`]) and execution ([`loader`]) layers
//! are separate so either can be swapped for another dialect or transport.
//!
//! # Input format
//! The file must decode as UTF-8. Its first line is the header: one name
//! per field, tokenized with the same separator/quote/escape as the data.
//! Every later line is a data row. A row whose field count differs from
//! the header's is *malformed*; malformed rows are counted and analyzed as
//! far as their tokens go, but they are not errors. An undecodable byte
//! sequence anywhere in the file aborts the parse with the failing line
//! and column.
//!
//! # Schema inference
//! Every column starts out as a candidate for every type and is narrowed
//! by each of its non-empty tokens; empty-after-trim tokens mark the
//! column nullable and nothing else. Narrowing only ever removes
//! candidates, so the end state does not depend on how lines were split
//! across analyzer threads.
//!
//! The types, narrowest first, and what keeps a candidate alive:
//!
//! | type | tokens that keep it |
//! |:-:|---|
//! | Int | signed 64-bit integers |
//! | Decimal | plain decimal numbers, no exponent |
//! | Float | anything a double parser accepts, except hex floats |
//! | Date | `YYYY-MM-DD` |
//! | TimeStamp | `YYYY-MM-DD hh:mm:ss[.fractional]`, time optional |
//! | Time | `hh:mm:ss[.fractional]` |
//! | Bool | the lowercase literals `true` and `false` |
//! | String | everything; the fallback |
//!
//! Alongside the type, each column tracks its raw token length range, the
//! digit counts around the decimal point and the numeric value range:
//! enough for the DDL layer to pick `CHAR`/`VARCHAR` widths, `DECIMAL`
//! precision and the narrowest integer type.

extern crate nom;

pub mod cli;
pub mod ddl;
pub mod error;
pub mod loader;
pub mod parsers;
pub mod pool;
pub mod reader;
pub mod schema;

pub use crate::error::{BulkLoadError, LoadError, ParseError};
pub use crate::reader::CsvFileParser;
pub use crate::schema::{ColumnInfo, ColumnType, ParsingResults};
