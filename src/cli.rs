//! Command-line arguments for the `csvload` binary.

use std::path::PathBuf;

use clap::Parser;

/// Infer a CSV file's schema and bulk-load it into MonetDB.
#[derive(Parser, Debug)]
#[command(name = "csvload", version, about)]
pub struct Args {
    /// The delimited input file. Its first line is the header.
    pub file: PathBuf,

    /// Field separator character.
    #[arg(short, long, default_value_t = ',')]
    pub separator: char,

    /// Quote character; quoted runs may contain the separator.
    #[arg(short, long, default_value_t = '"')]
    pub quote: char,

    /// Escape character; makes the next character literal.
    #[arg(short, long, default_value_t = '\\')]
    pub escape: char,

    /// Analyzer threads. 0 means one per hardware thread.
    #[arg(short = 'j', long, default_value_t = 0)]
    pub threads: usize,

    /// Target table name. Defaults to the input file's stem.
    #[arg(long)]
    pub table: Option<String>,

    /// Database to load into.
    #[arg(short, long, default_value = "demo")]
    pub database: String,

    /// Database host.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Database port.
    #[arg(short, long, default_value_t = 50000)]
    pub port: u16,

    /// Print the inferred schema and the SQL statements without executing
    /// anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_csv_convention() {
        let args = Args::parse_from(["csvload", "in.csv"]);
        assert_eq!(args.separator, ',');
        assert_eq!(args.quote, '"');
        assert_eq!(args.escape, '\\');
        assert_eq!(args.threads, 0);
        assert!(!args.dry_run);
    }

    #[test]
    fn tab_separated_with_explicit_table() {
        let args = Args::parse_from([
            "csvload", "-s", "\t", "--table", "trips", "-j", "4", "in.tsv",
        ]);
        assert_eq!(args.separator, '\t');
        assert_eq!(args.table.as_deref(), Some("trips"));
        assert_eq!(args.threads, 4);
        assert_eq!(args.file, PathBuf::from("in.tsv"));
    }
}
