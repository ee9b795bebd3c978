use clap::Parser;
use log::{error, info, LevelFilter};

use csvload::cli::Args;
use csvload::ddl::{DdlRenderer, MonetDbRenderer};
use csvload::error::BulkLoadError;
use csvload::loader::{table_name_for, BulkLoader, MclientLoader};
use csvload::reader::CsvFileParser;

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), BulkLoadError> {
    let renderer = MonetDbRenderer::new(args.separator, args.quote);

    if args.dry_run {
        let results = CsvFileParser::new(&args.file).parse(
            args.separator,
            args.quote,
            args.escape,
            args.threads,
        )?;

        println!(
            "{} data lines, {} malformed",
            results.num_lines(),
            results.num_malformed_lines()
        );
        for column in results.columns() {
            println!(
                "  {}: {:?}{}",
                column.name(),
                column.column_type(),
                if column.is_null() { " NULL" } else { "" }
            );
        }

        let table = match &args.table {
            Some(table) => table.clone(),
            None => table_name_for(&args.file),
        };
        println!("{}", renderer.drop_table(&table));
        println!("{}", renderer.create_table(&table, &results));
        println!("{}", renderer.copy_into(&table, &args.file));
        return Ok(());
    }

    let loader = BulkLoader::new(
        &args.file,
        renderer,
        MclientLoader::new(&args.database, &args.host, args.port),
    );
    let rejected = loader.bulk_load(
        args.separator,
        args.quote,
        args.escape,
        args.threads,
        args.table.as_deref(),
    )?;
    match rejected {
        Some(0) | None => info!("load finished"),
        Some(rejected) => info!("load finished, {} records rejected", rejected),
    }
    Ok(())
}
