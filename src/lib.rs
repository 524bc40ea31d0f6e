pub mod analysis;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod io_utils;
pub mod schema;
pub mod session;
pub mod store;
pub mod table;
pub mod views;

use std::{
    env,
    io::{self, Write},
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    analysis::Outcome,
    cli::{Cli, Commands, CsvArgs, OutputFormat},
    config::{AdminCredential, AppConfig},
    dataset::{CsvOptions, Dataset, Frame},
    session::Session,
    table::Align,
    views::View,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("result_analyzer", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Dashboard(args) => handle_dashboard(config_path, &args),
        Commands::Probe(args) => handle_probe(&args),
        Commands::Persist(args) => handle_persist(config_path, &args),
        Commands::Analyze(args) => handle_analyze(config_path, &args),
        Commands::InitConfig(args) => handle_init_config(&args),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = AppConfig::load_or_default(path)?;
    match path {
        Some(path) => debug!("Loaded configuration from {path:?}"),
        None => debug!("Using built-in configuration"),
    }
    Ok(config)
}

fn csv_options(args: &CsvArgs, input: Option<&Path>) -> Result<CsvOptions> {
    let delimiter = match input {
        Some(path) => io_utils::resolve_input_delimiter(path, args.delimiter),
        None => args.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER),
    };
    Ok(CsvOptions {
        delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    })
}

fn load_dataset(input: &Path, csv: &CsvArgs) -> Result<Dataset> {
    let options = csv_options(csv, Some(input))?;
    info!(
        "Loading '{}' with delimiter '{}'",
        input.display(),
        printable_delimiter(options.delimiter)
    );
    Dataset::load(input, options)
}

fn handle_dashboard(config_path: Option<&Path>, args: &cli::DashboardArgs) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.store_dir {
        config.store.directory = dir.clone();
    }
    let session = Session::new(config, csv_options(&args.csv, None)?);
    let stdin = io::stdin();
    let stdout = io::stdout();
    dashboard::run(session, stdin.lock(), stdout.lock())
}

fn handle_probe(args: &cli::ProbeArgs) -> Result<()> {
    let dataset = load_dataset(&args.input, &args.csv)
        .with_context(|| format!("Inferring schema from {:?}", args.input))?;
    let table_schema = schema::infer_schema(&dataset);
    let headers = ["#", "column", "type", "sql type"].map(String::from);
    let rows = table_schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                (idx + 1).to_string(),
                column.name.clone(),
                column.column_type.to_string(),
                column.column_type.sql_type().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    print!(
        "{}",
        table::render_table(
            &headers,
            &rows,
            &[Align::Right, Align::Left, Align::Left, Align::Left]
        )
    );
    info!(
        "Inferred {} column(s) from {} row(s)",
        table_schema.len(),
        dataset.row_count()
    );
    Ok(())
}

fn handle_persist(config_path: Option<&Path>, args: &cli::PersistArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let directory = args
        .store_dir
        .clone()
        .unwrap_or_else(|| config.store.directory.clone());
    let target = store::store_path(&directory, &args.name)?;
    let dataset = load_dataset(&args.input, &args.csv)?;
    let table_schema = schema::infer_schema(&dataset);
    debug!("Inferred schema {table_schema}");
    let summary = store::persist(&dataset, &table_schema, &target)
        .with_context(|| format!("Persisting {:?} into {target:?}", args.input))?;
    println!(
        "Database '{}' created successfully! ({} row(s), {} column(s) in table '{}')",
        summary.path.display(),
        summary.rows_written,
        summary.columns,
        summary.table
    );
    Ok(())
}

fn handle_analyze(config_path: Option<&Path>, args: &cli::AnalyzeArgs) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(top) = args.top {
        config.top_n = top;
    }
    config.validate()?;
    let dataset = load_dataset(&args.input, &args.csv)?;
    let outcome = views::evaluate(args.option, &dataset, &config, args.subject.as_deref());

    match args.format {
        OutputFormat::Table => print!("{}", views::render_outcome(args.option, &outcome)),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&outcome).context("Serializing analysis result")?;
            println!("{json}");
        }
    }

    if let Some(output) = &args.output {
        export_outcome(&outcome, output)?;
    }
    Ok(())
}

fn export_outcome(outcome: &Outcome<View>, output: &Path) -> Result<()> {
    match &outcome.value {
        View::Report(rows) => dashboard::save_report(rows, output),
        View::Table(frame) => write_frame(frame, output),
        View::Failures(_) | View::Comparison(_) => {
            bail!("Only tabular results can be written to a file")
        }
    }
}

fn write_frame(frame: &Frame, output: &Path) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(Some(output), io_utils::DEFAULT_CSV_DELIMITER)?;
    writer
        .write_record(&frame.headers)
        .context("Writing header row")?;
    for row in &frame.rows {
        writer
            .write_record(row.iter().map(|value| value.as_display()))
            .context("Writing row")?;
    }
    writer.flush().context("Flushing output")?;
    info!("Wrote {} row(s) to {output:?}", frame.rows.len());
    Ok(())
}

fn handle_init_config(args: &cli::InitConfigArgs) -> Result<()> {
    let mut config = AppConfig::default();
    if let (Some(identity), Some(secret)) = (&args.identity, &args.secret) {
        config.admin = AdminCredential::from_secret(identity, secret);
    }
    config
        .save(&args.output)
        .with_context(|| format!("Writing configuration to {:?}", args.output))?;
    info!("Configuration written to {:?}", args.output);
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "Configuration written to {}", args.output.display())?;
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
