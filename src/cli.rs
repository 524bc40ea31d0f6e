use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::views::AnalysisOption;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Upload, persist, and analyze student result sheets",
    long_about = None
)]
pub struct Cli {
    /// YAML configuration file (built-in defaults apply when omitted)
    #[arg(long, global = true, env = "RESULT_ANALYZER_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start an interactive dashboard session on stdin/stdout
    Dashboard(DashboardArgs),
    /// Print the table schema inferred from a CSV file
    Probe(ProbeArgs),
    /// Load a CSV file and persist it into a named SQLite store
    Persist(PersistArgs),
    /// Run one dashboard analysis option against a CSV file
    Analyze(AnalyzeArgs),
    /// Write a configuration file with defaults and an admin credential
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args, Clone, Default)]
pub struct CsvArgs {
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Directory where stores and exported reports are written
    #[arg(long = "store-dir")]
    pub store_dir: Option<PathBuf>,
    #[command(flatten)]
    pub csv: CsvArgs,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input CSV file to inspect (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[command(flatten)]
    pub csv: CsvArgs,
}

#[derive(Debug, Args)]
pub struct PersistArgs {
    /// Input CSV file to persist (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Store name; `.db` is appended
    #[arg(short = 'n', long = "name")]
    pub name: String,
    /// Directory to create the store in (overrides the configuration)
    #[arg(long = "store-dir")]
    pub store_dir: Option<PathBuf>,
    #[command(flatten)]
    pub csv: CsvArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Input CSV file to analyze (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Analysis option to run
    #[arg(long = "option", value_enum)]
    pub option: AnalysisOption,
    /// Subject column for subjectwise options (defaults to the first configured subject)
    #[arg(long)]
    pub subject: Option<String>,
    /// Number of students in the top ranking (overrides the configuration)
    #[arg(long)]
    pub top: Option<usize>,
    /// Output format for the result
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
    /// Write the generated report as CSV to this path (report-generation only)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub csv: CsvArgs,
}

#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Destination YAML file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Administrator identity
    #[arg(long, requires = "secret")]
    pub identity: Option<String>,
    /// Administrator secret; only its SHA-256 digest is written
    #[arg(long, requires = "identity")]
    pub secret: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "pipe" | "|" => Ok(b'|'),
        "semicolon" | ";" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (None, _) => Err("Delimiter cannot be empty".to_string()),
                (Some(_), Some(_)) => Err("Delimiter must be a single character".to_string()),
                (Some(c), None) if !c.is_ascii() => Err("Delimiter must be ASCII".to_string()),
                (Some(c), None) => Ok(c as u8),
            }
        }
    }
}
