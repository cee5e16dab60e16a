//! Sleep Insight CLI - Command-line interface for Sleep Insight
//!
//! Commands:
//! - analyze: Run the full pipeline on a CSV file and emit the JSON report
//! - validate: Check a CSV file against the input schema
//! - export: Write the derived feature table as CSV
//! - sample: Print the bundled sample dataset
//! - thresholds: Print the effective analyzer configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sleep_insight::encoder::features_to_csv;
use sleep_insight::series::quality_heatmap;
use sleep_insight::types::AnalysisReport;
use sleep_insight::{
    AnalysisError, AnalyzerConfig, Normalizer, RawTable, SleepAnalyzer, PRODUCER_NAME,
    REQUIRED_COLUMNS, SAMPLE_CSV, VERSION,
};

/// Sleep Insight - Sleep session analysis and disorder-risk screening
#[derive(Parser)]
#[command(name = "sleep-insight")]
#[command(version = VERSION)]
#[command(about = "Analyze sleep session CSV data", long_about = None)]
struct Cli {
    /// Log pipeline progress (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and emit the report
    Analyze {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,

        /// Analyzer configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also write the feature table as CSV
        #[arg(long)]
        features_csv: Option<PathBuf>,

        /// Also write the quality heatmap as JSON
        #[arg(long)]
        heatmap: Option<PathBuf>,
    },

    /// Validate a CSV file without analyzing it
    Validate {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the derived feature table as CSV
    Export {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Analyzer configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the sample dataset
    Sample,

    /// Print the effective analyzer configuration
    Thresholds {
        /// Analyzer configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), InsightCliError> {
    match command {
        Commands::Analyze {
            input,
            output,
            format,
            config,
            features_csv,
            heatmap,
        } => cmd_analyze(
            &input,
            &output,
            format,
            config.as_deref(),
            features_csv.as_deref(),
            heatmap.as_deref(),
        ),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Export {
            input,
            output,
            config,
        } => cmd_export(&input, &output, config.as_deref()),

        Commands::Sample => {
            print!("{}", SAMPLE_CSV);
            Ok(())
        }

        Commands::Thresholds { config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    config: Option<&Path>,
    features_csv: Option<&Path>,
    heatmap: Option<&Path>,
) -> Result<(), InsightCliError> {
    let config = load_config(config)?;
    let table = read_table(input)?;
    let report = SleepAnalyzer::new(&config).analyze_table(&table)?;

    if let Some(path) = features_csv {
        fs::write(path, features_to_csv(&report.features)?)?;
    }

    if let Some(path) = heatmap {
        let cells = quality_heatmap(&report.features);
        fs::write(path, serde_json::to_string_pretty(&cells)?)?;
    }

    let output_data = format_report(&report, &format)?;
    write_output(output, &output_data)
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), InsightCliError> {
    let table = read_table(input)?;

    let result = Normalizer::validate(&table);
    let report = ValidationReport {
        producer: PRODUCER_NAME.to_string(),
        total_records: table.len(),
        missing_columns: table.missing_columns(),
        error: result.as_ref().err().map(|e| e.to_string()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Required columns: {}", REQUIRED_COLUMNS.join(", "));
        println!("Total records:    {}", report.total_records);

        if !report.missing_columns.is_empty() {
            println!("Missing columns:  {}", report.missing_columns.join(", "));
        }

        match &report.error {
            Some(error) => println!("\nError: {}", error),
            None => println!("\nAll records valid"),
        }
    }

    result.map(|_| ()).map_err(InsightCliError::from)
}

fn cmd_export(input: &Path, output: &Path, config: Option<&Path>) -> Result<(), InsightCliError> {
    let config = load_config(config)?;
    let table = read_table(input)?;
    let features = SleepAnalyzer::new(&config).features(&table)?;

    if features.is_empty() {
        return Err(InsightCliError::NoRecords);
    }

    write_output(output, &features_to_csv(&features)?)
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig, InsightCliError> {
    match path {
        Some(path) => Ok(AnalyzerConfig::from_file(path)?),
        None => Ok(AnalyzerConfig::default()),
    }
}

fn read_table(input: &Path) -> Result<RawTable, InsightCliError> {
    let data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            log::warn!("Reading CSV from an interactive terminal; end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    Ok(RawTable::from_csv_str(&data)?)
}

fn format_report(report: &AnalysisReport, format: &OutputFormat) -> Result<String, InsightCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(report)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)? + "\n"),
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), InsightCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum InsightCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    NoRecords,
}

impl From<io::Error> for InsightCliError {
    fn from(e: io::Error) -> Self {
        InsightCliError::Io(e)
    }
}

impl From<AnalysisError> for InsightCliError {
    fn from(e: AnalysisError) -> Self {
        InsightCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for InsightCliError {
    fn from(e: serde_json::Error) -> Self {
        InsightCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<InsightCliError> for CliError {
    fn from(e: InsightCliError) -> Self {
        match e {
            InsightCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            InsightCliError::Analysis(e) => analysis_error(e),
            InsightCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            InsightCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No sleep records found in input".to_string(),
                hint: Some("Run `sleep-insight sample` for an example file".to_string()),
            },
        }
    }
}

fn analysis_error(e: AnalysisError) -> CliError {
    let (code, hint) = match &e {
        AnalysisError::MissingColumn(_) => (
            "MISSING_COLUMN",
            Some(format!("Header must contain: {}", REQUIRED_COLUMNS.join(","))),
        ),
        AnalysisError::ParseError { .. } => (
            "PARSE_ERROR",
            Some("Use YYYY-MM-DD dates and YYYY-MM-DD HH:MM:SS timestamps".to_string()),
        ),
        AnalysisError::RangeError { .. } => ("RANGE_ERROR", None),
        AnalysisError::InsufficientData { .. } => (
            "INSUFFICIENT_DATA",
            Some("Statistics need at least two nights of data".to_string()),
        ),
        AnalysisError::Csv(_) => ("CSV_ERROR", None),
        AnalysisError::Json(_) => ("JSON_ERROR", None),
        AnalysisError::Io(_) => (
            "IO_ERROR",
            Some("Check file paths and permissions".to_string()),
        ),
        AnalysisError::Config(_) => ("CONFIG_ERROR", None),
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint,
    }
}

#[derive(serde::Serialize)]
struct ValidationReport {
    producer: String,
    total_records: usize,
    missing_columns: Vec<&'static str>,
    error: Option<String>,
}
