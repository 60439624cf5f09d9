//! CLI entry point for the school score tool.
//!
//! Predicts a school's composite exam score from five subject averages and
//! reports outcome rates for its category, from the school microdata.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use school_score::analyzers::analyzer::analyze;
use school_score::analyzers::types::Category;
use school_score::columns::ColumnMap;
use school_score::inference::artifact::{load_model, load_scaler, model_kind, scaler_kind};
use school_score::inference::{InferenceAdapter, PredictionInput};
use school_score::output::{print_pretty, render_summary, render_table, write_chart};
use school_score::parser::{DatasetOptions, Encoding};
use school_score::report::assemble;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "school_score")]
#[command(about = "Predict school exam scores and compare outcome rates by school category", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the total score for one school and show its category's rates
    Predict {
        /// School category: Federal, State, Private or Rural
        #[arg(short, long)]
        category: String,

        /// Natural sciences average
        #[arg(long, allow_hyphen_values = true)]
        science: String,

        /// Human sciences average
        #[arg(long, allow_hyphen_values = true)]
        humanities: String,

        /// Languages and codes average
        #[arg(long, allow_hyphen_values = true)]
        languages: String,

        /// Mathematics average
        #[arg(long, allow_hyphen_values = true)]
        math: String,

        /// Essay score
        #[arg(long, allow_hyphen_values = true)]
        essay: String,

        #[command(flatten)]
        artifacts: ArtifactArgs,

        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Show mean outcome rates per school category
    Stats {
        /// Highlight one category
        #[arg(short, long)]
        category: Option<String>,

        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Load the model and scaler and verify they match the feature schema
    CheckArtifacts {
        #[command(flatten)]
        artifacts: ArtifactArgs,
    },
}

#[derive(Args)]
struct ArtifactArgs {
    /// Model artifact (JSON), path or URL
    #[arg(long, default_value = "model.json")]
    model: String,

    /// Scaler artifact (JSON), path or URL
    #[arg(long, default_value = "scaler.json")]
    scaler: String,
}

#[derive(Args)]
struct DatasetArgs {
    /// School dataset, path or URL; gzip is detected automatically
    #[arg(short, long, default_value = "MICRODADOS_ENEM_ESCOLA.csv")]
    dataset: String,

    /// Field delimiter
    #[arg(long, default_value = ";", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Text encoding of the dataset
    #[arg(long, value_enum, default_value_t = Encoding::Latin1)]
    encoding: Encoding,

    /// Decimal separator used in numeric cells
    #[arg(long, default_value_t = '.')]
    decimal: char,

    /// JSON file overriding raw column names
    #[arg(long)]
    columns: Option<String>,

    /// Write the comparative table here (.json for JSON, otherwise CSV)
    #[arg(long)]
    chart_out: Option<String>,
}

impl DatasetArgs {
    fn options(&self) -> Result<DatasetOptions> {
        let columns = match &self.columns {
            Some(path) => ColumnMap::load(path)?,
            None => ColumnMap::default(),
        };
        Ok(DatasetOptions {
            delimiter: self.delimiter,
            encoding: self.encoding,
            decimal: self.decimal,
            columns,
        })
    }
}

fn parse_delimiter(s: &str) -> std::result::Result<u8, String> {
    let s = if s == "\\t" { "\t" } else { s };
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("delimiter must be a single ASCII character, got '{s}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/school_score.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("school_score.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", LevelFilter::INFO));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            category,
            science,
            humanities,
            languages,
            math,
            essay,
            artifacts,
            dataset,
        } => {
            // Artifacts first: a missing model aborts before any input is used.
            let model = load_model(&artifacts.model).await?;
            let scaler = load_scaler(&artifacts.scaler).await?;
            let adapter = InferenceAdapter::new(scaler, model);

            let category: Category = category.parse()?;
            let input = PredictionInput::parse(&science, &humanities, &languages, &math, &essay)?;

            let options = dataset.options()?;
            let summary = analyze(&dataset.dataset, &options).await?;

            let score = adapter.predict_input(&input)?;
            info!(category = %category, score, "Prediction complete");

            let report =
                assemble(category, &summary.stats, score).with_data_quality(summary.dropped);
            print_pretty(&report);

            println!("{}", render_summary(&report));
            println!("{}", render_table(&report.table));

            if let Some(path) = &dataset.chart_out {
                write_chart(path, &report.table)?;
            }
        }
        Commands::Stats { category, dataset } => {
            let category = category.map(|c| c.parse::<Category>()).transpose()?;

            let options = dataset.options()?;
            let summary = analyze(&dataset.dataset, &options).await?;

            if let Some(category) = category {
                match summary.stats.get(category) {
                    Some(rates) => info!(
                        category = %category,
                        schools = rates.schools,
                        approval = rates.approval,
                        failure = rates.failure,
                        dropout = rates.dropout,
                        retention = rates.retention,
                        "Selected cohort"
                    ),
                    None => info!(category = %category, "Selected cohort has no data"),
                }
            }

            println!("{}", render_table(&summary.stats));
            println!(
                "Rows read: {}, excluded: {}",
                summary.rows,
                summary.dropped.total()
            );

            if let Some(path) = &dataset.chart_out {
                write_chart(path, &summary.stats)?;
            }
        }
        Commands::CheckArtifacts { artifacts } => {
            let model = load_model(&artifacts.model).await?;
            let scaler = load_scaler(&artifacts.scaler).await?;

            info!(
                model = model_kind(&model),
                model_schema = ?model.metadata().schema_version,
                scaler = scaler_kind(&scaler),
                scaler_schema = ?scaler.metadata().schema_version,
                "Artifacts are usable"
            );
            println!("ok: {} model, {} scaler", model_kind(&model), scaler_kind(&scaler));
        }
    }

    Ok(())
}

fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .with_env_var(var)
        .from_env_lossy()
}
