use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use configuration::{Config, Logging, cli::ConfigOverrides};
use core_types::DateRange;
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use web_server::{AppState, handlers};

/// The main entry point for the Enterprise IQ analytics service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; real deployments set the environment directly.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = configuration::load_config(cli.overrides.config.as_deref())?;
    cli.overrides.apply(&mut config);

    // The guard flushes the file writer on drop, so it lives as long as main.
    let _log_guard = init_tracing(&config.logging)?;

    match cli.command {
        Commands::Serve => web_server::run_server(&config).await,
        Commands::Analyze(args) => handle_analyze(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Read-only sales analytics over a SQLite customer database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API.
    Serve,
    /// Run one analysis and print its JSON result to stdout.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    #[command(subcommand)]
    report: Report,
}

#[derive(Parser)]
struct PeriodArgs {
    /// First day of the period (format: YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,

    /// Last day of the period, inclusive (format: YYYY-MM-DD).
    #[arg(long)]
    to: NaiveDate,
}

impl PeriodArgs {
    fn range(&self) -> anyhow::Result<DateRange> {
        Ok(DateRange::new(self.from, self.to)?)
    }
}

#[derive(Subcommand)]
enum Report {
    /// Transaction statistics, weekly heatmap and product associations.
    TransactionPatterns(PeriodArgs),
    /// Transactions whose value is unusually far from the mean.
    Anomalies(PeriodArgs),
    /// Purchase frequency, regularity and customer segments.
    PurchaseFrequency {
        #[command(flatten)]
        period: PeriodArgs,
        /// Restrict to a customer type; may be repeated.
        #[arg(long = "segment")]
        segments: Vec<String>,
    },
    /// Sales, units, margin and price-band breakdowns.
    ProductPerformance {
        #[command(flatten)]
        period: PeriodArgs,
        /// Metric to include; may be repeated (sales, units, margin, price_bands).
        #[arg(long = "metric")]
        metrics: Vec<String>,
        /// Grouping level (product, category, subcategory).
        #[arg(long)]
        level: Option<String>,
        /// Drop groups whose sales fall below this amount.
        #[arg(long)]
        min_sales: Option<f64>,
    },
    /// Heuristic churn risk for every customer.
    Churn,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_analyze(args: AnalyzeArgs, config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)
        .await
        .context("Failed to prepare the analytics service")?;
    tracing::debug!(database = %config.database.path.display(), "Running analysis from the command line");

    match args.report {
        Report::TransactionPatterns(period) => {
            print_json(&handlers::transaction_patterns(&state, &period.range()?).await?)
        }
        Report::Anomalies(period) => print_json(&handlers::anomalies(&state, &period.range()?).await?),
        Report::PurchaseFrequency { period, segments } => {
            print_json(&handlers::purchase_frequency(&state, &period.range()?, &segments).await?)
        }
        Report::ProductPerformance { period, metrics, level, min_sales } => {
            let request = handlers::ProductPerformanceRequest {
                start_date: Some(period.from.to_string()),
                end_date: Some(period.to.to_string()),
                metrics: (!metrics.is_empty()).then_some(metrics),
                category_level: level,
                min_sales_threshold: min_sales,
            };
            let query = request.validate()?;
            print_json(&handlers::product_performance(&state, &query).await?)
        }
        Report::Churn => print_json(&handlers::churn(&state).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Console logging filtered by `RUST_LOG` (default `info`), plus a daily
/// rolling file when a log directory is configured.
fn init_tracing(logging: &Logging) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    Ok(guard)
}
