//! idxwatch: run IDX dataset validations from the command line.
//!
//! Wires the engine to the remote data service, the SMTP notifier (when
//! recipients are configured), and the local result cache, then prints the
//! outcome as JSON.

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use idxwatch_core::{
    config, Config, DataSource, DateRange, TableKind, TableRegistry,
};
use idxwatch_engine::{DashboardAggregator, Orchestrator, TrendMetric, Validator};
use idxwatch_notify::{EmailNotifier, NoopNotifier, Notifier};
use idxwatch_rules::RuleCatalog;
use idxwatch_store::{FallbackReader, RestStore, ResultCache, ResultReader, ResultStore};

// ── CLI ─────────────────────────────────────────────────────────────

/// IDX dataset validation and anomaly detection.
#[derive(Parser, Debug)]
#[command(name = "idxwatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List validated tables with their last-validated timestamps.
    Tables,
    /// Validate one table over an optional date window.
    Run {
        /// Table name (e.g. idx_daily_data).
        table: String,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Validate every registered table.
    RunAll {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Show the most recent validation results.
    Results {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Aggregate dashboard statistics.
    Stats,
    /// Daily trend series for charting.
    Trends {
        /// Metric: runs, anomalies, or critical_anomalies.
        #[arg(long, default_value = "anomalies")]
        metric: String,
        #[arg(long, default_value_t = 14)]
        days: u32,
    },
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    config::load_dotenv();
    let cli = Cli::parse();
    let cfg = Config::from_env();
    cfg.log_summary();

    let rest = Arc::new(RestStore::from_config(&cfg.data_service)?);
    let registry = Arc::new(TableRegistry::standard());
    let cache = Arc::new(ResultCache::new(cfg.validation.cache_capacity));

    // All-tables runs go to the daily-summary list when one is configured.
    let email_cfg = match &cli.command {
        Command::RunAll { .. } => cfg.email.for_daily_summary(),
        _ => cfg.email.clone(),
    };
    let notifier: Arc<dyn Notifier> = if email_cfg.is_configured() {
        Arc::new(EmailNotifier::from_config(&email_cfg)?)
    } else {
        info!("no email recipients configured, notifications disabled");
        Arc::new(NoopNotifier)
    };

    let validator = Arc::new(Validator::new(
        Arc::clone(&rest) as Arc<dyn DataSource>,
        Arc::new(RuleCatalog::standard()),
        cfg.validation.clone(),
        cfg.data_service.fetch_timeout_secs,
    ));
    let orchestrator = Orchestrator::new(
        validator,
        Arc::clone(&registry),
        Arc::clone(&rest) as Arc<dyn ResultStore>,
        Arc::clone(&cache),
        notifier,
        cfg.validation.clone(),
    );
    let dashboard = DashboardAggregator::new(
        FallbackReader::new(Arc::clone(&rest) as Arc<dyn ResultReader>, Arc::clone(&cache)),
        Arc::clone(&registry),
    );

    match cli.command {
        Command::Tables => {
            print_json(&registry.descriptors())?;
        }
        Command::Run { table, start, end } => {
            let kind: TableKind = table
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let range = DateRange::new(start, end)?;
            let result = orchestrator.run_one(kind, range).await;
            print_json(&result)?;
        }
        Command::RunAll { start, end } => {
            let range = DateRange::new(start, end)?;
            let summary = orchestrator.run_all(range).await;
            print_json(&summary)?;
        }
        Command::Results { limit } => {
            let recent = dashboard.recent_results(limit).await;
            print_json(&recent)?;
        }
        Command::Stats => {
            let stats = dashboard.stats().await;
            print_json(&stats)?;
        }
        Command::Trends { metric, days } => {
            let metric: TrendMetric = metric
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let series = dashboard.trend_series(metric, days).await;
            print_json(&series)?;
        }
    }

    Ok(())
}
