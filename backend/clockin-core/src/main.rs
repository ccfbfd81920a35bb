// src/main.rs
use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clockin_core::bootstrap::{open_month, Credentials};
use clockin_core::config::AppConfig;
use clockin_core::factorial_client::FactorialClient;
use clockin_core::markup::FactorialMarkup;
use clockin_core::reconcile::{DayFilters, ReconcileOptions, ReconciliationEngine};
use clockin_core::report::{
    format_day_line, format_reset_line, write_day_csv, write_reset_csv, ReconcileSummary,
    ResetSummary,
};
use clockin_core::reset::reset_month;
use clockin_core::schedule::{ClockTime, Interval, SchedulePolicy};

/// Factorial auto clock in for the whole month from the command line
#[derive(Parser, Debug)]
#[command(name = "clockin", version, about)]
struct Cli {
    /// Your Factorial email address (or CLOCKIN_EMAIL)
    #[arg(short, long)]
    email: Option<String>,

    /// Clock-in year YYYY [default: current year]
    #[arg(short, long)]
    year: Option<i32>,

    /// Clock-in month MM [default: current month]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// Clock-in time HH:MM
    #[arg(long = "clock-in", alias = "ci", default_value = "09:00")]
    clock_in: ClockTime,

    /// Clock-out time HH:MM
    #[arg(long = "clock-out", alias = "co", default_value = "18:00")]
    clock_out: ClockTime,

    /// Clock in for today only
    #[arg(short, long)]
    today: bool,

    /// Clock in only until today
    #[arg(long, alias = "ut")]
    until_today: bool,

    /// Do a dry run without actually clocking in (or deleting)
    #[arg(long, alias = "dr")]
    dry_run: bool,

    /// Delete all shifts for the given month
    #[arg(long, alias = "rm")]
    reset_month: bool,

    /// Also write the per-day (or per-shift) results to a CSV file
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::from_env().context("Failed to read CLOCKIN_* configuration")?;
    run(cli, config).await
}

async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let today = Local::now().date_naive();
    let (year, month) = if cli.today {
        (today.year(), today.month())
    } else {
        (
            cli.year.unwrap_or_else(|| today.year()),
            cli.month.unwrap_or_else(|| today.month()),
        )
    };

    if cli.clock_in >= cli.clock_out {
        bail!(
            "clock-in {} must be earlier than clock-out {}",
            cli.clock_in,
            cli.clock_out
        );
    }

    let credentials = Credentials {
        email: cli
            .email
            .clone()
            .or_else(|| config.email.clone())
            .context("No email given: pass --email or set CLOCKIN_EMAIL")?,
        password: config
            .password
            .clone()
            .context("No password given: set CLOCKIN_PASSWORD")?,
    };

    let client = FactorialClient::new(config.factorial_config())
        .context("Failed to build HTTP client")?;
    info!("Factorial client initialized for {}", config.base_url);

    let month_ctx = open_month(
        &client,
        &FactorialMarkup,
        &credentials,
        &config.return_host,
        year,
        month,
    )
    .await
    .with_context(|| format!("Could not prepare {}/{}", month, year))?;

    if cli.reset_month {
        let reports = reset_month(&client, &month_ctx.shifts, cli.dry_run, |r| {
            println!("{}", format_reset_line(r, year, month))
        })
        .await;
        println!("{}", ResetSummary::from_reports(&reports));

        if let Some(path) = &cli.report {
            let file = File::create(path)
                .with_context(|| format!("Failed to create report file {:?}", path))?;
            write_reset_csv(file, &reports).context("Failed to write reset report")?;
        }
        return Ok(());
    }

    let options = ReconcileOptions {
        requested: Interval::new(cli.clock_in, cli.clock_out),
        filters: DayFilters {
            today_only: cli.today,
            until_today: cli.until_today,
        },
        today,
        dry_run: cli.dry_run,
    };
    let engine = ReconciliationEngine::new(&client, SchedulePolicy::default())
        .with_location_type(config.location_type.clone())
        .with_source(config.source.clone());

    let reports = engine
        .reconcile(&month_ctx, &options, |r| println!("{}", format_day_line(r)))
        .await;
    println!("{}", ReconcileSummary::from_reports(&reports));

    if let Some(path) = &cli.report {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file {:?}", path))?;
        write_day_csv(file, &reports).context("Failed to write day report")?;
    }
    Ok(())
}
