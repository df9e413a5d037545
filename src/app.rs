//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging and the async runtime
//! - aggregates page data through the shared pipeline
//! - prints reports/charts
//! - writes optional exports

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cli::{ChartArgs, Cli, Command, DisplayArgs, GlobalArgs, ShowArgs, WatchArgs};
use crate::data::{ClientConfig, WikiClient};
use crate::domain::{ChartConfig, MergedRecord, normalize_subject};
use crate::error::AppError;
use crate::plot::{AsciiCanvas, PixelCanvas, render_series};

pub mod pipeline;
pub mod session;

use pipeline::Aggregator;
use session::{Applied, Session, ViewState};

/// Entry point for the `wpulse` binary.
pub fn run() -> Result<(), AppError> {
    // We want `wpulse "Some Page"` to behave like `wpulse show "Some Page"`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    init_tracing(cli.global.verbose);
    let config = client_config(&cli.global)?;
    debug!(wiki = config.wiki.as_str(), timeout_secs = config.timeout_secs, "configured");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(2, format!("Failed to start async runtime: {e}")))?;

    runtime.block_on(async move {
        match cli.command {
            Command::Show(args) => handle_show(&config, args).await,
            Command::Chart(args) => handle_chart(&config, args).await,
            Command::Watch(args) => handle_watch(&config, args).await,
        }
    })
}

/// Logs go to stderr; `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("wiki_pulse={level}")));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Environment (`.env` included) first, CLI flags on top.
fn client_config(global: &GlobalArgs) -> Result<ClientConfig, AppError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(wiki) = &global.wiki {
        config.wiki = wiki.trim().to_string();
    }
    if let Some(secs) = global.timeout_secs {
        config.timeout_secs = secs;
    }
    if config.wiki.is_empty() {
        return Err(AppError::new(2, "Wiki host must not be empty."));
    }
    if config.timeout_secs == 0 {
        return Err(AppError::new(2, "Timeout must be at least one second."));
    }
    Ok(config)
}

/// A page title given on the command line, trimmed; blank titles are a usage error.
fn subject_arg(raw: &str) -> Result<&str, AppError> {
    normalize_subject(raw).ok_or_else(|| AppError::new(2, "Page title must not be empty."))
}

fn aggregator(config: &ClientConfig) -> Result<Aggregator<WikiClient>, AppError> {
    let client = WikiClient::new(config)?;
    let endpoints = client.endpoints().clone();
    Ok(Aggregator::new(client, endpoints, Duration::from_secs(config.timeout_secs)))
}

async fn handle_show(config: &ClientConfig, args: ShowArgs) -> Result<(), AppError> {
    let chart = args.surface.chart_config();
    chart.validate()?;

    let subject = subject_arg(&args.title)?;
    let record = aggregator(config)?.aggregate(subject).await?;
    print_record(&record, &args.display, &chart);

    if let Some(path) = &args.export {
        let file = crate::io::RecordFile::new(&config.wiki, record.clone());
        crate::io::write_record_json(path, &file)?;
        info!(path = %path.display(), "wrote record JSON");
    }
    if let Some(path) = &args.chart {
        write_chart(path, &record, &chart)?;
    }

    Ok(())
}

async fn handle_chart(config: &ClientConfig, args: ChartArgs) -> Result<(), AppError> {
    let chart = args.surface.chart_config();
    chart.validate()?;

    let record = match (&args.from, &args.title) {
        (Some(path), _) => crate::io::read_record_json(path)?.record,
        (None, Some(title)) => aggregator(config)?.aggregate(subject_arg(title)?).await?,
        (None, None) => return Err(AppError::new(2, "Either a page title or --from is required.")),
    };

    write_chart(&args.out, &record, &chart)
}

/// Each stdin line is a submission. Aggregations run concurrently; only the
/// outcome of the latest submission is printed.
async fn handle_watch(config: &ClientConfig, args: WatchArgs) -> Result<(), AppError> {
    let chart = args.surface.chart_config();
    chart.validate()?;

    let session = Arc::new(Session::new());
    let aggregator = Arc::new(aggregator(config)?);
    let display = Arc::new(args.display);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| AppError::new(2, format!("Failed to read stdin: {e}")))?
    {
        let session = Arc::clone(&session);
        let aggregator = Arc::clone(&aggregator);
        let display = Arc::clone(&display);
        tasks.spawn(async move {
            let Some((submission, applied)) = session.run(&*aggregator, &line).await else {
                return;
            };
            match applied {
                Applied::Current(ViewState::Ready(record)) => print_record(&record, &display, &chart),
                Applied::Current(ViewState::Failed { subject, message }) => eprintln!("Error ({subject}): {message}"),
                Applied::Current(ViewState::Idle | ViewState::Loading { .. }) | Applied::Stale => {
                    debug!(id = submission.id(), "superseded before display")
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!("watch task failed: {e}");
        }
    }
    Ok(())
}

fn print_record(record: &MergedRecord, display: &DisplayArgs, chart: &ChartConfig) {
    println!("{}", crate::report::format_record(record, display.max_links));

    if !display.no_plot {
        let mut canvas = AsciiCanvas::new(chart, display.cols, display.rows);
        render_series(&record.view_series(), &mut canvas, chart);
        println!("Daily views:\n{}", canvas.render());
    }
}

fn write_chart(path: &Path, record: &MergedRecord, chart: &ChartConfig) -> Result<(), AppError> {
    let mut canvas = PixelCanvas::new(chart);
    render_series(&record.view_series(), &mut canvas, chart);
    crate::io::write_chart_png(path, &canvas)?;
    info!(path = %path.display(), points = record.views.len(), "wrote chart");
    Ok(())
}

/// Rewrite argv so a bare title means `show`.
///
/// Rules:
/// - `wpulse`                         -> unchanged (clap prints usage)
/// - `wpulse "Some Page" ...`         -> `wpulse show "Some Page" ...`
/// - `wpulse --help/--version/-h`     -> unchanged (show top-level help/version)
/// - `wpulse --wiki de.wikipedia.org show X` -> unchanged (global flags first)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "show" | "chart" | "watch");
    if is_subcommand {
        return argv;
    }

    // Leading flags are global options; leave them to clap.
    if arg1.starts_with('-') {
        return argv;
    }

    argv.insert(1, "show".to_string());
    argv
}
